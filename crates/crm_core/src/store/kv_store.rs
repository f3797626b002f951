//! Typed collection access with change broadcast.
//!
//! # Responsibility
//! - Deserialize collections with a caller-supplied fallback.
//! - Serialize and replace whole collections, then announce the write.
//!
//! # Invariants
//! - `read` never fails: absent, unreadable or corrupt text yields the
//!   fallback.
//! - Every successful `write` publishes exactly one `DataChanged` event.

use crate::model::now;
use crate::store::backend::{KeyValueBackend, StoreResult};
use crate::store::collection::Collection;
use crate::sync::events::ChangeEvent;
use crate::sync::notifier::{ChangeNotifier, ContextId};
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Parses stored text, falling back on absence or corruption.
///
/// Corrupt text is logged and replaced by `fallback`; the stored value is
/// left as is until the next write overwrites it.
pub fn parse_or_default<T: DeserializeOwned>(key: &str, raw: Option<&str>, fallback: T) -> T {
    let Some(text) = raw else {
        return fallback;
    };
    match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            warn!(
                "event=parse_fallback module=store status=error key={key} line={} column={}",
                err.line(),
                err.column()
            );
            fallback
        }
    }
}

/// Key-value store bound to one tab context.
pub struct KeyValueStore<B: KeyValueBackend> {
    backend: B,
    notifier: Arc<ChangeNotifier>,
    context: ContextId,
}

impl<B: KeyValueBackend> KeyValueStore<B> {
    pub fn new(backend: B, notifier: Arc<ChangeNotifier>, context: ContextId) -> Self {
        Self {
            backend,
            notifier,
            context,
        }
    }

    /// Reads `collection`, returning `fallback` when it cannot be used.
    pub fn read<T: DeserializeOwned>(&self, collection: Collection, fallback: T) -> T {
        let raw = match self.backend.get_item(collection.key()) {
            Ok(raw) => raw,
            Err(err) => {
                error!(
                    "event=store_read module=store status=error key={} error={err}",
                    collection.key()
                );
                None
            }
        };
        parse_or_default(collection.key(), raw.as_deref(), fallback)
    }

    /// Reads a singleton record, using `T::default()` as the fallback.
    pub fn read_obj<T: DeserializeOwned + Default>(&self, collection: Collection) -> T {
        self.read(collection, T::default())
    }

    /// Replaces `collection` with `value` and broadcasts the change.
    pub fn write<T: Serialize + ?Sized>(&self, collection: Collection, value: &T) -> StoreResult<()> {
        let text = serde_json::to_string(value)?;
        self.backend.set_item(collection.key(), &text)?;
        self.notifier.publish(
            self.context,
            &ChangeEvent::DataChanged {
                collection,
                timestamp: now(),
            },
        );
        Ok(())
    }

    /// Deletes `collection` without broadcasting.
    pub fn remove(&self, collection: Collection) -> StoreResult<()> {
        self.backend.remove_item(collection.key())
    }

    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_or_default, KeyValueStore};
    use crate::store::backend::{KeyValueBackend, MemoryKeyValueBackend};
    use crate::store::collection::Collection;
    use crate::sync::events::ChangeEvent;
    use crate::sync::notifier::ChangeNotifier;
    use std::sync::{Arc, Mutex};

    #[test]
    fn parse_or_default_covers_absent_corrupt_and_valid_text() {
        assert_eq!(parse_or_default::<Vec<u32>>("k", None, vec![9]), vec![9]);
        assert_eq!(parse_or_default::<Vec<u32>>("k", Some("[1,"), vec![9]), vec![9]);
        assert_eq!(parse_or_default::<Vec<u32>>("k", Some("{}"), vec![9]), vec![9]);
        assert_eq!(parse_or_default::<Vec<u32>>("k", Some("[1,2]"), vec![9]), vec![1, 2]);
    }

    #[test]
    fn write_publishes_data_changed_to_other_contexts() {
        let hub = Arc::new(ChangeNotifier::new("crm"));
        let writer = hub.open_context();
        let listener = hub.open_context();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        hub.subscribe(listener, move |event: &ChangeEvent| {
            sink.lock().unwrap().push(event.collection());
        });

        let store = KeyValueStore::new(MemoryKeyValueBackend::new(), Arc::clone(&hub), writer);
        store.write(Collection::Leads, &vec![1, 2, 3]).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Some(Collection::Leads)]);
        assert_eq!(store.read(Collection::Leads, Vec::<i32>::new()), vec![1, 2, 3]);
    }

    #[test]
    fn corrupt_collection_reads_as_fallback() {
        let hub = Arc::new(ChangeNotifier::new("crm"));
        let context = hub.open_context();
        let store = KeyValueStore::new(MemoryKeyValueBackend::new(), hub, context);
        store.backend().set_item("users", "not json").unwrap();

        let users: Vec<String> = store.read(Collection::Users, Vec::new());
        assert!(users.is_empty());
        let map: std::collections::BTreeMap<String, u8> = store.read_obj(Collection::Defaults);
        assert!(map.is_empty());
    }
}
