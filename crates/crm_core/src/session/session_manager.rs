//! Session slot of one tab.
//!
//! # Responsibility
//! - Hold a denormalized snapshot of the acting user for this tab only.
//! - Announce session changes so other tabs can refresh indicators.
//!
//! # Invariants
//! - The snapshot is never refreshed from the shared store; it may go stale.
//! - Other tabs receive an event but keep their own session untouched.

use crate::model::user::User;
use crate::store::backend::{KeyValueBackend, MemoryKeyValueBackend, StoreResult};
use crate::store::collection::SESSION_KEY;
use crate::store::kv_store::parse_or_default;
use crate::sync::events::ChangeEvent;
use crate::sync::notifier::{ChangeNotifier, ContextId};
use log::{error, info};
use std::sync::Arc;

pub struct SessionManager {
    storage: MemoryKeyValueBackend,
    notifier: Arc<ChangeNotifier>,
    context: ContextId,
}

impl SessionManager {
    pub fn new(notifier: Arc<ChangeNotifier>, context: ContextId) -> Self {
        Self {
            storage: MemoryKeyValueBackend::new(),
            notifier,
            context,
        }
    }

    /// Stores a snapshot of `user` as this tab's acting user.
    pub fn set_session(&self, user: &User) -> StoreResult<()> {
        let text = serde_json::to_string(user)?;
        self.storage.set_item(SESSION_KEY, &text)?;
        info!(
            "event=session_set module=session status=ok context={} user_id={}",
            self.context, user.id
        );
        self.notifier.publish(
            self.context,
            &ChangeEvent::AuthChanged {
                user_id: Some(user.id.clone()),
            },
        );
        Ok(())
    }

    /// Returns the acting user, or `None` when unset or unreadable.
    pub fn get_session(&self) -> Option<User> {
        let raw = match self.storage.get_item(SESSION_KEY) {
            Ok(raw) => raw,
            Err(err) => {
                error!("event=session_read module=session status=error error={err}");
                None
            }
        };
        parse_or_default(SESSION_KEY, raw.as_deref(), None)
    }

    pub fn clear_session(&self) -> StoreResult<()> {
        self.discard()?;
        info!(
            "event=session_clear module=session status=ok context={}",
            self.context
        );
        self.notifier
            .publish(self.context, &ChangeEvent::AuthCleared);
        Ok(())
    }

    /// Drops the snapshot without announcing it.
    pub(crate) fn discard(&self) -> StoreResult<()> {
        self.storage.remove_item(SESSION_KEY)
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    #[cfg(test)]
    pub(crate) fn storage(&self) -> &MemoryKeyValueBackend {
        &self.storage
    }
}
