//! In-process broadcast hub shared by every tab of one namespace.
//!
//! # Responsibility
//! - Register and remove subscribers per context.
//! - Deliver each published event to subscribers of other contexts.
//!
//! # Invariants
//! - Handlers run outside the registry lock, so a handler may publish or
//!   unsubscribe without deadlocking.
//! - A context only hears its own events when it subscribed with
//!   `include_own`.

use crate::sync::events::ChangeEvent;
use log::debug;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One independent client context (a "tab").
pub type ContextId = u64;
/// Token returned by [`ChangeNotifier::subscribe`].
pub type SubscriptionId = u64;

type Handler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Also deliver events published by the subscriber's own context.
    pub include_own: bool,
}

struct Subscriber {
    context: ContextId,
    include_own: bool,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: SubscriptionId,
    subscribers: BTreeMap<SubscriptionId, Subscriber>,
}

/// Fire-and-forget change channel.
pub struct ChangeNotifier {
    namespace: String,
    next_context: AtomicU64,
    registry: Mutex<Registry>,
}

impl ChangeNotifier {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            next_context: AtomicU64::new(1),
            registry: Mutex::new(Registry::default()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Allocates a fresh context id for a new tab.
    pub fn open_context(&self) -> ContextId {
        self.next_context.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers `handler` for events not published by `context`.
    pub fn subscribe<F>(&self, context: ContextId, handler: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        self.subscribe_with(context, SubscribeOptions::default(), handler)
    }

    pub fn subscribe_with<F>(
        &self,
        context: ContextId,
        options: SubscribeOptions,
        handler: F,
    ) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let mut registry = self.lock();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.subscribers.insert(
            id,
            Subscriber {
                context,
                include_own: options.include_own,
                handler: Arc::new(handler),
            },
        );
        debug!(
            "event=subscribe module=sync status=ok namespace={} context={context} subscription={id}",
            self.namespace
        );
        id
    }

    /// Removes a subscription. Returns `false` when it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.lock().subscribers.remove(&id).is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Delivers `event` to every eligible subscriber and returns how many ran.
    pub fn publish(&self, origin: ContextId, event: &ChangeEvent) -> usize {
        let handlers: Vec<Handler> = self
            .lock()
            .subscribers
            .values()
            .filter(|sub| sub.context != origin || sub.include_own)
            .map(|sub| Arc::clone(&sub.handler))
            .collect();

        for handler in &handlers {
            handler(event);
        }

        debug!(
            "event=broadcast module=sync status=ok namespace={} origin={origin} kind={} delivered={}",
            self.namespace,
            event.kind(),
            handlers.len()
        );
        handlers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeNotifier, SubscribeOptions};
    use crate::sync::events::ChangeEvent;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&ChangeEvent) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |event: &ChangeEvent| {
            sink.lock().unwrap().push(event.kind())
        })
    }

    #[test]
    fn publish_skips_origin_unless_opted_in() {
        let hub = ChangeNotifier::new("crm");
        let tab_a = hub.open_context();
        let tab_b = hub.open_context();
        let (seen_a, handler_a) = recorder();
        let (seen_b, handler_b) = recorder();
        hub.subscribe(tab_a, handler_a);
        hub.subscribe(tab_b, handler_b);

        assert_eq!(hub.publish(tab_a, &ChangeEvent::StoreCleared), 1);
        assert!(seen_a.lock().unwrap().is_empty());
        assert_eq!(*seen_b.lock().unwrap(), vec!["store-cleared"]);

        let (seen_own, handler_own) = recorder();
        hub.subscribe_with(tab_a, SubscribeOptions { include_own: true }, handler_own);
        hub.publish(tab_a, &ChangeEvent::AuthCleared);
        assert_eq!(*seen_own.lock().unwrap(), vec!["auth-cleared"]);
    }

    #[test]
    fn unsubscribed_handlers_miss_later_events() {
        let hub = ChangeNotifier::new("crm");
        let tab_a = hub.open_context();
        let tab_b = hub.open_context();
        let (seen, handler) = recorder();
        let id = hub.subscribe(tab_b, handler);

        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        assert_eq!(hub.publish(tab_a, &ChangeEvent::StoreCleared), 0);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn handler_may_unsubscribe_itself_during_delivery() {
        let hub = Arc::new(ChangeNotifier::new("crm"));
        let tab_a = hub.open_context();
        let tab_b = hub.open_context();
        let slot = Arc::new(Mutex::new(None));
        let hub_ref = Arc::clone(&hub);
        let slot_ref = Arc::clone(&slot);
        let id = hub.subscribe(tab_b, move |_event: &ChangeEvent| {
            if let Some(id) = slot_ref.lock().unwrap().take() {
                hub_ref.unsubscribe(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        assert_eq!(hub.publish(tab_a, &ChangeEvent::StoreCleared), 1);
        assert_eq!(hub.publish(tab_a, &ChangeEvent::StoreCleared), 0);
    }

    #[test]
    fn contexts_are_distinct() {
        let hub = ChangeNotifier::new("crm");
        assert_ne!(hub.open_context(), hub.open_context());
        assert_eq!(hub.namespace(), "crm");
    }
}
