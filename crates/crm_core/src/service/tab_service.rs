//! One client context ("tab") over the shared store.
//!
//! # Responsibility
//! - Own the tab's store connection, session slot and channel subscription.
//! - Record incoming change events so the UI knows when to re-read.
//!
//! # Invariants
//! - Events published by this tab are not counted as incoming.
//! - A `store-cleared` event from another tab does not touch this tab's
//!   session.
//! - The subscription is removed when the tab is dropped.

use crate::config::CoreConfig;
use crate::model::user::User;
use crate::repo::domain_repo::DomainRepository;
use crate::repo::DomainResult;
use crate::service::seed_service::seed_demo;
use crate::session::session_manager::SessionManager;
use crate::store::backend::{KeyValueBackend, SqliteKeyValueBackend, StoreResult};
use crate::store::collection::Collection;
use crate::store::kv_store::KeyValueStore;
use crate::sync::events::ChangeEvent;
use crate::sync::notifier::{ChangeNotifier, ContextId, SubscriptionId};
use log::info;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Connectivity indicator state of one tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStatus {
    pub events_received: u64,
    pub last_event: Option<&'static str>,
    pub last_collection: Option<Collection>,
    /// Set by any incoming event, cleared by [`DashboardTab::take_refresh`].
    pub needs_refresh: bool,
}

pub struct DashboardTab<B: KeyValueBackend = SqliteKeyValueBackend> {
    repo: DomainRepository<B>,
    subscription: SubscriptionId,
    status: Arc<Mutex<SyncStatus>>,
}

impl DashboardTab<SqliteKeyValueBackend> {
    /// Opens a tab on the store file named by `config`.
    pub fn open(config: &CoreConfig, notifier: &Arc<ChangeNotifier>) -> StoreResult<Self> {
        let backend = SqliteKeyValueBackend::open(&config.db_path)?;
        Ok(Self::with_backend(backend, notifier, config.default_commission))
    }
}

impl<B: KeyValueBackend> DashboardTab<B> {
    pub fn with_backend(
        backend: B,
        notifier: &Arc<ChangeNotifier>,
        default_commission: f64,
    ) -> Self {
        let context = notifier.open_context();
        let store = KeyValueStore::new(backend, Arc::clone(notifier), context);
        let session = SessionManager::new(Arc::clone(notifier), context);
        let repo = DomainRepository::new(store, session).with_default_commission(default_commission);

        let status = Arc::new(Mutex::new(SyncStatus::default()));
        let sink = Arc::clone(&status);
        let subscription = notifier.subscribe(context, move |event: &ChangeEvent| {
            let mut status = lock(&sink);
            status.events_received += 1;
            status.last_event = Some(event.kind());
            if let Some(collection) = event.collection() {
                status.last_collection = Some(collection);
            }
            status.needs_refresh = true;
        });
        info!("event=tab_open module=sync status=ok context={context}");

        Self {
            repo,
            subscription,
            status,
        }
    }

    pub fn repo(&self) -> &DomainRepository<B> {
        &self.repo
    }

    pub fn context(&self) -> ContextId {
        self.repo.store().context()
    }

    /// Startup hook: seeds demo data into an empty store.
    pub fn start(&self) -> DomainResult<bool> {
        seed_demo(&self.repo)
    }

    pub fn current_user(&self) -> Option<User> {
        self.repo.current_user()
    }

    pub fn sync_status(&self) -> SyncStatus {
        lock(&self.status).clone()
    }

    /// Returns whether a re-read is due and resets the flag.
    pub fn take_refresh(&self) -> bool {
        std::mem::take(&mut lock(&self.status).needs_refresh)
    }
}

impl<B: KeyValueBackend> Drop for DashboardTab<B> {
    fn drop(&mut self) {
        self.repo.store().notifier().unsubscribe(self.subscription);
    }
}

fn lock(status: &Mutex<SyncStatus>) -> MutexGuard<'_, SyncStatus> {
    status.lock().unwrap_or_else(PoisonError::into_inner)
}
