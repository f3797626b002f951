//! Core of the local-first CRM dashboard.
//! This crate is the single source of truth for dashboard invariants and for
//! the store/broadcast discipline that keeps tabs consistent.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;
pub mod store;
pub mod sync;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::defaults::Defaults;
pub use model::ids::{uid, LeadId, ProjectId, UserId};
pub use model::lead::{Lead, LeadStatus};
pub use model::now;
pub use model::project::{NewProject, Project, ProjectPatch, ProjectStatus, Stage};
pub use model::user::{Role, User};
pub use model::validation::ValidationError;
pub use repo::domain_repo::DomainRepository;
pub use repo::{DomainError, DomainResult};
pub use service::report_service::{admin_overview, referrer_summary, AdminOverview, ReferrerSummary};
pub use service::seed_service::seed_demo;
pub use service::tab_service::{DashboardTab, SyncStatus};
pub use session::session_manager::SessionManager;
pub use store::backend::{
    KeyValueBackend, MemoryKeyValueBackend, SqliteKeyValueBackend, StoreError, StoreResult,
};
pub use store::collection::Collection;
pub use store::kv_store::{parse_or_default, KeyValueStore};
pub use sync::events::{ChangeEvent, ChannelMessage};
pub use sync::notifier::{ChangeNotifier, ContextId, SubscribeOptions, SubscriptionId};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
