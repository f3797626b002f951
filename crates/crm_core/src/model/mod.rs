//! Dashboard domain records.
//!
//! # Responsibility
//! - Define the typed records persisted in the `users`, `leads`, `projects`
//!   and `defaults` collections.
//! - Enforce required fields at construction time.
//!
//! # Invariants
//! - Every record is identified by a kind-prefixed id (`u_`, `l_`, `p_`).
//! - Serialized field names match the persisted camelCase layout.

pub mod defaults;
pub mod ids;
pub mod lead;
pub mod project;
pub mod user;
pub mod validation;

/// Persisted creation timestamp, serialized as ISO-8601 UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Current wall-clock time used for `createdAt` and change events.
pub fn now() -> Timestamp {
    chrono::Utc::now()
}
