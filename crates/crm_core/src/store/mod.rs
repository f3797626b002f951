//! Key-value persistence for dashboard collections.
//!
//! # Responsibility
//! - Store each collection as one serialized text value.
//! - Broadcast every collection write to the other tabs.
//!
//! # Invariants
//! - Collections are replaced whole; there are no partial writes.
//! - Read-side corruption is never surfaced to callers.

pub mod backend;
pub mod collection;
pub mod kv_store;
