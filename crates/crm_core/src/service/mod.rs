//! Use-case services on top of the domain repository.
//!
//! # Responsibility
//! - Seed demo data, derive dashboard views and run per-tab sync tracking.
//! - Keep FFI/CLI callers away from store and channel details.

pub mod report_service;
pub mod seed_service;
pub mod tab_service;
