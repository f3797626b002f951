//! Cross-tab change notification.
//!
//! # Responsibility
//! - Describe what changed (`ChangeEvent`) and how it travels between
//!   contexts (`ChannelMessage`).
//! - Fan events out to every subscribed context of one channel namespace.
//!
//! # Invariants
//! - Delivery is at-most-once per subscriber and never replayed.
//! - An event published with nobody subscribed is dropped.

pub mod events;
pub mod notifier;
