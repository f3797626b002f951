//! Tab-scoped "who is acting" state.

pub mod session_manager;
