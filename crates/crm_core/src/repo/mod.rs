//! Domain operations over users, leads and projects.
//!
//! # Responsibility
//! - Apply dashboard rules (registration, conversion, completion) on top of
//!   whole-collection reads and writes.
//! - Return semantic errors (`Validation`, `Conflict`, `NotFound`) next to
//!   storage failures.
//!
//! # Invariants
//! - Every operation re-reads the collections it touches; nothing is cached.
//! - Read-modify-write is not isolated across tabs: the last write wins.

pub mod domain_repo;

use crate::model::validation::ValidationError;
use crate::store::backend::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug)]
pub enum DomainError {
    /// A required field is missing or malformed.
    Validation(ValidationError),
    /// A unique key is already taken or a one-way transition already happened.
    Conflict(String),
    /// A referenced record does not exist.
    NotFound { kind: &'static str, key: String },
    /// The shared store rejected a write.
    Storage(StoreError),
}

impl DomainError {
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Stable short code used in logs and FFI envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::NotFound { .. } => "not_found",
            Self::Storage(_) => "storage",
        }
    }
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict(message) => write!(f, "{message}"),
            Self::NotFound { kind, key } => write!(f, "{kind} not found: {key}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DomainError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Conflict(_) | Self::NotFound { .. } => None,
        }
    }
}

impl From<ValidationError> for DomainError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value)
    }
}
