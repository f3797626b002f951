//! Required-field validation shared by record constructors.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure raised when a record is built from incomplete input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty after trimming.
    MissingField(&'static str),
    /// An id does not carry the expected kind prefix or token shape.
    MalformedId(String),
    /// A role or status label is not one of the known values.
    UnknownLabel { field: &'static str, value: String },
    /// A numeric field is NaN or infinite and cannot be stored.
    NotFinite(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "{field} is required"),
            Self::MalformedId(value) => write!(f, "malformed id `{value}`"),
            Self::UnknownLabel { field, value } => write!(f, "unknown {field} `{value}`"),
            Self::NotFinite(field) => write!(f, "{field} must be a finite number"),
        }
    }
}

impl Error for ValidationError {}

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Rejects NaN and infinities, which serialize as JSON `null`.
pub(crate) fn finite(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValidationError::NotFinite(field))
    }
}

/// Checks an optional number, leaving `None` untouched.
pub(crate) fn finite_opt(
    field: &'static str,
    value: Option<f64>,
) -> Result<Option<f64>, ValidationError> {
    value.map(|value| finite(field, value)).transpose()
}
