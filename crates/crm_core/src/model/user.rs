//! User record.
//!
//! # Invariants
//! - `email` and `name` are non-empty after trimming.
//! - Email comparison is case-insensitive; the stored casing is preserved.
//! - Users are never mutated after creation.

use crate::model::ids::UserId;
use crate::model::validation::{required, ValidationError};
use crate::model::{now, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Role a user acts under in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Referrer,
    #[default]
    Customer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Referrer, Role::Customer];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Referrer => "referrer",
            Self::Customer => "customer",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "referrer" => Ok(Self::Referrer),
            "customer" => Ok(Self::Customer),
            other => Err(ValidationError::UnknownLabel {
                field: "role",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: Timestamp,
}

impl User {
    /// Builds a new user with a fresh id.
    ///
    /// # Errors
    /// - `MissingField("email")` / `MissingField("name")` for blank input.
    pub fn new(email: &str, name: &str, role: Role) -> Result<Self, ValidationError> {
        Ok(Self {
            id: UserId::generate(),
            email: required("email", email)?,
            name: required("name", name)?,
            role,
            created_at: now(),
        })
    }

    /// Builds a user from an email alone, as lead conversion does.
    ///
    /// Never fails: a blank `name` falls back to the email's local part and
    /// then to the role label, and a blank email is stored as empty.
    pub(crate) fn from_email(email: &str, name: &str, role: Role) -> Self {
        let name = match name.trim() {
            "" => match name_from_email(email) {
                local if local.is_empty() => role.as_str().to_string(),
                local => local,
            },
            given => given.to_string(),
        };
        Self {
            id: UserId::generate(),
            email: email.trim().to_string(),
            name,
            role,
            created_at: now(),
        }
    }

    /// Case-insensitive email match, folding Unicode case.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.to_lowercase() == email.trim().to_lowercase()
    }
}

/// Name used when a user is created from an email alone.
fn name_from_email(email: &str) -> String {
    let trimmed = email.trim();
    trimmed
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .unwrap_or(trimmed)
        .to_string()
}
