//! Kind-prefixed record identifiers.
//!
//! # Invariants
//! - An id is `<prefix><token>` where the prefix names the record kind and the
//!   token is a short lowercase alphanumeric string.
//! - Collisions are not checked; tokens come from random v4 UUID bits.

use crate::model::validation::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TOKEN_LEN: usize = 10;

static ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(u|l|p)_[0-9a-z]{4,32}$").expect("valid id regex"));

/// Generates a fresh id string with the given kind prefix (`u_`, `l_`, `p_`).
pub fn uid(prefix: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &token[..TOKEN_LEN])
}

fn parse_prefixed(prefix: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.starts_with(prefix) && ID_RE.is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::MalformedId(trimmed.to_string()))
    }
}

macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Allocates a new random id of this kind.
            pub fn generate() -> Self {
                Self(uid(Self::PREFIX))
            }

            /// Parses an id, rejecting the wrong prefix or a malformed token.
            pub fn parse(value: &str) -> Result<Self, ValidationError> {
                parse_prefixed(Self::PREFIX, value).map(Self)
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

prefixed_id!(
    /// Identifier of a `User` record.
    UserId,
    "u_"
);
prefixed_id!(
    /// Identifier of a `Lead` record.
    LeadId,
    "l_"
);
prefixed_id!(
    /// Identifier of a `Project` record.
    ProjectId,
    "p_"
);
