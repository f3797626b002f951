//! Names of the persisted collections.

use crate::model::validation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Key of the tab-scoped session slot. Never written to the shared store.
pub const SESSION_KEY: &str = "session";

/// One independently keyed record in the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Users,
    Leads,
    Projects,
    Defaults,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Users,
        Collection::Leads,
        Collection::Projects,
        Collection::Defaults,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Leads => "leads",
            Self::Projects => "projects",
            Self::Defaults => "defaults",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Collection {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|collection| collection.key() == value)
            .ok_or_else(|| ValidationError::UnknownLabel {
                field: "collection",
                value: value.to_string(),
            })
    }
}
