//! Dashboard-wide defaults singleton.

use serde::{Deserialize, Serialize};

/// Commission percent used when neither the store nor config provides one.
pub const FALLBACK_COMMISSION_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    pub default_commission: f64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            default_commission: FALLBACK_COMMISSION_PERCENT,
        }
    }
}
