//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe where the shared store lives and how tabs talk to each other.
//! - Parse host-provided JSON and normalize it before use.
//!
//! # Invariants
//! - A normalized config has a non-empty store path and channel namespace.
//! - `default_commission` is a finite percent in `0..=100`.

use crate::logging::{default_log_level, normalize_level};
use crate::model::defaults::FALLBACK_COMMISSION_PERCENT;
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_DB_FILE_NAME: &str = "crm_dashboard.sqlite3";
const DEFAULT_CHANNEL_NAMESPACE: &str = "crm-dashboard";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite file shared by every tab.
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling logs; `None` leaves logging off.
    pub log_dir: Option<PathBuf>,
    pub channel_namespace: String,
    /// Commission percent used while no `defaults` record is stored.
    pub default_commission: f64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
            channel_namespace: DEFAULT_CHANNEL_NAMESPACE.to_string(),
            default_commission: FALLBACK_COMMISSION_PERCENT,
        }
    }
}

impl CoreConfig {
    /// Parses a JSON object; omitted keys keep their defaults.
    ///
    /// # Errors
    /// - Returns an error for malformed JSON or unknown keys.
    /// - Returns an error when a value fails normalization.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let parsed: Self =
            serde_json::from_str(text).map_err(|err| format!("invalid core config: {err}"))?;
        parsed.normalized()
    }

    /// Validates and canonicalizes every field.
    pub fn normalized(self) -> Result<Self, String> {
        if self.db_path.as_os_str().is_empty() {
            return Err("dbPath cannot be empty".to_string());
        }
        let channel_namespace = self.channel_namespace.trim().to_string();
        if channel_namespace.is_empty() {
            return Err("channelNamespace cannot be empty".to_string());
        }
        if !self.default_commission.is_finite() || !(0.0..=100.0).contains(&self.default_commission)
        {
            return Err(format!(
                "defaultCommission must be within 0..=100, got {}",
                self.default_commission
            ));
        }

        Ok(Self {
            log_level: normalize_level(&self.log_level)?.to_string(),
            channel_namespace,
            ..self
        })
    }
}
