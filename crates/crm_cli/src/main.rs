//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `crm_core` linkage and the store bootstrap outside Flutter.
//! - Seed a store file and print the admin overview as JSON.
//!
//! Usage: `crm_cli [DB_PATH]` (defaults to the temp-dir store).

use crm_core::{admin_overview, ChangeNotifier, CoreConfig, DashboardTab};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    println!("crm_core ping={}", crm_core::ping());
    println!("crm_core version={}", crm_core::core_version());

    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("crm_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: Option<String>) -> Result<(), String> {
    let mut config = CoreConfig::default();
    if let Some(path) = db_path {
        config.db_path = PathBuf::from(path);
    }
    let config = config.normalized()?;

    let hub = Arc::new(ChangeNotifier::new(config.channel_namespace.clone()));
    let tab = DashboardTab::open(&config, &hub).map_err(|err| err.to_string())?;
    let seeded = tab.start().map_err(|err| err.to_string())?;
    println!("store={} seeded={seeded}", config.db_path.display());

    let overview = admin_overview(tab.repo());
    let rendered = serde_json::to_string_pretty(&overview).map_err(|err| err.to_string())?;
    println!("{rendered}");
    Ok(())
}
