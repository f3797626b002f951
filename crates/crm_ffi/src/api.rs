//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose dashboard use cases to Dart via FRB.
//! - Hold the process-wide tab that the UI drives.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Mutations report through `ActionResponse`; reads return JSON strings.
//! - The acting user is always the tab's current session.

use crm_core::{
    admin_overview, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, ChangeNotifier, CoreConfig, DashboardTab, Defaults, DomainError, LeadId,
    ProjectId, Role, User,
};
use log::warn;
use once_cell::sync::Lazy;
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

const DB_FILE_NAME: &str = "crm_dashboard.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static HUB: Lazy<Arc<ChangeNotifier>> =
    Lazy::new(|| Arc::new(ChangeNotifier::new(CoreConfig::default().channel_namespace)));
static TAB: Lazy<Mutex<Option<DashboardTab>>> = Lazy::new(|| Mutex::new(None));

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope for dashboard commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Optional ID of the record created or touched.
    pub id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Seeds demo users, a lead and a project when the store has no users.
#[flutter_rust_bridge::frb(sync)]
pub fn seed_demo() -> ActionResponse {
    respond("seed_demo", |tab| {
        let seeded = tab.start().map_err(describe)?;
        let message = if seeded {
            "Demo data seeded."
        } else {
            "Store already populated."
        };
        Ok(ActionResponse::success(message, None))
    })
}

/// Registers a user; `role` is `admin|referrer|customer`.
#[flutter_rust_bridge::frb(sync)]
pub fn register_user(email: String, name: String, role: String) -> ActionResponse {
    respond("register_user", |tab| {
        let role: Role = role.trim().parse().map_err(|err| format!("{err}"))?;
        let user = tab
            .repo()
            .register_user(&email, &name, role)
            .map_err(describe)?;
        Ok(ActionResponse::success(
            "User registered.",
            Some(user.id.to_string()),
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn login_user(email: String) -> ActionResponse {
    respond("login_user", |tab| {
        let user = tab.repo().login_user(&email).map_err(describe)?;
        Ok(ActionResponse::success(
            format!("Signed in as {}.", user.role),
            Some(user.id.to_string()),
        ))
    })
}

/// Returns the session user as JSON, or `null` when signed out.
#[flutter_rust_bridge::frb(sync)]
pub fn current_user() -> String {
    let user = with_tab(|tab| {
        serde_json::to_string(&tab.current_user()).map_err(|err| err.to_string())
    });
    match user {
        Ok(user) => user,
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op=current_user");
            json!({ "error": err }).to_string()
        }
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn logout() -> ActionResponse {
    respond("logout", |tab| {
        tab.repo().logout().map_err(describe)?;
        Ok(ActionResponse::success("Signed out.", None))
    })
}

/// Adds a lead referred by the signed-in user.
#[flutter_rust_bridge::frb(sync)]
pub fn add_lead(email: String, notes: String) -> ActionResponse {
    respond("add_lead", |tab| {
        let referrer = signed_in(tab)?;
        let lead = tab
            .repo()
            .add_lead(&referrer.id, &email, &notes)
            .map_err(describe)?;
        Ok(ActionResponse::success(
            "Lead added.",
            Some(lead.id.to_string()),
        ))
    })
}

/// Converts a lead into a customer project; returns the project ID.
#[flutter_rust_bridge::frb(sync)]
pub fn convert_lead(lead_id: String, customer_name: String, budget: f64) -> ActionResponse {
    respond("convert_lead", |tab| {
        if !budget.is_finite() {
            return Err(format!("budget must be a finite number, got {budget}"));
        }
        let lead_id = LeadId::parse(lead_id.trim()).map_err(|err| err.to_string())?;
        let project = tab
            .repo()
            .convert_lead_to_project(&lead_id, &customer_name, budget)
            .map_err(describe)?;
        Ok(ActionResponse::success(
            "Lead converted.",
            Some(project.id.to_string()),
        ))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn toggle_stage(project_id: String, stage_key: String) -> ActionResponse {
    respond("toggle_stage", |tab| {
        let id = parse_project_id(&project_id)?;
        let updated = tab
            .repo()
            .toggle_stage(&id, stage_key.trim())
            .map_err(describe)?;
        applied(updated.map(|project| project.id), "Stage toggled.")
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn assign_contractor(project_id: String, contractor: String) -> ActionResponse {
    respond("assign_contractor", |tab| {
        let id = parse_project_id(&project_id)?;
        let updated = tab
            .repo()
            .assign_contractor(&id, &contractor)
            .map_err(describe)?;
        applied(updated.map(|project| project.id), "Contractor assigned.")
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn verify_project(project_id: String) -> ActionResponse {
    respond("verify_project", |tab| {
        let id = parse_project_id(&project_id)?;
        let updated = tab.repo().verify_project(&id).map_err(describe)?;
        applied(updated.map(|project| project.id), "Project verified.")
    })
}

/// Sets the commission percent applied to projects created from now on.
#[flutter_rust_bridge::frb(sync)]
pub fn set_default_commission(percent: f64) -> ActionResponse {
    respond("set_default_commission", |tab| {
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(format!("commission must be within 0..=100, got {percent}"));
        }
        tab.repo()
            .write_defaults(Defaults {
                default_commission: percent,
            })
            .map_err(describe)?;
        Ok(ActionResponse::success("Default commission updated.", None))
    })
}

/// Removes every collection and signs this tab out.
#[flutter_rust_bridge::frb(sync)]
pub fn clear_all() -> ActionResponse {
    respond("clear_all", |tab| {
        tab.repo().clear_all().map_err(describe)?;
        Ok(ActionResponse::success("Store cleared.", None))
    })
}

/// Full dashboard read model as a JSON document.
///
/// Reading the snapshot consumes the tab's refresh flag; `needsRefresh`
/// reports whether another client changed the store since the last snapshot.
#[flutter_rust_bridge::frb(sync)]
pub fn snapshot_json() -> String {
    let snapshot = with_tab(|tab| {
        let repo = tab.repo();
        let status = tab.sync_status();
        Ok(json!({
            "currentUser": tab.current_user(),
            "users": repo.list_users(),
            "leads": repo.list_leads(),
            "projects": repo.list_projects(),
            "defaults": repo.read_defaults(),
            "overview": admin_overview(repo),
            "sync": {
                "eventsReceived": status.events_received,
                "lastEvent": status.last_event,
                "needsRefresh": tab.take_refresh(),
            },
        }))
    });
    match snapshot {
        Ok(value) => value.to_string(),
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op=snapshot_json");
            json!({ "error": err }).to_string()
        }
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("CRM_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn lock_tab() -> MutexGuard<'static, Option<DashboardTab>> {
    TAB.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_tab<T>(f: impl FnOnce(&DashboardTab) -> Result<T, String>) -> Result<T, String> {
    let mut slot = lock_tab();
    if slot.is_none() {
        let config = CoreConfig {
            db_path: resolve_db_path(),
            ..CoreConfig::default()
        };
        let tab = DashboardTab::open(&config, &HUB)
            .map_err(|err| format!("store open failed: {err}"))?;
        *slot = Some(tab);
    }
    match slot.as_ref() {
        Some(tab) => f(tab),
        None => Err("store unavailable".to_string()),
    }
}

fn respond(
    op: &'static str,
    f: impl FnOnce(&DashboardTab) -> Result<ActionResponse, String>,
) -> ActionResponse {
    match with_tab(f) {
        Ok(response) => response,
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error op={op}");
            ActionResponse::failure(format!("{op} failed: {err}"))
        }
    }
}

fn applied(id: Option<ProjectId>, message: &str) -> Result<ActionResponse, String> {
    match id {
        Some(id) => Ok(ActionResponse::success(message, Some(id.to_string()))),
        None => Ok(ActionResponse::failure("No matching project or stage.")),
    }
}

fn signed_in(tab: &DashboardTab) -> Result<User, String> {
    tab.current_user()
        .ok_or_else(|| "sign in required".to_string())
}

fn parse_project_id(raw: &str) -> Result<ProjectId, String> {
    ProjectId::parse(raw.trim()).map_err(|err| err.to_string())
}

fn describe(err: DomainError) -> String {
    format!("[{}] {err}", err.code())
}
