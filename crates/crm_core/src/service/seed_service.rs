//! Demo data bootstrap.
//!
//! # Invariants
//! - Seeding only runs against an empty `users` collection, so calling it on
//!   every startup is safe.

use crate::model::project::{NewProject, STAGE_TEMPLATE};
use crate::model::user::Role;
use crate::repo::domain_repo::DomainRepository;
use crate::repo::DomainResult;
use crate::store::backend::KeyValueBackend;
use log::info;

pub const DEMO_ADMIN_EMAIL: &str = "admin@demo.local";
pub const DEMO_REFERRER_EMAIL: &str = "referrer@demo.local";
pub const DEMO_CUSTOMER_EMAIL: &str = "customer@demo.local";

/// Populates demo users, one lead and one project when no user exists yet.
///
/// Returns `true` when data was written, `false` when the store already had
/// users.
pub fn seed_demo<B: KeyValueBackend>(repo: &DomainRepository<B>) -> DomainResult<bool> {
    if !repo.list_users().is_empty() {
        info!("event=seed_demo module=seed status=skip reason=users_present");
        return Ok(false);
    }

    repo.register_user(DEMO_ADMIN_EMAIL, "Avery Admin", Role::Admin)?;
    let referrer = repo.register_user(DEMO_REFERRER_EMAIL, "Riley Referrer", Role::Referrer)?;
    let customer = repo.register_user(DEMO_CUSTOMER_EMAIL, "Casey Customer", Role::Customer)?;

    repo.add_lead(
        &referrer.id,
        "prospect@demo.local",
        "Wants a two-storey timber frame home.",
    )?;

    let project = repo.add_project(
        &customer.id,
        NewProject {
            location: Some("Lakeside Rd".to_string()),
            plot: Some("Lot 14".to_string()),
            budget: Some(250_000.0),
            materials: Some("Timber".to_string()),
            timeline: Some(10),
            referrer_id: Some(referrer.id.clone()),
            ..NewProject::default()
        },
    )?;
    let (first_stage, _) = STAGE_TEMPLATE[0];
    repo.toggle_stage(&project.id, first_stage)?;

    info!("event=seed_demo module=seed status=ok users=3 leads=1 projects=1");
    Ok(true)
}
