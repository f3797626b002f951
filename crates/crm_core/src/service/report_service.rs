//! Read-only dashboard views derived from the stored collections.
//!
//! # Invariants
//! - Views are recomputed from a fresh read on every call; nothing is cached,
//!   so a view taken after a broadcast reflects the other tab's write.

use crate::model::ids::UserId;
use crate::model::lead::LeadStatus;
use crate::model::project::ProjectStatus;
use crate::model::user::Role;
use crate::repo::domain_repo::DomainRepository;
use crate::store::backend::KeyValueBackend;
use serde::Serialize;
use std::collections::BTreeMap;

/// What a referrer sees on their dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferrerSummary {
    pub referrer_id: UserId,
    pub total_leads: usize,
    pub new_leads: usize,
    pub converted_leads: usize,
    pub referred_projects: usize,
    /// Sum of `commission_amount` over referred projects.
    pub total_commission: i64,
}

/// Store-wide counters for the admin view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverview {
    pub users_by_role: BTreeMap<&'static str, usize>,
    pub projects_by_status: BTreeMap<&'static str, usize>,
    pub leads_by_status: BTreeMap<&'static str, usize>,
    /// Projects neither verified nor completed.
    pub awaiting_verification: usize,
    pub pipeline_budget: f64,
    pub default_commission: f64,
}

pub fn referrer_summary<B: KeyValueBackend>(
    repo: &DomainRepository<B>,
    referrer_id: &UserId,
) -> ReferrerSummary {
    let leads = repo.leads_for_referrer(referrer_id);
    let projects = repo.projects_for_referrer(referrer_id);
    let converted_leads = leads.iter().filter(|lead| lead.is_converted()).count();

    ReferrerSummary {
        referrer_id: referrer_id.clone(),
        total_leads: leads.len(),
        new_leads: leads.len() - converted_leads,
        converted_leads,
        referred_projects: projects.len(),
        total_commission: projects.iter().map(|p| p.commission_amount()).sum(),
    }
}

pub fn admin_overview<B: KeyValueBackend>(repo: &DomainRepository<B>) -> AdminOverview {
    let users = repo.list_users();
    let projects = repo.list_projects();
    let leads = repo.list_leads();

    let users_by_role = Role::ALL
        .into_iter()
        .map(|role| (role.as_str(), users.iter().filter(|u| u.role == role).count()))
        .collect();
    let projects_by_status = ProjectStatus::ALL
        .into_iter()
        .map(|status| {
            let count = projects.iter().filter(|p| p.status == status).count();
            (status.as_str(), count)
        })
        .collect();
    let converted = leads
        .iter()
        .filter(|lead| lead.status == LeadStatus::Converted)
        .count();
    let leads_by_status = BTreeMap::from([("new", leads.len() - converted), ("converted", converted)]);

    AdminOverview {
        users_by_role,
        projects_by_status,
        leads_by_status,
        awaiting_verification: projects
            .iter()
            .filter(|p| !p.verified && p.status != ProjectStatus::Completed)
            .count(),
        pipeline_budget: projects.iter().map(|p| p.budget).sum(),
        default_commission: repo.read_defaults().default_commission,
    }
}
