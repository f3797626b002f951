//! Dashboard repository: users, leads, projects and defaults.
//!
//! # Responsibility
//! - Implement registration, login, lead capture and conversion, project
//!   creation and progress tracking.
//! - Keep derived state (project completion, lead conversion link) correct
//!   after every mutation.
//!
//! # Invariants
//! - Each mutation is read full collection, change a copy, write full
//!   collection. Concurrent tabs can overwrite each other's changes.
//! - New leads and projects are prepended; users are appended.
//! - Lookups by email ignore ASCII case.

use crate::model::defaults::Defaults;
use crate::model::ids::{LeadId, ProjectId, UserId};
use crate::model::lead::Lead;
use crate::model::project::{NewProject, Project, ProjectPatch, ProjectStatus};
use crate::model::user::{Role, User};
use crate::model::validation::{finite, ValidationError};
use crate::repo::{DomainError, DomainResult};
use crate::session::session_manager::SessionManager;
use crate::store::backend::KeyValueBackend;
use crate::store::collection::Collection;
use crate::store::kv_store::KeyValueStore;
use crate::sync::events::ChangeEvent;
use log::{info, warn};

pub struct DomainRepository<B: KeyValueBackend> {
    store: KeyValueStore<B>,
    session: SessionManager,
    fallback_defaults: Defaults,
}

impl<B: KeyValueBackend> DomainRepository<B> {
    pub fn new(store: KeyValueStore<B>, session: SessionManager) -> Self {
        Self {
            store,
            session,
            fallback_defaults: Defaults::default(),
        }
    }

    /// Overrides the commission used while no `defaults` record is stored.
    pub fn with_default_commission(mut self, percent: f64) -> Self {
        self.fallback_defaults.default_commission = percent;
        self
    }

    pub fn store(&self) -> &KeyValueStore<B> {
        &self.store
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn list_users(&self) -> Vec<User> {
        self.store.read(Collection::Users, Vec::new())
    }

    pub fn list_leads(&self) -> Vec<Lead> {
        self.store.read(Collection::Leads, Vec::new())
    }

    pub fn list_projects(&self) -> Vec<Project> {
        self.store.read(Collection::Projects, Vec::new())
    }

    pub fn read_defaults(&self) -> Defaults {
        self.store.read(Collection::Defaults, self.fallback_defaults)
    }

    pub fn get_user(&self, id: &UserId) -> Option<User> {
        self.list_users().into_iter().find(|user| &user.id == id)
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        self.list_users().into_iter().find(|user| user.has_email(email))
    }

    pub fn get_lead(&self, id: &LeadId) -> Option<Lead> {
        self.list_leads().into_iter().find(|lead| &lead.id == id)
    }

    pub fn get_project(&self, id: &ProjectId) -> Option<Project> {
        self.list_projects()
            .into_iter()
            .find(|project| &project.id == id)
    }

    pub fn leads_for_referrer(&self, referrer_id: &UserId) -> Vec<Lead> {
        self.list_leads()
            .into_iter()
            .filter(|lead| &lead.referrer_id == referrer_id)
            .collect()
    }

    pub fn projects_for_customer(&self, customer_id: &UserId) -> Vec<Project> {
        self.list_projects()
            .into_iter()
            .filter(|project| &project.customer_id == customer_id)
            .collect()
    }

    pub fn projects_for_referrer(&self, referrer_id: &UserId) -> Vec<Project> {
        self.list_projects()
            .into_iter()
            .filter(|project| project.referrer_id.as_ref() == Some(referrer_id))
            .collect()
    }

    /// Acting user of this tab.
    pub fn current_user(&self) -> Option<User> {
        self.session.get_session()
    }

    /// Creates a user.
    ///
    /// # Errors
    /// - `Validation` when email or name is blank.
    /// - `Conflict` when the email is already registered, ignoring case.
    pub fn register_user(&self, email: &str, name: &str, role: Role) -> DomainResult<User> {
        let user = User::new(email, name, role)?;
        let mut users = self.list_users();
        if users.iter().any(|existing| existing.has_email(&user.email)) {
            warn!("event=register_user module=repo status=error error_code=conflict");
            return Err(DomainError::Conflict(format!(
                "email already registered: {}",
                user.email
            )));
        }

        users.push(user.clone());
        self.store.write(Collection::Users, &users)?;
        info!(
            "event=register_user module=repo status=ok user_id={} role={}",
            user.id, user.role
        );
        Ok(user)
    }

    /// Makes the user with `email` this tab's acting user.
    pub fn login_user(&self, email: &str) -> DomainResult<User> {
        let Some(user) = self.find_user_by_email(email) else {
            warn!("event=login_user module=repo status=error error_code=not_found");
            return Err(DomainError::not_found("user", email.trim()));
        };
        self.session.set_session(&user)?;
        info!("event=login_user module=repo status=ok user_id={}", user.id);
        Ok(user)
    }

    pub fn logout(&self) -> DomainResult<()> {
        self.session.clear_session()?;
        Ok(())
    }

    /// Returns the user with `email`, creating it when absent.
    ///
    /// A blank `name` falls back to the email's local part; `role` defaults
    /// to customer. Blank input is stored as given, so only a storage
    /// failure is returned.
    pub fn register_or_get_user_by_email(
        &self,
        email: &str,
        name: &str,
        role: Option<Role>,
    ) -> DomainResult<User> {
        let mut users = self.list_users();
        if let Some(existing) = users.iter().find(|user| user.has_email(email)) {
            return Ok(existing.clone());
        }

        let user = User::from_email(email, name, role.unwrap_or_default());
        users.push(user.clone());
        self.store.write(Collection::Users, &users)?;
        info!(
            "event=register_or_get_user module=repo status=ok user_id={} created=true",
            user.id
        );
        Ok(user)
    }

    pub fn add_lead(&self, referrer_id: &UserId, email: &str, notes: &str) -> DomainResult<Lead> {
        let lead = Lead::new(referrer_id.clone(), email, notes);
        let mut leads = self.list_leads();
        leads.insert(0, lead.clone());
        self.store.write(Collection::Leads, &leads)?;
        info!(
            "event=add_lead module=repo status=ok lead_id={} referrer_id={}",
            lead.id, lead.referrer_id
        );
        Ok(lead)
    }

    /// Converts a new lead into a project for the lead's email.
    ///
    /// The customer is found or created from the lead email, the project
    /// carries the lead's referrer and `budget`, and the lead is linked to it.
    ///
    /// # Errors
    /// - `Validation` when `budget` is NaN or infinite; nothing is written.
    /// - `NotFound` when the lead does not exist.
    /// - `Conflict` when the lead was already converted.
    pub fn convert_lead_to_project(
        &self,
        lead_id: &LeadId,
        customer_name: &str,
        budget: f64,
    ) -> DomainResult<Project> {
        finite("budget", budget)?;
        let Some(lead) = self.get_lead(lead_id) else {
            warn!("event=convert_lead module=repo status=error error_code=not_found lead_id={lead_id}");
            return Err(DomainError::not_found("lead", lead_id.as_str()));
        };
        if let Some(project_id) = &lead.converted_project_id {
            warn!("event=convert_lead module=repo status=error error_code=conflict lead_id={lead_id}");
            return Err(DomainError::Conflict(format!(
                "lead {lead_id} already converted into {project_id}"
            )));
        }

        let customer =
            self.register_or_get_user_by_email(&lead.email, customer_name, Some(Role::Customer))?;
        let project = self.add_project(
            &customer.id,
            NewProject {
                budget: Some(budget),
                referrer_id: Some(lead.referrer_id.clone()),
                ..NewProject::default()
            },
        )?;

        let mut leads = self.list_leads();
        match leads.iter_mut().find(|stored| &stored.id == lead_id) {
            Some(stored) => {
                stored.mark_converted(project.id.clone());
            }
            None => {
                // Removed by another tab since the first read; restore it.
                let mut restored = lead;
                restored.mark_converted(project.id.clone());
                leads.insert(0, restored);
            }
        }
        self.store.write(Collection::Leads, &leads)?;
        info!(
            "event=convert_lead module=repo status=ok lead_id={lead_id} project_id={} customer_id={}",
            project.id, customer.id
        );
        Ok(project)
    }

    /// Creates a pending project; omitted fields get creation defaults.
    ///
    /// # Errors
    /// - `Validation` when a number in `payload` is NaN or infinite; the
    ///   stored projects are left untouched.
    pub fn add_project(&self, customer_id: &UserId, payload: NewProject) -> DomainResult<Project> {
        let defaults = self.read_defaults();
        let project = Project::new(customer_id.clone(), payload, defaults.default_commission)?;
        let mut projects = self.list_projects();
        projects.insert(0, project.clone());
        self.store.write(Collection::Projects, &projects)?;
        info!(
            "event=add_project module=repo status=ok project_id={} customer_id={}",
            project.id, project.customer_id
        );
        Ok(project)
    }

    /// Shallow-merges `patch` into the project. `Ok(None)` when missing.
    pub fn update_project(
        &self,
        id: &ProjectId,
        patch: ProjectPatch,
    ) -> DomainResult<Option<Project>> {
        self.mutate_project(id, "update_project", |project| {
            project.apply(patch)?;
            Ok(true)
        })
    }

    /// Flips one stage. `Ok(None)` when the project or stage is missing.
    pub fn toggle_stage(&self, id: &ProjectId, stage_key: &str) -> DomainResult<Option<Project>> {
        self.mutate_project(id, "toggle_stage", |project| Ok(project.toggle_stage(stage_key)))
    }

    /// Assigns a contractor and moves the project to `in-progress`.
    ///
    /// A verified project stays `approved`; completion still wins.
    pub fn assign_contractor(
        &self,
        id: &ProjectId,
        contractor: &str,
    ) -> DomainResult<Option<Project>> {
        self.mutate_project(id, "assign_contractor", |project| {
            let status = if project.verified {
                ProjectStatus::Approved
            } else {
                ProjectStatus::InProgress
            };
            project.apply(ProjectPatch {
                assigned_contractor: Some(Some(contractor.trim().to_string())),
                status: Some(status),
                ..ProjectPatch::default()
            })?;
            Ok(true)
        })
    }

    /// Marks the project verified and `approved`.
    pub fn verify_project(&self, id: &ProjectId) -> DomainResult<Option<Project>> {
        self.update_project(
            id,
            ProjectPatch {
                verified: Some(true),
                status: Some(ProjectStatus::Approved),
                ..ProjectPatch::default()
            },
        )
    }

    fn mutate_project(
        &self,
        id: &ProjectId,
        op: &'static str,
        change: impl FnOnce(&mut Project) -> Result<bool, ValidationError>,
    ) -> DomainResult<Option<Project>> {
        let mut projects = self.list_projects();
        let Some(project) = projects.iter_mut().find(|project| &project.id == id) else {
            info!("event={op} module=repo status=skip reason=project_missing project_id={id}");
            return Ok(None);
        };
        if !change(project)? {
            info!("event={op} module=repo status=skip reason=no_change project_id={id}");
            return Ok(None);
        }

        let updated = project.clone();
        self.store.write(Collection::Projects, &projects)?;
        info!(
            "event={op} module=repo status=ok project_id={id} project_status={}",
            updated.status.as_str()
        );
        Ok(Some(updated))
    }

    pub fn write_defaults(&self, defaults: Defaults) -> DomainResult<()> {
        finite("defaultCommission", defaults.default_commission)?;
        self.store.write(Collection::Defaults, &defaults)?;
        info!(
            "event=write_defaults module=repo status=ok default_commission={}",
            defaults.default_commission
        );
        Ok(())
    }

    /// Removes every collection and this tab's session, then announces it.
    pub fn clear_all(&self) -> DomainResult<()> {
        for collection in Collection::ALL {
            self.store.remove(collection)?;
        }
        self.session.discard()?;
        self.store
            .notifier()
            .publish(self.store.context(), &ChangeEvent::StoreCleared);
        info!("event=clear_all module=repo status=ok");
        Ok(())
    }
}
