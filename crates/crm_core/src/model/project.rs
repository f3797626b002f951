//! Project record, construction stages and the derived completion rule.
//!
//! # Responsibility
//! - Build projects with creation defaults and the fixed stage sequence.
//! - Merge partial updates and re-derive `status` afterwards.
//!
//! # Invariants
//! - `stages` is always the four template stages in template order.
//! - `status == Completed` exactly when every stage is done.
//! - Completion never clears `verified` or `assigned_contractor`.

use crate::model::ids::{ProjectId, UserId};
use crate::model::validation::{finite, finite_opt, ValidationError};
use crate::model::{now, Timestamp};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOCATION: &str = "—";
pub const DEFAULT_MATERIALS: &str = "Standard";
pub const DEFAULT_TIMELINE_MONTHS: u32 = 12;

/// Fixed construction checkpoints as `(key, label)`.
pub const STAGE_TEMPLATE: [(&str, &str); 4] = [
    ("foundation", "Foundation"),
    ("framing", "Framing"),
    ("roof", "Roof"),
    ("finishing", "Finishing"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Pending,
    InProgress,
    Approved,
    Completed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Pending,
        ProjectStatus::InProgress,
        ProjectStatus::Approved,
        ProjectStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Approved => "approved",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub key: String,
    pub label: String,
    pub done: bool,
}

fn template_stages() -> Vec<Stage> {
    STAGE_TEMPLATE
        .iter()
        .map(|(key, label)| Stage {
            key: (*key).to_string(),
            label: (*label).to_string(),
            done: false,
        })
        .collect()
}

/// Creation payload; every `None` falls back to a creation default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProject {
    pub location: Option<String>,
    pub plot: Option<String>,
    pub budget: Option<f64>,
    pub materials: Option<String>,
    pub timeline: Option<u32>,
    pub commission_percent: Option<f64>,
    pub referrer_id: Option<UserId>,
}

/// Shallow partial update. `Some` fields overwrite, `None` fields are kept.
///
/// Nullable fields use a nested option: `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub customer_id: Option<UserId>,
    pub location: Option<String>,
    pub plot: Option<String>,
    pub budget: Option<f64>,
    pub materials: Option<String>,
    pub timeline: Option<u32>,
    pub status: Option<ProjectStatus>,
    pub verified: Option<bool>,
    pub assigned_contractor: Option<Option<String>>,
    pub referrer_id: Option<Option<UserId>>,
    pub commission_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub customer_id: UserId,
    pub created_at: Timestamp,
    pub location: String,
    pub plot: String,
    pub budget: f64,
    pub materials: String,
    pub timeline: u32,
    pub status: ProjectStatus,
    pub verified: bool,
    pub assigned_contractor: Option<String>,
    pub referrer_id: Option<UserId>,
    pub commission_percent: f64,
    pub stages: Vec<Stage>,
}

impl Project {
    /// Builds a pending project, filling defaults for omitted payload fields.
    ///
    /// `default_commission` is the value of the Defaults record at call time.
    ///
    /// # Errors
    /// - `NotFinite` when the budget or commission percent is NaN or infinite.
    pub fn new(
        customer_id: UserId,
        payload: NewProject,
        default_commission: f64,
    ) -> Result<Self, ValidationError> {
        let budget = finite_opt("budget", payload.budget)?.unwrap_or(0.0);
        let commission_percent = finite(
            "commissionPercent",
            payload.commission_percent.unwrap_or(default_commission),
        )?;

        Ok(Self {
            id: ProjectId::generate(),
            customer_id,
            created_at: now(),
            location: non_blank(payload.location).unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
            plot: payload.plot.unwrap_or_default(),
            budget,
            materials: non_blank(payload.materials)
                .unwrap_or_else(|| DEFAULT_MATERIALS.to_string()),
            timeline: payload.timeline.unwrap_or(DEFAULT_TIMELINE_MONTHS),
            status: ProjectStatus::Pending,
            verified: false,
            assigned_contractor: None,
            referrer_id: payload.referrer_id,
            commission_percent,
            stages: template_stages(),
        })
    }

    pub fn all_stages_done(&self) -> bool {
        !self.stages.is_empty() && self.stages.iter().all(|stage| stage.done)
    }

    pub fn stage(&self, key: &str) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.key == key)
    }

    /// Flips the stage with exactly `key`. Returns `false` when absent.
    pub fn toggle_stage(&mut self, key: &str) -> bool {
        match self.stages.iter_mut().find(|stage| stage.key == key) {
            Some(stage) => {
                stage.done = !stage.done;
                self.reconcile_status();
                true
            }
            None => false,
        }
    }

    /// Merges `patch` field by field, then re-derives `status`.
    ///
    /// A patch carrying a non-finite number is rejected before any field
    /// changes.
    pub fn apply(&mut self, patch: ProjectPatch) -> Result<(), ValidationError> {
        finite_opt("budget", patch.budget)?;
        finite_opt("commissionPercent", patch.commission_percent)?;

        let ProjectPatch {
            customer_id,
            location,
            plot,
            budget,
            materials,
            timeline,
            status,
            verified,
            assigned_contractor,
            referrer_id,
            commission_percent,
        } = patch;

        if let Some(value) = customer_id {
            self.customer_id = value;
        }
        if let Some(value) = location {
            self.location = value;
        }
        if let Some(value) = plot {
            self.plot = value;
        }
        if let Some(value) = budget {
            self.budget = value;
        }
        if let Some(value) = materials {
            self.materials = value;
        }
        if let Some(value) = timeline {
            self.timeline = value;
        }
        if let Some(value) = status {
            self.status = value;
        }
        if let Some(value) = verified {
            self.verified = value;
        }
        if let Some(value) = assigned_contractor {
            self.assigned_contractor = value;
        }
        if let Some(value) = referrer_id {
            self.referrer_id = value;
        }
        if let Some(value) = commission_percent {
            self.commission_percent = value;
        }

        self.reconcile_status();
        Ok(())
    }

    /// Re-derives `status` from the stages.
    ///
    /// All stages done forces `Completed`. A `Completed` status without all
    /// stages done falls back to the progress implied by verification and
    /// contractor assignment.
    pub fn reconcile_status(&mut self) {
        if self.all_stages_done() {
            self.status = ProjectStatus::Completed;
        } else if self.status == ProjectStatus::Completed {
            self.status = self.progress_status();
        }
    }

    fn progress_status(&self) -> ProjectStatus {
        if self.verified {
            ProjectStatus::Approved
        } else if self.assigned_contractor.is_some() {
            ProjectStatus::InProgress
        } else {
            ProjectStatus::Pending
        }
    }

    /// Referrer commission in whole currency units.
    pub fn commission_amount(&self) -> i64 {
        (self.budget * self.commission_percent / 100.0).round() as i64
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{NewProject, Project, ProjectPatch, ProjectStatus, STAGE_TEMPLATE};
    use crate::model::ids::UserId;
    use crate::model::validation::ValidationError;

    fn project() -> Project {
        Project::new(UserId::generate(), NewProject::default(), 5.0).unwrap()
    }

    #[test]
    fn new_project_applies_creation_defaults() {
        let project = project();
        assert_eq!(project.location, "—");
        assert_eq!(project.materials, "Standard");
        assert_eq!(project.timeline, 12);
        assert_eq!(project.commission_percent, 5.0);
        assert_eq!(project.status, ProjectStatus::Pending);
        let keys: Vec<&str> = project.stages.iter().map(|s| s.key.as_str()).collect();
        let expected: Vec<&str> = STAGE_TEMPLATE.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, expected);
        assert!(project.stages.iter().all(|s| !s.done));
    }

    #[test]
    fn finishing_every_stage_completes_and_undoing_reverts() {
        let mut project = project();
        project.apply(ProjectPatch {
            verified: Some(true),
            ..ProjectPatch::default()
        })
        .unwrap();
        for (key, _) in STAGE_TEMPLATE {
            assert!(project.toggle_stage(key));
        }
        assert_eq!(project.status, ProjectStatus::Completed);
        assert!(project.verified);

        project.toggle_stage("roof");
        assert_eq!(project.status, ProjectStatus::Approved);
    }

    #[test]
    fn patch_cannot_force_completion_with_open_stages() {
        let mut project = project();
        project.apply(ProjectPatch {
            status: Some(ProjectStatus::Completed),
            assigned_contractor: Some(Some("Acme".to_string())),
            ..ProjectPatch::default()
        })
        .unwrap();
        assert_eq!(project.status, ProjectStatus::InProgress);
        assert_eq!(project.assigned_contractor.as_deref(), Some("Acme"));
    }

    #[test]
    fn toggle_unknown_stage_is_rejected() {
        let mut project = project();
        assert!(!project.toggle_stage("Roof"));
        assert!(project.stage("roof").is_some_and(|s| !s.done));
    }

    #[test]
    fn commission_amount_rounds_to_whole_units() {
        let mut project = project();
        project.apply(ProjectPatch {
            budget: Some(42_000.0),
            commission_percent: Some(7.0),
            ..ProjectPatch::default()
        })
        .unwrap();
        assert_eq!(project.commission_amount(), 2940);

        project.budget = 1_010.0;
        project.commission_percent = 2.5;
        assert_eq!(project.commission_amount(), 25);
    }

    #[test]
    fn non_finite_numbers_are_rejected_without_partial_merge() {
        let err = Project::new(
            UserId::generate(),
            NewProject {
                budget: Some(f64::INFINITY),
                ..NewProject::default()
            },
            5.0,
        )
        .unwrap_err();
        assert_eq!(err, ValidationError::NotFinite("budget"));
        assert!(Project::new(UserId::generate(), NewProject::default(), f64::NAN).is_err());

        let mut project = project();
        let before = project.clone();
        let err = project
            .apply(ProjectPatch {
                plot: Some("Lot 3".to_string()),
                commission_percent: Some(f64::NAN),
                ..ProjectPatch::default()
            })
            .unwrap_err();
        assert_eq!(err, ValidationError::NotFinite("commissionPercent"));
        assert_eq!(project, before);
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_value(ProjectStatus::InProgress).unwrap();
        assert_eq!(json, "in-progress");
    }
}
