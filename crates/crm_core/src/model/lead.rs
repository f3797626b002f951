//! Lead record and its one-way conversion.

use crate::model::ids::{LeadId, ProjectId, UserId};
use crate::model::{now, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Converted,
}

/// A referral awaiting conversion into a project.
///
/// `converted_project_id` is `Some` exactly when `status == Converted`;
/// only [`Lead::mark_converted`] moves a lead out of `New`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: LeadId,
    pub referrer_id: UserId,
    pub email: String,
    pub notes: String,
    pub status: LeadStatus,
    pub created_at: Timestamp,
    pub converted_project_id: Option<ProjectId>,
}

impl Lead {
    pub fn new(referrer_id: UserId, email: &str, notes: &str) -> Self {
        Self {
            id: LeadId::generate(),
            referrer_id,
            email: email.trim().to_string(),
            notes: notes.to_string(),
            status: LeadStatus::New,
            created_at: now(),
            converted_project_id: None,
        }
    }

    pub fn is_converted(&self) -> bool {
        self.status == LeadStatus::Converted
    }

    /// Marks the lead converted into `project_id`.
    ///
    /// Returns `false` and leaves the lead untouched when already converted.
    pub fn mark_converted(&mut self, project_id: ProjectId) -> bool {
        if self.is_converted() {
            return false;
        }
        self.status = LeadStatus::Converted;
        self.converted_project_id = Some(project_id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{Lead, LeadStatus};
    use crate::model::ids::{ProjectId, UserId};

    #[test]
    fn conversion_happens_once() {
        let mut lead = Lead::new(UserId::generate(), " lead@y.com ", "call back");
        assert_eq!(lead.email, "lead@y.com");
        assert_eq!(lead.status, LeadStatus::New);

        let first = ProjectId::generate();
        assert!(lead.mark_converted(first.clone()));
        assert!(!lead.mark_converted(ProjectId::generate()));
        assert_eq!(lead.converted_project_id, Some(first));
    }

    #[test]
    fn lead_serializes_null_project_until_converted() {
        let lead = Lead::new(UserId::generate(), "lead@y.com", "");
        let json = serde_json::to_value(&lead).unwrap();
        assert_eq!(json["status"], "new");
        assert!(json["convertedProjectId"].is_null());
    }
}
