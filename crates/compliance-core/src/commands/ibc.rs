//! IBC application commands

use chrono::{NaiveDate, Utc};
use compliance_domain::{
    validate_ibc_application, IbcApplication, IbcBoardMember, IbcPersonnel, IbcStatus,
    ReviewComment, ReviewerAssignment, ValidationIssue,
};
use serde::{Deserialize, Serialize};

use super::{ensure_valid, Command};
use crate::error::{ComplianceError, Result};
use crate::persistence::Repository;
use crate::workflow::{ibc_workflow, TransitionInput};

const UNKNOWN_USER: &str = "unknown";

/// Register a new application. It always starts as a draft.
#[derive(Debug, Clone)]
pub struct CreateIbcApplication {
    pub application: IbcApplication,
}

impl Command for CreateIbcApplication {
    type Output = IbcApplication;

    fn execute(self, repo: &Repository) -> Result<IbcApplication> {
        let mut app = self.application;
        ensure_valid(validate_ibc_application(&app))?;
        if repo.get_ibc_application(&app.id)?.is_some() {
            return Err(ComplianceError::Conflict(format!(
                "IBC application {} already exists",
                app.id
            )));
        }

        let now = Utc::now();
        app.status = IbcStatus::Draft;
        app.created_at = now;
        app.updated_at = now;
        repo.save_ibc_application(&app)?;

        tracing::info!(ibc_number = %app.ibc_number, id = %app.id, "IBC application created");
        Ok(app)
    }
}

/// Reviewers are board members, by board member id, serving on `today`
fn check_reviewers<'a>(
    repo: &Repository,
    reviewer_ids: impl Iterator<Item = &'a String>,
    today: NaiveDate,
) -> Result<()> {
    let board = repo.list_board_members()?;
    let issues = reviewer_ids
        .filter(|id| !board.iter().any(|m| &m.id == *id && m.is_serving(today)))
        .map(|id| {
            ValidationIssue::error(
                "reviewerIds",
                format!("{} is not a serving IBC board member", id),
            )
        })
        .collect();
    ensure_valid(issues)
}

/// Move an application along the review workflow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionIbcApplication {
    #[serde(default)]
    pub application_id: String,
    #[serde(rename = "status")]
    pub to: IbcStatus,
    pub comment: Option<String>,
    #[serde(default)]
    pub reviewer_ids: Vec<String>,
    pub user: Option<String>,
}

impl Command for TransitionIbcApplication {
    type Output = IbcApplication;

    fn execute(self, repo: &Repository) -> Result<IbcApplication> {
        let mut app = repo
            .get_ibc_application(&self.application_id)?
            .ok_or_else(|| {
                ComplianceError::NotFound(format!("IBC application {}", self.application_id))
            })?;

        let new_reviewers: Vec<String> = self
            .reviewer_ids
            .iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();

        let now = Utc::now();
        check_reviewers(
            repo,
            new_reviewers.iter().filter(|r| !app.has_reviewer(r)),
            now.date_naive(),
        )?;

        // Reviewers already on the application count toward the guard
        let input = TransitionInput {
            comment: self.comment.clone(),
            ..TransitionInput::new().with_reviewers(
                app.reviewer_assignments
                    .iter()
                    .map(|a| a.reviewer_id.clone())
                    .chain(new_reviewers.iter().cloned()),
            )
        };
        ibc_workflow().validate(app.status, self.to, &input)?;

        let from = app.status;
        app.status = self.to;

        if let Some(comment) = self.comment.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            app.review_comments.push(ReviewComment {
                comment: comment.to_string(),
                timestamp: now,
                user: self.user.clone().unwrap_or_else(|| UNKNOWN_USER.to_string()),
            });
        }

        for reviewer_id in new_reviewers {
            if !app.has_reviewer(&reviewer_id) {
                app.reviewer_assignments
                    .push(ReviewerAssignment::assigned(reviewer_id, now));
            }
        }

        app.updated_at = now;
        repo.save_ibc_application(&app)?;

        tracing::info!(
            ibc_number = %app.ibc_number,
            from = %from,
            to = %app.status,
            reviewers = app.reviewer_assignments.len(),
            "IBC application transitioned"
        );
        Ok(app)
    }
}

/// List a scientist as personnel on an application
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddIbcPersonnel {
    #[serde(default)]
    pub application_id: String,
    pub scientist_id: String,
    pub role: String,
}

impl Command for AddIbcPersonnel {
    type Output = IbcPersonnel;

    fn execute(self, repo: &Repository) -> Result<IbcPersonnel> {
        if repo.get_ibc_application(&self.application_id)?.is_none() {
            return Err(ComplianceError::NotFound(format!(
                "IBC application {}",
                self.application_id
            )));
        }
        if repo.get_scientist(&self.scientist_id)?.is_none() {
            return Err(ComplianceError::NotFound(format!(
                "Scientist {}",
                self.scientist_id
            )));
        }
        if self.role.trim().is_empty() {
            return Err(ComplianceError::Validation(vec![
                compliance_domain::ValidationIssue::error("role", "Role is required"),
            ]));
        }
        if repo
            .list_personnel(&self.application_id)?
            .iter()
            .any(|p| p.scientist_id == self.scientist_id)
        {
            return Err(ComplianceError::Conflict(format!(
                "Scientist {} is already listed on this application",
                self.scientist_id
            )));
        }

        let personnel = IbcPersonnel {
            id: compliance_domain::new_id(),
            application_id: self.application_id,
            scientist_id: self.scientist_id,
            role: self.role.trim().to_string(),
        };
        repo.insert_personnel(&personnel)?;
        Ok(personnel)
    }
}

/// Create or update a board seat
#[derive(Debug, Clone)]
pub struct SaveBoardMember {
    pub member: IbcBoardMember,
}

impl Command for SaveBoardMember {
    type Output = IbcBoardMember;

    fn execute(self, repo: &Repository) -> Result<IbcBoardMember> {
        if repo.get_scientist(&self.member.scientist_id)?.is_none() {
            return Err(ComplianceError::NotFound(format!(
                "Scientist {}",
                self.member.scientist_id
            )));
        }
        repo.save_board_member(&self.member)?;
        tracing::debug!(member = %self.member.id, role = self.member.role.as_str(), "Board member saved");
        Ok(self.member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkflowError;

    fn setup() -> (Repository, IbcApplication) {
        let repo = Repository::in_memory().unwrap();
        let app = CreateIbcApplication {
            application: IbcApplication::new("IBC-2024-001", "CRISPR screening in HEK293"),
        }
        .execute(&repo)
        .unwrap();
        (repo, app)
    }

    fn board_member(repo: &Repository, term_end_date: Option<NaiveDate>) -> IbcBoardMember {
        let scientist = compliance_domain::Scientist::new("Paul", "Berg");
        repo.save_scientist(&scientist).unwrap();
        SaveBoardMember {
            member: IbcBoardMember {
                id: compliance_domain::new_id(),
                scientist_id: scientist.id,
                role: compliance_domain::BoardRole::Member,
                expertise: vec!["virology".into()],
                is_active: true,
                term_end_date,
            },
        }
        .execute(repo)
        .unwrap()
    }

    fn transition(id: &str, to: IbcStatus) -> TransitionIbcApplication {
        TransitionIbcApplication {
            application_id: id.to_string(),
            to,
            ..Default::default()
        }
    }

    #[test]
    fn test_submit_with_comment() {
        let (repo, app) = setup();
        let updated = TransitionIbcApplication {
            comment: Some("Ready for vetting".into()),
            user: Some("pmo".into()),
            ..transition(&app.id, IbcStatus::Submitted)
        }
        .execute(&repo)
        .unwrap();

        assert_eq!(updated.status, IbcStatus::Submitted);
        assert_eq!(updated.review_comments.len(), 1);
        assert_eq!(updated.review_comments[0].user, "pmo");
        assert_eq!(
            repo.get_ibc_application(&app.id).unwrap().unwrap().status,
            IbcStatus::Submitted
        );
    }

    #[test]
    fn test_under_review_needs_reviewers() {
        let (repo, app) = setup();
        transition(&app.id, IbcStatus::Submitted).execute(&repo).unwrap();
        transition(&app.id, IbcStatus::Vetted).execute(&repo).unwrap();

        let err = transition(&app.id, IbcStatus::UnderReview)
            .execute(&repo)
            .unwrap_err();
        assert!(matches!(
            err,
            ComplianceError::Workflow(WorkflowError::GuardFailed { .. })
        ));
        assert_eq!(
            repo.get_ibc_application(&app.id).unwrap().unwrap().status,
            IbcStatus::Vetted
        );

        let reviewer = board_member(&repo, None);
        let updated = TransitionIbcApplication {
            reviewer_ids: vec![reviewer.id.clone(), reviewer.id.clone(), " ".into()],
            ..transition(&app.id, IbcStatus::UnderReview)
        }
        .execute(&repo)
        .unwrap();
        assert_eq!(updated.reviewer_assignments.len(), 1);
    }

    #[test]
    fn test_reviewer_must_be_serving_board_member() {
        let (repo, app) = setup();
        transition(&app.id, IbcStatus::Submitted).execute(&repo).unwrap();
        transition(&app.id, IbcStatus::Vetted).execute(&repo).unwrap();

        let lapsed = board_member(&repo, NaiveDate::from_ymd_opt(2000, 1, 1));
        for reviewer_id in [lapsed.id.as_str(), "not-on-board"] {
            let err = TransitionIbcApplication {
                reviewer_ids: vec![reviewer_id.to_string()],
                ..transition(&app.id, IbcStatus::UnderReview)
            }
            .execute(&repo)
            .unwrap_err();
            match err {
                ComplianceError::Validation(issues) => assert_eq!(issues[0].field, "reviewerIds"),
                other => panic!("unexpected: {other:?}"),
            }
        }
        let stored = repo.get_ibc_application(&app.id).unwrap().unwrap();
        assert_eq!(stored.status, IbcStatus::Vetted);
        assert!(stored.reviewer_assignments.is_empty());
    }

    #[test]
    fn test_create_does_not_overwrite_existing() {
        let (repo, app) = setup();
        transition(&app.id, IbcStatus::Submitted).execute(&repo).unwrap();

        let err = CreateIbcApplication {
            application: IbcApplication {
                id: app.id.clone(),
                ..IbcApplication::new("IBC-2024-001", "Reset")
            },
        }
        .execute(&repo)
        .unwrap_err();
        assert!(matches!(err, ComplianceError::Conflict(_)));
        assert_eq!(
            repo.get_ibc_application(&app.id).unwrap().unwrap().status,
            IbcStatus::Submitted
        );
    }

    #[test]
    fn test_skipping_a_step_is_rejected() {
        let (repo, app) = setup();
        let err = transition(&app.id, IbcStatus::Active)
            .execute(&repo)
            .unwrap_err();
        assert!(matches!(
            err,
            ComplianceError::Workflow(WorkflowError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_missing_application() {
        let repo = Repository::in_memory().unwrap();
        assert!(matches!(
            transition("nope", IbcStatus::Submitted).execute(&repo),
            Err(ComplianceError::NotFound(_))
        ));
    }
}
