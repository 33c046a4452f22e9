//! Publication commands: creation, authorship and status changes

use std::collections::BTreeMap;

use chrono::Utc;
use compliance_domain::{
    new_id, validate_publication, AuthorshipRole, ManuscriptHistory, Publication,
    PublicationAuthor, PublicationStatus,
};
use serde::{Deserialize, Serialize};

use super::{ensure_valid, Command};
use crate::error::{ComplianceError, Result};
use crate::persistence::Repository;
use crate::workflow::publication::{parse_updates, plan_status_change};

/// History rows for the status itself use this field name
pub const STATUS_FIELD: &str = "status";

/// Register a new publication at the Concept stage
#[derive(Debug, Clone)]
pub struct CreatePublication {
    pub publication: Publication,
}

impl Command for CreatePublication {
    type Output = Publication;

    fn execute(self, repo: &Repository) -> Result<Publication> {
        let mut publication = self.publication;
        if repo.get_publication(&publication.id)?.is_some() {
            return Err(ComplianceError::Conflict(format!(
                "Publication {} already exists",
                publication.id
            )));
        }
        publication.status = PublicationStatus::Concept;
        publication.updated_at = Utc::now();
        ensure_valid(validate_publication(&publication))?;
        repo.save_publication(&publication)?;
        tracing::info!(id = %publication.id, title = %publication.title, "Publication created");
        Ok(publication)
    }
}

/// Move a publication to a new status, collecting the fields it requires
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePublicationStatus {
    #[serde(default)]
    pub publication_id: String,
    #[serde(rename = "status")]
    pub to: PublicationStatus,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    pub changed_by: Option<String>,
}

/// Result of a status change: the updated record and the rows appended to its history
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub publication: Publication,
    pub history: Vec<ManuscriptHistory>,
}

impl Command for ChangePublicationStatus {
    type Output = StatusChange;

    fn execute(self, repo: &Repository) -> Result<StatusChange> {
        let mut publication = repo
            .get_publication(&self.publication_id)?
            .ok_or_else(|| ComplianceError::NotFound(format!("Publication {}", self.publication_id)))?;

        let updates = parse_updates(&self.fields)?;
        let changes = plan_status_change(&publication, self.to, &updates)?;

        let from = publication.status;
        for (field, value) in &updates {
            publication.set_field(*field, value)?;
        }
        ensure_valid(validate_publication(&publication))?;

        let now = Utc::now();
        publication.status = self.to;
        publication.updated_at = now;

        let row = |changed_field: &str, old_value: Option<String>, new_value: Option<String>| {
            ManuscriptHistory {
                id: new_id(),
                publication_id: publication.id.clone(),
                from_status: from,
                to_status: self.to,
                changed_field: changed_field.to_string(),
                old_value,
                new_value,
                changed_by: self.changed_by.clone(),
                timestamp: now,
            }
        };
        let history: Vec<ManuscriptHistory> = std::iter::once(row(
            STATUS_FIELD,
            Some(from.label().to_string()),
            Some(self.to.label().to_string()),
        ))
        .chain(
            changes
                .into_iter()
                .map(|c| row(c.field.as_str(), c.old_value, c.new_value)),
        )
        .collect();

        repo.transaction(|repo| {
            repo.save_publication(&publication)?;
            for entry in &history {
                repo.append_history(entry)?;
            }
            Ok(())
        })?;

        tracing::info!(
            publication = %publication.id,
            from = %from,
            to = %self.to,
            fields_changed = history.len() - 1,
            "Publication status changed"
        );
        Ok(StatusChange {
            publication,
            history,
        })
    }
}

/// Link a scientist to a publication as an author
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPublicationAuthor {
    #[serde(default)]
    pub publication_id: String,
    pub scientist_id: String,
    #[serde(rename = "authorshipType")]
    pub authorship: AuthorshipRole,
    /// Appended after the last author when absent
    pub author_position: Option<u32>,
}

impl Command for AddPublicationAuthor {
    type Output = PublicationAuthor;

    fn execute(self, repo: &Repository) -> Result<PublicationAuthor> {
        if repo.get_publication(&self.publication_id)?.is_none() {
            return Err(ComplianceError::NotFound(format!(
                "Publication {}",
                self.publication_id
            )));
        }
        let scientist = repo
            .get_scientist(&self.scientist_id)?
            .ok_or_else(|| ComplianceError::NotFound(format!("Scientist {}", self.scientist_id)))?;

        let authors = repo.list_authors(&self.publication_id)?;
        if authors.iter().any(|a| a.scientist_id == scientist.id) {
            return Err(ComplianceError::Conflict(format!(
                "{} is already an author of this publication",
                scientist.display_name()
            )));
        }

        let position = match self.author_position {
            Some(0) => {
                return Err(ComplianceError::Validation(vec![
                    compliance_domain::ValidationIssue::error(
                        "authorPosition",
                        "Author positions start at 1",
                    ),
                ]))
            }
            Some(p) => p,
            None => authors.iter().map(|a| a.author_position).max().unwrap_or(0) + 1,
        };
        if authors.iter().any(|a| a.author_position == position) {
            return Err(ComplianceError::Conflict(format!(
                "Author position {} is already taken",
                position
            )));
        }

        let author = PublicationAuthor {
            publication_id: self.publication_id,
            scientist_id: scientist.id,
            authorship: self.authorship,
            author_position: position,
        };
        repo.insert_author(&author)?;
        tracing::debug!(
            publication = %author.publication_id,
            scientist = %author.scientist_id,
            position,
            authorship = %author.authorship,
            "Author added"
        );
        Ok(author)
    }
}

#[derive(Debug, Clone)]
pub struct RemovePublicationAuthor {
    pub publication_id: String,
    pub scientist_id: String,
}

impl Command for RemovePublicationAuthor {
    type Output = ();

    fn execute(self, repo: &Repository) -> Result<()> {
        if !repo.delete_author(&self.publication_id, &self.scientist_id)? {
            return Err(ComplianceError::NotFound(format!(
                "Author {} on publication {}",
                self.scientist_id, self.publication_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkflowError;
    use compliance_domain::{AuthorRole, Scientist};

    fn setup() -> (Repository, Publication) {
        let repo = Repository::in_memory().unwrap();
        let publication = CreatePublication {
            publication: Publication::new("Prion folding kinetics"),
        }
        .execute(&repo)
        .unwrap();
        (repo, publication)
    }

    fn change(id: &str, to: PublicationStatus, fields: &[(&str, &str)]) -> ChangePublicationStatus {
        ChangePublicationStatus {
            publication_id: id.to_string(),
            to,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            changed_by: Some("editor".into()),
        }
    }

    #[test]
    fn test_complete_draft_records_history() {
        let (repo, p) = setup();
        let result = change(&p.id, PublicationStatus::CompleteDraft, &[("authors", "Ada, Grace")])
            .execute(&repo)
            .unwrap();

        assert_eq!(result.publication.status, PublicationStatus::CompleteDraft);
        assert_eq!(result.history.len(), 2);
        assert_eq!(result.history[0].changed_field, STATUS_FIELD);
        assert_eq!(result.history[1].changed_field, "authors");
        assert_eq!(result.history[1].old_value, None);
        assert_eq!(result.history[1].new_value.as_deref(), Some("Ada, Grace"));
        assert_eq!(repo.history_for(&p.id).unwrap().len(), 2);
    }

    #[test]
    fn test_create_with_existing_id_conflicts() {
        let (repo, p) = setup();
        change(&p.id, PublicationStatus::CompleteDraft, &[("authors", "Ada")])
            .execute(&repo)
            .unwrap();

        let err = CreatePublication {
            publication: Publication {
                id: p.id.clone(),
                ..Publication::new("Reset")
            },
        }
        .execute(&repo)
        .unwrap_err();
        assert!(matches!(err, ComplianceError::Conflict(_)));

        let stored = repo.get_publication(&p.id).unwrap().unwrap();
        assert_eq!(stored.status, PublicationStatus::CompleteDraft);
        assert_eq!(stored.authors.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_missing_fields_write_nothing() {
        let (repo, p) = setup();
        let err = change(&p.id, PublicationStatus::CompleteDraft, &[])
            .execute(&repo)
            .unwrap_err();
        assert!(matches!(
            err,
            ComplianceError::Workflow(WorkflowError::MissingFields { .. })
        ));
        assert!(repo.history_for(&p.id).unwrap().is_empty());
        assert_eq!(
            repo.get_publication(&p.id).unwrap().unwrap().status,
            PublicationStatus::Concept
        );
    }

    #[test]
    fn test_bad_doi_rejected_before_write() {
        let (repo, mut p) = setup();
        p.status = PublicationStatus::AcceptedInPress;
        p.journal = Some("Nature".into());
        repo.save_publication(&p).unwrap();

        let err = change(
            &p.id,
            PublicationStatus::Published,
            &[("publicationDate", "2024-05-01"), ("doi", "not-a-doi")],
        )
        .execute(&repo)
        .unwrap_err();
        assert!(matches!(err, ComplianceError::Validation(_)));
        assert!(repo.history_for(&p.id).unwrap().is_empty());
    }

    #[test]
    fn test_author_positions() {
        let (repo, p) = setup();
        let a = Scientist::new("Ada", "Lovelace");
        let b = Scientist::new("Grace", "Hopper");
        repo.save_scientist(&a).unwrap();
        repo.save_scientist(&b).unwrap();

        let add = |s: &Scientist, pos: Option<u32>| AddPublicationAuthor {
            publication_id: p.id.clone(),
            scientist_id: s.id.clone(),
            authorship: AuthorshipRole::new(AuthorRole::FirstAuthor),
            author_position: pos,
        };

        assert_eq!(add(&a, None).execute(&repo).unwrap().author_position, 1);
        assert!(matches!(
            add(&b, Some(1)).execute(&repo),
            Err(ComplianceError::Conflict(_))
        ));
        assert_eq!(add(&b, None).execute(&repo).unwrap().author_position, 2);
        assert!(matches!(
            add(&a, None).execute(&repo),
            Err(ComplianceError::Conflict(_))
        ));

        RemovePublicationAuthor {
            publication_id: p.id.clone(),
            scientist_id: a.id.clone(),
        }
        .execute(&repo)
        .unwrap();
        assert_eq!(repo.list_authors(&p.id).unwrap().len(), 1);
    }
}
