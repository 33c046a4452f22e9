//! Error types for compliance-core

use compliance_domain::{ParseLabelError, TeamRole, ValidationIssue};
use thiserror::Error;

/// Result type alias for compliance operations
pub type Result<T> = std::result::Result<T, ComplianceError>;

/// Main error type for compliance operations
#[derive(Error, Debug)]
pub enum ComplianceError {
    /// Status transition rejected by a workflow table
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Team composition rule violated
    #[error("Team error: {0}")]
    Team(#[from] TeamError),

    /// Persistence-related errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Certificate import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Record failed field validation
    #[error("Validation failed: {}", join_issues(.0))]
    Validation(Vec<ValidationIssue>),

    /// Submitted label did not parse
    #[error("{0}")]
    Parse(#[from] ParseLabelError),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write would clash with an existing record
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl ComplianceError {
    /// True for rejections raised by local rules before anything is written
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ComplianceError::Workflow(_)
                | ComplianceError::Team(_)
                | ComplianceError::Validation(_)
                | ComplianceError::Parse(_)
        )
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Workflow transition errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Target status is not reachable from the current one
    #[error("{workflow}: cannot move from {from} to {to}")]
    InvalidTransition {
        workflow: &'static str,
        from: String,
        to: String,
    },

    /// Fields the target status needs were not provided
    #[error("Moving to {to} requires: {}", .fields.join(", "))]
    MissingFields { to: String, fields: Vec<String> },

    /// A guard on the transition was not satisfied
    #[error("Moving to {to}: {message}")]
    GuardFailed { to: String, message: String },

    /// Field name not recognised for this record
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Field value could not be applied
    #[error("Invalid value for {field}: {message}")]
    InvalidFieldValue { field: String, message: String },
}

/// Team composition errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TeamError {
    /// Exclusive role already held by another member
    #[error("This team already has a {role} ({holder}); remove them before assigning a new one")]
    RoleAlreadyFilled { role: TeamRole, holder: String },

    /// Scientist's job title does not allow the role
    #[error("{scientist} cannot be {role}: only scientists with the job title \"Investigator\" are eligible (current title: {})", .job_title.as_deref().unwrap_or("none"))]
    IneligibleForRole {
        scientist: String,
        role: TeamRole,
        job_title: Option<String>,
    },

    /// Scientist is already on the team
    #[error("{0} is already a member of this team")]
    AlreadyMember(String),
}

/// Persistence-specific errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

/// Certificate import errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// Text did not look like a completion certificate
    #[error("{file}: not a recognisable completion certificate")]
    Unrecognized { file: String },

    /// Batch had nothing in it
    #[error("Batch contains no files")]
    EmptyBatch,
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(err: rusqlite::Error) -> Self {
        PersistenceError::Database(err.to_string())
    }
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

impl From<rusqlite::Error> for ComplianceError {
    fn from(err: rusqlite::Error) -> Self {
        ComplianceError::Persistence(PersistenceError::Database(err.to_string()))
    }
}

impl From<serde_json::Error> for ComplianceError {
    fn from(err: serde_json::Error) -> Self {
        ComplianceError::Persistence(PersistenceError::Serialization(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_message_lists_all() {
        let err = WorkflowError::MissingFields {
            to: "Published".into(),
            fields: vec!["publicationDate".into(), "doi".into()],
        };
        assert_eq!(err.to_string(), "Moving to Published requires: publicationDate, doi");
    }

    #[test]
    fn test_role_filled_message_names_holder() {
        let err = TeamError::RoleAlreadyFilled {
            role: TeamRole::PrincipalInvestigator,
            holder: "Ada Lovelace".into(),
        };
        assert!(err.to_string().contains("Principal Investigator"));
        assert!(err.to_string().contains("Ada Lovelace"));
    }

    #[test]
    fn test_validation_kinds() {
        let err: ComplianceError = TeamError::AlreadyMember("x".into()).into();
        assert!(err.is_validation());
        assert!(!ComplianceError::NotFound("x".into()).is_validation());
    }
}
