//! API error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use compliance_core::{ComplianceError, ImportError, WorkflowError};
use compliance_domain::ValidationIssue;
use thiserror::Error;

/// Error returned by every handler.
///
/// The body is `{"error": kind, "message": text, "details": [...]}` so clients
/// can tell rule rejections apart from backend failures.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A local rule rejected the request; nothing was written
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<ValidationIssue>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal",
        }
    }

    fn validation(err: impl ToString, details: Vec<ValidationIssue>) -> Self {
        Self::Validation {
            message: err.to_string(),
            details,
        }
    }
}

impl From<ComplianceError> for ApiError {
    fn from(err: ComplianceError) -> Self {
        match err {
            ComplianceError::Validation(issues) => {
                let message = ComplianceError::Validation(issues.clone()).to_string();
                Self::validation(message, issues)
            }
            ComplianceError::Workflow(WorkflowError::MissingFields { to, fields }) => {
                let details = fields
                    .iter()
                    .map(|f| ValidationIssue::error(f.clone(), format!("Required for {}", to)))
                    .collect();
                Self::validation(WorkflowError::MissingFields { to, fields }, details)
            }
            ComplianceError::Workflow(e) => Self::validation(e, Vec::new()),
            ComplianceError::Team(e) => Self::validation(e, Vec::new()),
            ComplianceError::Parse(e) => Self::validation(e, Vec::new()),
            ComplianceError::Import(ImportError::EmptyBatch) => {
                Self::BadRequest(ImportError::EmptyBatch.to_string())
            }
            ComplianceError::Import(e) => Self::validation(e, Vec::new()),
            ComplianceError::NotFound(what) => Self::NotFound(format!("{} not found", what)),
            ComplianceError::Conflict(msg) => Self::Conflict(msg),
            ComplianceError::Persistence(e) => {
                tracing::error!(error = %e, "Persistence failure");
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("Invalid body: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            Self::Validation { details, .. } => details.clone(),
            _ => Vec::new(),
        };
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
            "details": details,
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliance_core::TeamError;
    use compliance_domain::TeamRole;

    #[test]
    fn test_status_codes() {
        let err: ApiError = ComplianceError::NotFound("Scientist x".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Scientist x not found");

        let err: ApiError = ComplianceError::Team(TeamError::AlreadyMember("Ada".into())).into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.kind(), "validation");

        let err: ApiError = ComplianceError::Import(ImportError::EmptyBatch).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ApiError::Conflict("taken".into());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_missing_fields_become_details() {
        let err: ApiError = ComplianceError::Workflow(WorkflowError::MissingFields {
            to: "Published".into(),
            fields: vec!["publicationDate".into(), "doi".into()],
        })
        .into();
        match err {
            ApiError::Validation { details, message } => {
                assert_eq!(details.len(), 2);
                assert_eq!(details[1].field, "doi");
                assert!(message.contains("publicationDate"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_role_filled_keeps_message() {
        let err: ApiError = ComplianceError::Team(TeamError::RoleAlreadyFilled {
            role: TeamRole::LeadScientist,
            holder: "Max Perutz".into(),
        })
        .into();
        assert!(err.to_string().contains("Max Perutz"));
    }
}
