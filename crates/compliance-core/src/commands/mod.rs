//! Guarded mutations over the repository
//!
//! Every command checks its rules before the first write, so a rejected
//! command leaves the database untouched.

mod certificates;
mod facility;
mod ibc;
mod publication;
mod records;
mod team;

pub use certificates::{ConfirmCertificateBatch, ProcessCertificateBatch};
pub use facility::{SaveBuilding, SaveRoom};
pub use ibc::{AddIbcPersonnel, CreateIbcApplication, SaveBoardMember, TransitionIbcApplication};
pub use publication::{
    AddPublicationAuthor, ChangePublicationStatus, CreatePublication, RemovePublicationAuthor,
    StatusChange,
};
pub use records::{SaveCertificationModule, SaveResearchActivity, SaveScientist};
pub use team::{role_options_for, AddTeamMember, RemoveTeamMember};

use compliance_domain::{has_errors, ValidationIssue, ValidationSeverity};

use crate::error::{ComplianceError, Result};
use crate::persistence::Repository;

/// A mutation executed against the repository
pub trait Command {
    type Output;

    /// Validate, then write
    fn execute(self, repo: &Repository) -> Result<Self::Output>;
}

/// Fail with the error-level issues, if there are any
pub(crate) fn ensure_valid(issues: Vec<ValidationIssue>) -> Result<()> {
    if !has_errors(&issues) {
        return Ok(());
    }
    Err(ComplianceError::Validation(
        issues
            .into_iter()
            .filter(|i| i.severity == ValidationSeverity::Error)
            .collect(),
    ))
}
