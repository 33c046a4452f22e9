//! Research compliance domain types
//!
//! This crate provides the canonical records shared by the compliance core and server:
//! - Scientist: staff member with job title and department
//! - ResearchActivity / ProjectMember: SDR records and their team composition
//! - IbcApplication, IbcBoardMember: biosafety protocol review
//! - Publication, PublicationAuthor, ManuscriptHistory: authorship tracking and audit trail
//! - Building, Room: facilities
//! - Certificate, CertificationModule: CITI training records
//!
//! Records are plain data. Workflow rules live in `compliance-core`.

pub mod authorship;
pub mod certification;
pub mod facility;
pub mod ibc;
pub mod publication;
pub mod research_activity;
pub mod scientist;
pub mod validation;

pub use authorship::*;
pub use certification::*;
pub use facility::*;
pub use ibc::*;
pub use publication::*;
pub use research_activity::*;
pub use scientist::*;
pub use validation::*;

/// Error returned when a stored or submitted label does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseLabelError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseLabelError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Generate a fresh record identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
