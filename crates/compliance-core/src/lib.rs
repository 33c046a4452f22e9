//! Compliance Core - rules and storage for research compliance tracking
//!
//! This crate provides the core functionality behind the compliance service:
//!
//! - **Workflow**: Typed transition tables with required fields and guards
//!   (IBC review: Draft→Submitted→Vetted→UnderReview→Active→Expired;
//!   publications: Concept→…→Published)
//! - **Team**: Single Principal Investigator / single Lead Scientist rule and
//!   the Investigator-title eligibility check
//! - **Certification**: Status derivation from end dates and the scientist × module matrix
//! - **Import**: CITI certificate text parsing and matching
//! - **Commands**: Validated mutations over the repository
//! - **Persistence**: SQLite storage with an append-only manuscript history
//! - **Config**: Server address, database location and the expiring window
//!
//! # Architecture
//!
//! Rules are pure functions over domain records; commands load what a rule
//! needs from the [`Repository`], check it, and only then write:
//!
//! ```text
//! request → Command::execute → rule check → Repository write
//! ```

pub mod certification;
pub mod commands;
pub mod config;
pub mod error;
pub mod import;
pub mod persistence;
pub mod team;
pub mod workflow;

pub use certification::{
    certification_status, certification_status_with_window, CertificationMatrix, MatrixCell,
    MatrixRow, ModuleHeader, StatusCounts,
};
pub use commands::Command;
pub use config::{CertificationConfig, ComplianceConfig, ConfigError, DatabaseConfig, ServerConfig};
pub use error::{ComplianceError, ImportError, PersistenceError, Result, TeamError, WorkflowError};
pub use import::{parse_citi_text, BatchFile, CertificateCandidate, ParsedCertificate};
pub use persistence::{Repository, Schema};
pub use team::{check_new_member, role_options, RoleOption, RoleOptions};
pub use workflow::{
    ibc_workflow, publication_workflow, FieldChange, Guard, Transition, TransitionInput,
    TransitionOption, Workflow, WorkflowState,
};

/// Returns the version of compliance-core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_repository_opens() {
        let repo = Repository::in_memory().unwrap();
        assert!(repo.list_scientists().unwrap().is_empty());
    }
}
