//! Plain record saves that only need field validation

use compliance_domain::{
    validate_scientist, CertificationModule, ResearchActivity, Scientist, ValidationIssue,
};

use super::{ensure_valid, Command};
use crate::error::{ComplianceError, Result};
use crate::persistence::Repository;

#[derive(Debug, Clone)]
pub struct SaveScientist {
    pub scientist: Scientist,
}

impl Command for SaveScientist {
    type Output = Scientist;

    fn execute(self, repo: &Repository) -> Result<Scientist> {
        ensure_valid(validate_scientist(&self.scientist))?;
        repo.save_scientist(&self.scientist)?;
        tracing::debug!(scientist = %self.scientist.id, "Scientist saved");
        Ok(self.scientist)
    }
}

/// Create or update a research activity. SDR numbers are unique.
#[derive(Debug, Clone)]
pub struct SaveResearchActivity {
    pub activity: ResearchActivity,
}

impl Command for SaveResearchActivity {
    type Output = ResearchActivity;

    fn execute(self, repo: &Repository) -> Result<ResearchActivity> {
        let mut issues = Vec::new();
        if self.activity.sdr_number.trim().is_empty() {
            issues.push(ValidationIssue::error("sdrNumber", "SDR number is required"));
        }
        if self.activity.title.trim().is_empty() {
            issues.push(ValidationIssue::error("title", "Title is required"));
        }
        ensure_valid(issues)?;

        let taken = repo
            .list_research_activities()?
            .into_iter()
            .any(|ra| ra.id != self.activity.id && ra.sdr_number == self.activity.sdr_number);
        if taken {
            return Err(ComplianceError::Conflict(format!(
                "SDR number {} is already in use",
                self.activity.sdr_number
            )));
        }

        repo.save_research_activity(&self.activity)?;
        Ok(self.activity)
    }
}

#[derive(Debug, Clone)]
pub struct SaveCertificationModule {
    pub module: CertificationModule,
}

impl Command for SaveCertificationModule {
    type Output = CertificationModule;

    fn execute(self, repo: &Repository) -> Result<CertificationModule> {
        let mut issues = Vec::new();
        if self.module.name.trim().is_empty() {
            issues.push(ValidationIssue::error("name", "Module name is required"));
        }
        if self.module.validity_months == Some(0) {
            issues.push(ValidationIssue::error(
                "validityMonths",
                "Validity must be at least one month",
            ));
        }
        ensure_valid(issues)?;
        repo.save_module(&self.module)?;
        Ok(self.module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_sdr_conflicts() {
        let repo = Repository::in_memory().unwrap();
        SaveResearchActivity {
            activity: ResearchActivity::new("SDR-1", "First"),
        }
        .execute(&repo)
        .unwrap();
        let err = SaveResearchActivity {
            activity: ResearchActivity::new("SDR-1", "Second"),
        }
        .execute(&repo)
        .unwrap_err();
        assert!(matches!(err, ComplianceError::Conflict(_)));
    }

    #[test]
    fn test_invalid_scientist_not_saved() {
        let repo = Repository::in_memory().unwrap();
        assert!(SaveScientist {
            scientist: Scientist::default(),
        }
        .execute(&repo)
        .is_err());
        assert!(repo.list_scientists().unwrap().is_empty());
    }

    #[test]
    fn test_zero_validity_rejected() {
        let repo = Repository::in_memory().unwrap();
        let mut module = CertificationModule::new("Biosafety");
        module.validity_months = Some(0);
        assert!(SaveCertificationModule { module }.execute(&repo).is_err());
    }
}
