//! Research activity team commands

use compliance_domain::{ProjectMember, TeamRole};
use serde::{Deserialize, Serialize};

use super::Command;
use crate::error::{ComplianceError, Result};
use crate::persistence::Repository;
use crate::team::{check_new_member, role_options, RoleOptions};

fn scientist_name(repo: &Repository, id: &str) -> Option<String> {
    repo.get_scientist(id).ok().flatten().map(|s| s.display_name())
}

fn require_activity(repo: &Repository, id: &str) -> Result<()> {
    match repo.get_research_activity(id)? {
        Some(_) => Ok(()),
        None => Err(ComplianceError::NotFound(format!("Research activity {}", id))),
    }
}

/// Roles the add-member dialog should offer `scientist_id` on this team
pub fn role_options_for(
    repo: &Repository,
    research_activity_id: &str,
    scientist_id: &str,
) -> Result<RoleOptions> {
    require_activity(repo, research_activity_id)?;
    let candidate = repo
        .get_scientist(scientist_id)?
        .ok_or_else(|| ComplianceError::NotFound(format!("Scientist {}", scientist_id)))?;
    let members = repo.list_members(research_activity_id)?;
    Ok(role_options(&members, &candidate, |id| scientist_name(repo, id)))
}

/// Add a scientist to a team, enforcing the single PI / single Lead rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTeamMember {
    #[serde(default)]
    pub research_activity_id: String,
    pub scientist_id: String,
    pub role: TeamRole,
}

impl Command for AddTeamMember {
    type Output = ProjectMember;

    fn execute(self, repo: &Repository) -> Result<ProjectMember> {
        require_activity(repo, &self.research_activity_id)?;
        let candidate = repo
            .get_scientist(&self.scientist_id)?
            .ok_or_else(|| ComplianceError::NotFound(format!("Scientist {}", self.scientist_id)))?;

        let members = repo.list_members(&self.research_activity_id)?;
        check_new_member(&members, &candidate, self.role, |id| scientist_name(repo, id))?;

        let member = ProjectMember::new(self.research_activity_id, candidate.id, self.role);
        repo.insert_member(&member)?;
        tracing::info!(
            activity = %member.research_activity_id,
            scientist = %member.scientist_id,
            role = %member.role,
            "Team member added"
        );
        Ok(member)
    }
}

#[derive(Debug, Clone)]
pub struct RemoveTeamMember {
    pub research_activity_id: String,
    pub member_id: String,
}

impl Command for RemoveTeamMember {
    type Output = ();

    fn execute(self, repo: &Repository) -> Result<()> {
        if !repo.delete_member(&self.research_activity_id, &self.member_id)? {
            return Err(ComplianceError::NotFound(format!(
                "Member {} on research activity {}",
                self.member_id, self.research_activity_id
            )));
        }
        tracing::info!(activity = %self.research_activity_id, member = %self.member_id, "Team member removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TeamError;
    use compliance_domain::{ResearchActivity, Scientist};

    fn setup() -> (Repository, ResearchActivity) {
        let repo = Repository::in_memory().unwrap();
        let ra = ResearchActivity::new("SDR-0042", "Vector design");
        repo.save_research_activity(&ra).unwrap();
        (repo, ra)
    }

    fn add(ra: &ResearchActivity, s: &Scientist, role: TeamRole) -> AddTeamMember {
        AddTeamMember {
            research_activity_id: ra.id.clone(),
            scientist_id: s.id.clone(),
            role,
        }
    }

    #[test]
    fn test_single_pi_enforced_against_stored_team() {
        let (repo, ra) = setup();
        let first = Scientist::new("Rosalind", "Franklin").with_job_title("Investigator");
        let second = Scientist::new("Barbara", "McClintock").with_job_title("Investigator");
        repo.save_scientist(&first).unwrap();
        repo.save_scientist(&second).unwrap();

        add(&ra, &first, TeamRole::PrincipalInvestigator)
            .execute(&repo)
            .unwrap();
        let err = add(&ra, &second, TeamRole::PrincipalInvestigator)
            .execute(&repo)
            .unwrap_err();
        match err {
            ComplianceError::Team(TeamError::RoleAlreadyFilled { holder, .. }) => {
                assert_eq!(holder, "Rosalind Franklin")
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(repo.list_members(&ra.id).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_then_reassign() {
        let (repo, ra) = setup();
        let lead = Scientist::new("Max", "Perutz");
        let next = Scientist::new("John", "Kendrew");
        repo.save_scientist(&lead).unwrap();
        repo.save_scientist(&next).unwrap();

        let member = add(&ra, &lead, TeamRole::LeadScientist).execute(&repo).unwrap();
        RemoveTeamMember {
            research_activity_id: ra.id.clone(),
            member_id: member.id,
        }
        .execute(&repo)
        .unwrap();
        assert!(add(&ra, &next, TeamRole::LeadScientist).execute(&repo).is_ok());
    }

    #[test]
    fn test_role_options_for_non_investigator() {
        let (repo, ra) = setup();
        let s = Scientist::new("Max", "Perutz").with_job_title("Senior Investigator");
        repo.save_scientist(&s).unwrap();
        let opts = role_options_for(&repo, &ra.id, &s.id).unwrap();
        assert!(!opts.is_offered(TeamRole::PrincipalInvestigator));
        assert!(opts.is_selectable(TeamRole::TeamMember));
    }

    #[test]
    fn test_unknown_activity() {
        let repo = Repository::in_memory().unwrap();
        let s = Scientist::new("Max", "Perutz");
        repo.save_scientist(&s).unwrap();
        let err = AddTeamMember {
            research_activity_id: "missing".into(),
            scientist_id: s.id.clone(),
            role: TeamRole::TeamMember,
        }
        .execute(&repo)
        .unwrap_err();
        assert!(matches!(err, ComplianceError::NotFound(_)));
    }
}
