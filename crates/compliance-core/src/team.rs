//! Team composition rules for research activities
//!
//! A team has at most one Principal Investigator and at most one Lead
//! Scientist. Only scientists whose job title is exactly "Investigator" may
//! be Principal Investigator.

use compliance_domain::{ProjectMember, Scientist, TeamRole, INVESTIGATOR_TITLE};
use serde::Serialize;

use crate::error::TeamError;

/// A role as offered in the add-member dialog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleOption {
    pub role: TeamRole,
    pub enabled: bool,
    pub note: Option<String>,
}

/// Roles offered to one candidate, plus notes for roles withheld entirely
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleOptions {
    pub options: Vec<RoleOption>,
    pub notes: Vec<String>,
}

impl RoleOptions {
    pub fn is_selectable(&self, role: TeamRole) -> bool {
        self.options.iter().any(|o| o.role == role && o.enabled)
    }

    pub fn is_offered(&self, role: TeamRole) -> bool {
        self.options.iter().any(|o| o.role == role)
    }
}

/// Member currently holding `role`, if any
pub fn holder_of(members: &[ProjectMember], role: TeamRole) -> Option<&ProjectMember> {
    members.iter().find(|m| m.role == role)
}

fn ineligibility_note(candidate: &Scientist) -> String {
    format!(
        "{} cannot be Principal Investigator: the role requires the job title \"{}\" (current: {})",
        candidate.display_name(),
        INVESTIGATOR_TITLE,
        candidate.job_title.as_deref().unwrap_or("none"),
    )
}

/// Compute which roles `candidate` may be given on a team with `members`.
///
/// `name_of` resolves a scientist id to a display name for notes.
pub fn role_options<F>(members: &[ProjectMember], candidate: &Scientist, name_of: F) -> RoleOptions
where
    F: Fn(&str) -> Option<String>,
{
    let mut options = Vec::new();
    let mut notes = Vec::new();

    for role in TeamRole::ALL {
        if role == TeamRole::PrincipalInvestigator && !candidate.is_investigator() {
            notes.push(ineligibility_note(candidate));
            continue;
        }

        let held = if role.is_exclusive() {
            holder_of(members, role)
        } else {
            None
        };

        match held {
            Some(holder) => {
                let name = name_of(&holder.scientist_id).unwrap_or_else(|| holder.scientist_id.clone());
                options.push(RoleOption {
                    role,
                    enabled: false,
                    note: Some(format!("Already assigned to {}", name)),
                });
            }
            None => options.push(RoleOption {
                role,
                enabled: true,
                note: None,
            }),
        }
    }

    RoleOptions { options, notes }
}

/// Reject adding `candidate` as `role` if it would break a team rule
pub fn check_new_member<F>(
    members: &[ProjectMember],
    candidate: &Scientist,
    role: TeamRole,
    name_of: F,
) -> Result<(), TeamError>
where
    F: Fn(&str) -> Option<String>,
{
    if role == TeamRole::PrincipalInvestigator && !candidate.is_investigator() {
        return Err(TeamError::IneligibleForRole {
            scientist: candidate.display_name(),
            role,
            job_title: candidate.job_title.clone(),
        });
    }

    if role.is_exclusive() {
        if let Some(holder) = holder_of(members, role) {
            return Err(TeamError::RoleAlreadyFilled {
                role,
                holder: name_of(&holder.scientist_id).unwrap_or_else(|| holder.scientist_id.clone()),
            });
        }
    }

    if members.iter().any(|m| m.scientist_id == candidate.id) {
        return Err(TeamError::AlreadyMember(candidate.display_name()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_names(_: &str) -> Option<String> {
        None
    }

    fn investigator() -> Scientist {
        Scientist::new("Rosalind", "Franklin").with_job_title("Investigator")
    }

    #[test]
    fn test_second_pi_rejected() {
        let existing = investigator();
        let members = vec![ProjectMember::new("ra1", existing.id.clone(), TeamRole::PrincipalInvestigator)];
        let err = check_new_member(&members, &investigator(), TeamRole::PrincipalInvestigator, |_| {
            Some("Rosalind Franklin".to_string())
        })
        .unwrap_err();
        assert_eq!(
            err,
            TeamError::RoleAlreadyFilled {
                role: TeamRole::PrincipalInvestigator,
                holder: "Rosalind Franklin".into()
            }
        );
    }

    #[test]
    fn test_second_lead_rejected() {
        let members = vec![ProjectMember::new("ra1", "s-lead", TeamRole::LeadScientist)];
        let candidate = Scientist::new("Max", "Perutz");
        assert!(matches!(
            check_new_member(&members, &candidate, TeamRole::LeadScientist, no_names),
            Err(TeamError::RoleAlreadyFilled { .. })
        ));
        assert!(check_new_member(&members, &candidate, TeamRole::TeamMember, no_names).is_ok());
    }

    #[test]
    fn test_pi_requires_investigator_title() {
        let candidate = Scientist::new("Max", "Perutz").with_job_title("Research Fellow");
        assert!(matches!(
            check_new_member(&[], &candidate, TeamRole::PrincipalInvestigator, no_names),
            Err(TeamError::IneligibleForRole { .. })
        ));
        assert!(check_new_member(&[], &investigator(), TeamRole::PrincipalInvestigator, no_names).is_ok());
    }

    #[test]
    fn test_duplicate_member_rejected() {
        let s = Scientist::new("Max", "Perutz");
        let members = vec![ProjectMember::new("ra1", s.id.clone(), TeamRole::TeamMember)];
        assert_eq!(
            check_new_member(&members, &s, TeamRole::TeamMember, no_names),
            Err(TeamError::AlreadyMember("Max Perutz".into()))
        );
    }

    #[test]
    fn test_pi_option_hidden_for_non_investigator() {
        let candidate = Scientist::new("Max", "Perutz").with_job_title("Lab Manager");
        let opts = role_options(&[], &candidate, no_names);
        assert!(!opts.is_offered(TeamRole::PrincipalInvestigator));
        assert_eq!(opts.notes.len(), 1);
        assert!(opts.is_selectable(TeamRole::LeadScientist));
    }

    #[test]
    fn test_held_role_disabled_with_note() {
        let members = vec![ProjectMember::new("ra1", "s-pi", TeamRole::PrincipalInvestigator)];
        let opts = role_options(&members, &investigator(), |_| Some("Dr. Crick".into()));
        let pi = opts
            .options
            .iter()
            .find(|o| o.role == TeamRole::PrincipalInvestigator)
            .unwrap();
        assert!(!pi.enabled);
        assert_eq!(pi.note.as_deref(), Some("Already assigned to Dr. Crick"));
        assert!(opts.is_selectable(TeamRole::TeamMember));
    }
}
