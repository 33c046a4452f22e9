//! Research activities (SDR records) and their team members

use serde::{Deserialize, Serialize};

use crate::ParseLabelError;

/// A research activity, identified internally by its SDR number
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResearchActivity {
    pub id: String,
    pub sdr_number: String,
    pub title: String,
    pub status: Option<String>,
    pub budget_source: Option<String>,
}

impl ResearchActivity {
    pub fn new(sdr_number: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: crate::new_id(),
            sdr_number: sdr_number.into(),
            title: title.into(),
            status: None,
            budget_source: None,
        }
    }
}

/// Role a scientist holds on a research activity team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamRole {
    #[serde(rename = "Principal Investigator")]
    PrincipalInvestigator,
    #[serde(rename = "Lead Scientist")]
    LeadScientist,
    #[serde(rename = "Team Member")]
    TeamMember,
}

impl TeamRole {
    /// Every role, in the order an add-member dialog lists them
    pub const ALL: [TeamRole; 3] = [
        TeamRole::PrincipalInvestigator,
        TeamRole::LeadScientist,
        TeamRole::TeamMember,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TeamRole::PrincipalInvestigator => "Principal Investigator",
            TeamRole::LeadScientist => "Lead Scientist",
            TeamRole::TeamMember => "Team Member",
        }
    }

    /// Roles that at most one member of a team may hold
    pub fn is_exclusive(&self) -> bool {
        matches!(self, TeamRole::PrincipalInvestigator | TeamRole::LeadScientist)
    }
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TeamRole {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TeamRole::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseLabelError::new("team role", s))
    }
}

/// Membership of a scientist on a research activity team
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: String,
    pub research_activity_id: String,
    pub scientist_id: String,
    pub role: TeamRole,
}

impl ProjectMember {
    pub fn new(
        research_activity_id: impl Into<String>,
        scientist_id: impl Into<String>,
        role: TeamRole,
    ) -> Self {
        Self {
            id: crate::new_id(),
            research_activity_id: research_activity_id.into(),
            scientist_id: scientist_id.into(),
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_role_labels_round_trip_through_serde() {
        let json = serde_json::to_string(&TeamRole::PrincipalInvestigator).unwrap();
        assert_eq!(json, "\"Principal Investigator\"");
        let parsed: TeamRole = serde_json::from_str("\"Lead Scientist\"").unwrap();
        assert_eq!(parsed, TeamRole::LeadScientist);
    }

    #[test]
    fn test_team_role_from_str() {
        assert_eq!("team member".parse::<TeamRole>().unwrap(), TeamRole::TeamMember);
        assert!("Chair".parse::<TeamRole>().is_err());
    }

    #[test]
    fn test_exclusive_roles() {
        assert!(TeamRole::PrincipalInvestigator.is_exclusive());
        assert!(TeamRole::LeadScientist.is_exclusive());
        assert!(!TeamRole::TeamMember.is_exclusive());
    }
}
