//! Institutional Biosafety Committee applications and board
//!
//! Status flow (enforced in `compliance-core::workflow::ibc`):
//! ```text
//! Draft ⇄ Submitted ⇄ Vetted ⇄ UnderReview → Active → Expired
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ParseLabelError;

/// Review status of an IBC application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IbcStatus {
    Draft,
    Submitted,
    Vetted,
    UnderReview,
    Active,
    Expired,
}

impl IbcStatus {
    pub const ALL: [IbcStatus; 6] = [
        IbcStatus::Draft,
        IbcStatus::Submitted,
        IbcStatus::Vetted,
        IbcStatus::UnderReview,
        IbcStatus::Active,
        IbcStatus::Expired,
    ];

    /// Wire value, as stored and sent over the API
    pub fn as_str(&self) -> &'static str {
        match self {
            IbcStatus::Draft => "draft",
            IbcStatus::Submitted => "submitted",
            IbcStatus::Vetted => "vetted",
            IbcStatus::UnderReview => "under_review",
            IbcStatus::Active => "active",
            IbcStatus::Expired => "expired",
        }
    }

    /// Badge text
    pub fn label(&self) -> &'static str {
        match self {
            IbcStatus::Draft => "Draft",
            IbcStatus::Submitted => "Submitted",
            IbcStatus::Vetted => "Vetted",
            IbcStatus::UnderReview => "Under Review",
            IbcStatus::Active => "Active",
            IbcStatus::Expired => "Expired",
        }
    }
}

impl Default for IbcStatus {
    fn default() -> Self {
        IbcStatus::Draft
    }
}

impl std::fmt::Display for IbcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IbcStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IbcStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| ParseLabelError::new("IBC status", s))
    }
}

/// Containment level requested for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiosafetyLevel {
    #[serde(rename = "BSL-1")]
    Bsl1,
    #[serde(rename = "BSL-2")]
    Bsl2,
    #[serde(rename = "BSL-3")]
    Bsl3,
    #[serde(rename = "BSL-4")]
    Bsl4,
}

impl BiosafetyLevel {
    pub const ALL: [BiosafetyLevel; 4] = [
        BiosafetyLevel::Bsl1,
        BiosafetyLevel::Bsl2,
        BiosafetyLevel::Bsl3,
        BiosafetyLevel::Bsl4,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BiosafetyLevel::Bsl1 => "BSL-1",
            BiosafetyLevel::Bsl2 => "BSL-2",
            BiosafetyLevel::Bsl3 => "BSL-3",
            BiosafetyLevel::Bsl4 => "BSL-4",
        }
    }
}

impl std::fmt::Display for BiosafetyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BiosafetyLevel {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BiosafetyLevel::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseLabelError::new("biosafety level", s))
    }
}

/// Risk questions answered on the application form
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskFlags {
    pub recombinant_dna: bool,
    pub human_materials: bool,
    pub animal_work: bool,
    pub select_agents: bool,
    pub toxins: bool,
    pub gene_transfer: bool,
}

impl RiskFlags {
    pub fn any(&self) -> bool {
        self.recombinant_dna
            || self.human_materials
            || self.animal_work
            || self.select_agents
            || self.toxins
            || self.gene_transfer
    }
}

/// A comment left by a reviewer or office staff during review
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub comment: String,
    pub timestamp: DateTime<Utc>,
    pub user: String,
}

/// Progress of a single reviewer on an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewerStatus {
    Assigned,
    InProgress,
    Completed,
}

impl Default for ReviewerStatus {
    fn default() -> Self {
        ReviewerStatus::Assigned
    }
}

/// A board member assigned to review an application
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerAssignment {
    pub reviewer_id: String,
    pub status: ReviewerStatus,
    pub assigned_date: DateTime<Utc>,
}

impl ReviewerAssignment {
    /// A freshly assigned reviewer, stamped with the assignment time
    pub fn assigned(reviewer_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            reviewer_id: reviewer_id.into(),
            status: ReviewerStatus::Assigned,
            assigned_date: at,
        }
    }
}

/// A biosafety protocol submitted for IBC review
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IbcApplication {
    pub id: String,
    pub ibc_number: String,
    pub title: String,
    pub status: IbcStatus,
    pub biosafety_level: Option<BiosafetyLevel>,
    #[serde(default)]
    pub review_comments: Vec<ReviewComment>,
    #[serde(default)]
    pub reviewer_assignments: Vec<ReviewerAssignment>,
    pub principal_investigator_id: Option<String>,
    pub research_activity_id: Option<String>,
    #[serde(default)]
    pub risk_flags: RiskFlags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IbcApplication {
    /// Create a new application in draft status
    pub fn new(ibc_number: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::new_id(),
            ibc_number: ibc_number.into(),
            title: title.into(),
            status: IbcStatus::Draft,
            biosafety_level: None,
            review_comments: Vec::new(),
            reviewer_assignments: Vec::new(),
            principal_investigator_id: None,
            research_activity_id: None,
            risk_flags: RiskFlags::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_reviewer(&self, reviewer_id: &str) -> bool {
        self.reviewer_assignments
            .iter()
            .any(|a| a.reviewer_id == reviewer_id)
    }
}

/// Role on the IBC board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardRole {
    Chair,
    DeputyChair,
    Member,
}

impl BoardRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardRole::Chair => "chair",
            BoardRole::DeputyChair => "deputy_chair",
            BoardRole::Member => "member",
        }
    }
}

impl std::str::FromStr for BoardRole {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "chair" => Ok(BoardRole::Chair),
            "deputy_chair" => Ok(BoardRole::DeputyChair),
            "member" => Ok(BoardRole::Member),
            other => Err(ParseLabelError::new("board role", other)),
        }
    }
}

/// A scientist sitting on the IBC
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IbcBoardMember {
    pub id: String,
    pub scientist_id: String,
    pub role: BoardRole,
    #[serde(default)]
    pub expertise: Vec<String>,
    pub is_active: bool,
    pub term_end_date: Option<NaiveDate>,
}

impl IbcBoardMember {
    /// Active and, if a term end is set, not past it
    pub fn is_serving(&self, today: NaiveDate) -> bool {
        self.is_active && self.term_end_date.map_or(true, |end| end >= today)
    }
}

/// A scientist listed as personnel on an application
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IbcPersonnel {
    pub id: String,
    pub application_id: String,
    pub scientist_id: String,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_values() {
        assert_eq!(
            serde_json::to_string(&IbcStatus::UnderReview).unwrap(),
            "\"under_review\""
        );
        assert_eq!("under_review".parse::<IbcStatus>().unwrap(), IbcStatus::UnderReview);
        assert!("approved".parse::<IbcStatus>().is_err());
    }

    #[test]
    fn test_new_application_is_draft() {
        let app = IbcApplication::new("IBC-2024-001", "CRISPR screen");
        assert_eq!(app.status, IbcStatus::Draft);
        assert!(app.reviewer_assignments.is_empty());
    }

    #[test]
    fn test_board_member_serving() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut member = IbcBoardMember {
            id: "m1".into(),
            scientist_id: "s1".into(),
            role: BoardRole::Member,
            expertise: vec![],
            is_active: true,
            term_end_date: NaiveDate::from_ymd_opt(2024, 5, 31),
        };
        assert!(!member.is_serving(today));
        member.term_end_date = None;
        assert!(member.is_serving(today));
    }

    #[test]
    fn test_biosafety_level_labels() {
        assert_eq!(serde_json::to_string(&BiosafetyLevel::Bsl2).unwrap(), "\"BSL-2\"");
        assert_eq!("bsl-3".parse::<BiosafetyLevel>().unwrap(), BiosafetyLevel::Bsl3);
    }
}
