//! Publication domain model and manuscript history

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuthorshipRole, ParseLabelError};

/// Manuscript status, from first idea to print
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PublicationStatus {
    #[serde(rename = "Concept")]
    Concept,
    #[serde(rename = "Complete Draft")]
    CompleteDraft,
    #[serde(rename = "Vetted for submission")]
    VettedForSubmission,
    #[serde(rename = "Submitted for review with pre-publication")]
    SubmittedWithPrepublication,
    #[serde(rename = "Submitted for review without pre-publication")]
    SubmittedWithoutPrepublication,
    #[serde(rename = "Under review")]
    UnderReview,
    #[serde(rename = "Accepted/In Press", alias = "Accepted-In Press")]
    AcceptedInPress,
    #[serde(rename = "Published")]
    Published,
}

impl PublicationStatus {
    pub const ALL: [PublicationStatus; 8] = [
        PublicationStatus::Concept,
        PublicationStatus::CompleteDraft,
        PublicationStatus::VettedForSubmission,
        PublicationStatus::SubmittedWithPrepublication,
        PublicationStatus::SubmittedWithoutPrepublication,
        PublicationStatus::UnderReview,
        PublicationStatus::AcceptedInPress,
        PublicationStatus::Published,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PublicationStatus::Concept => "Concept",
            PublicationStatus::CompleteDraft => "Complete Draft",
            PublicationStatus::VettedForSubmission => "Vetted for submission",
            PublicationStatus::SubmittedWithPrepublication => {
                "Submitted for review with pre-publication"
            }
            PublicationStatus::SubmittedWithoutPrepublication => {
                "Submitted for review without pre-publication"
            }
            PublicationStatus::UnderReview => "Under review",
            PublicationStatus::AcceptedInPress => "Accepted/In Press",
            PublicationStatus::Published => "Published",
        }
    }
}

impl Default for PublicationStatus {
    fn default() -> Self {
        PublicationStatus::Concept
    }
}

impl std::fmt::Display for PublicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for PublicationStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "Accepted-In Press" {
            return Ok(PublicationStatus::AcceptedInPress);
        }
        PublicationStatus::ALL
            .into_iter()
            .find(|st| st.label() == s)
            .ok_or_else(|| ParseLabelError::new("publication status", s))
    }
}

/// Editable publication fields that a status change may collect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PublicationField {
    Title,
    Authors,
    Journal,
    Doi,
    PublicationDate,
    PrepublicationUrl,
    PrepublicationSite,
}

impl PublicationField {
    pub const ALL: [PublicationField; 7] = [
        PublicationField::Title,
        PublicationField::Authors,
        PublicationField::Journal,
        PublicationField::Doi,
        PublicationField::PublicationDate,
        PublicationField::PrepublicationUrl,
        PublicationField::PrepublicationSite,
    ];

    /// Wire name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationField::Title => "title",
            PublicationField::Authors => "authors",
            PublicationField::Journal => "journal",
            PublicationField::Doi => "doi",
            PublicationField::PublicationDate => "publicationDate",
            PublicationField::PrepublicationUrl => "prepublicationUrl",
            PublicationField::PrepublicationSite => "prepublicationSite",
        }
    }
}

impl std::fmt::Display for PublicationField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PublicationField {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicationField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ParseLabelError::new("publication field", s))
    }
}

/// A manuscript tracked from concept to publication
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub id: String,
    pub title: String,
    pub status: PublicationStatus,
    /// Author list as entered, comma separated
    pub authors: Option<String>,
    pub journal: Option<String>,
    pub doi: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub prepublication_url: Option<String>,
    pub prepublication_site: Option<String>,
    pub research_activity_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Publication {
    /// Create a new publication at the Concept stage
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: crate::new_id(),
            title: title.into(),
            status: PublicationStatus::Concept,
            authors: None,
            journal: None,
            doi: None,
            publication_date: None,
            prepublication_url: None,
            prepublication_site: None,
            research_activity_id: None,
            updated_at: Utc::now(),
        }
    }

    /// Current value of a field as a string
    pub fn get_field(&self, field: PublicationField) -> Option<String> {
        match field {
            PublicationField::Title => Some(self.title.clone()),
            PublicationField::Authors => self.authors.clone(),
            PublicationField::Journal => self.journal.clone(),
            PublicationField::Doi => self.doi.clone(),
            PublicationField::PublicationDate => {
                self.publication_date.map(|d| d.format("%Y-%m-%d").to_string())
            }
            PublicationField::PrepublicationUrl => self.prepublication_url.clone(),
            PublicationField::PrepublicationSite => self.prepublication_site.clone(),
        }
    }

    /// Set a field from its string form. Blank values clear optional fields.
    pub fn set_field(&mut self, field: PublicationField, value: &str) -> Result<(), ParseLabelError> {
        let trimmed = value.trim();
        let opt = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        match field {
            PublicationField::Title => self.title = trimmed.to_string(),
            PublicationField::Authors => self.authors = opt,
            PublicationField::Journal => self.journal = opt,
            PublicationField::Doi => self.doi = opt,
            PublicationField::PublicationDate => {
                self.publication_date = match opt {
                    Some(s) => Some(
                        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                            .map_err(|_| ParseLabelError::new("publication date", s))?,
                    ),
                    None => None,
                }
            }
            PublicationField::PrepublicationUrl => self.prepublication_url = opt,
            PublicationField::PrepublicationSite => self.prepublication_site = opt,
        }
        Ok(())
    }
}

/// Link between a publication and one of its scientist authors
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationAuthor {
    pub publication_id: String,
    pub scientist_id: String,
    /// Serialized at the boundary as e.g. "Co-First Author, Corresponding Author"
    #[serde(rename = "authorshipType")]
    pub authorship: AuthorshipRole,
    pub author_position: u32,
}

/// One immutable row of a publication's audit trail
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManuscriptHistory {
    pub id: String,
    pub publication_id: String,
    pub from_status: PublicationStatus,
    pub to_status: PublicationStatus,
    pub changed_field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_by: Option<String>,
    pub timestamp: DateTime<Utc>,
}
