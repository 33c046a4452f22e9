//! Field validation for records submitted through the API

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Building, IbcApplication, Publication, Room, Scientist};

lazy_static! {
    static ref EMAIL_PATTERN: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref DOI_PATTERN: Regex = Regex::new(r"^10\.\d{4,}/\S+$").unwrap();
    static ref URL_PATTERN: Regex = Regex::new(r"^https?://\S+$").unwrap();
}

/// Severity of a validation issue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

/// A validation error or warning attached to one field
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub severity: ValidationSeverity,
}

impl ValidationIssue {
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: ValidationSeverity::Error,
        }
    }

    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: ValidationSeverity::Warning,
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// True if any issue is an error
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues
        .iter()
        .any(|i| matches!(i.severity, ValidationSeverity::Error))
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

pub fn validate_scientist(scientist: &Scientist) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if is_blank(scientist.name.as_deref())
        && (is_blank(scientist.first_name.as_deref()) || is_blank(scientist.last_name.as_deref()))
    {
        issues.push(ValidationIssue::error(
            "name",
            "Either a name or both first and last name are required",
        ));
    }

    if let Some(email) = scientist.email.as_deref().filter(|e| !e.trim().is_empty()) {
        if !EMAIL_PATTERN.is_match(email.trim()) {
            issues.push(ValidationIssue::error("email", "Email address is not valid"));
        }
    }

    if is_blank(scientist.staff_id.as_deref()) {
        issues.push(ValidationIssue::warning("staffId", "Staff ID is recommended"));
    }

    issues
}

pub fn validate_building(building: &Building) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if building.name.trim().is_empty() {
        issues.push(ValidationIssue::error("name", "Building name is required"));
    }
    issues
}

pub fn validate_room(room: &Room) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if room.building_id.trim().is_empty() {
        issues.push(ValidationIssue::error("buildingId", "Building is required"));
    }
    if room.room_number.trim().is_empty() {
        issues.push(ValidationIssue::error("roomNumber", "Room number is required"));
    }
    if room.capacity == Some(0) {
        issues.push(ValidationIssue::warning("capacity", "Capacity of zero"));
    }
    if room.certifications.iter().any(|c| c.trim().is_empty()) {
        issues.push(ValidationIssue::error(
            "certifications",
            "Certification names must not be blank",
        ));
    }
    if room.available_ppe.iter().any(|p| p.trim().is_empty()) {
        issues.push(ValidationIssue::error("availablePpe", "PPE names must not be blank"));
    }

    issues
}

pub fn validate_publication(publication: &Publication) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if publication.title.trim().is_empty() {
        issues.push(ValidationIssue::error("title", "Title is required"));
    }

    if let Some(doi) = publication.doi.as_deref() {
        if !DOI_PATTERN.is_match(doi.trim()) {
            issues.push(ValidationIssue::error("doi", "DOI should look like 10.XXXX/suffix"));
        }
    }

    if let Some(url) = publication.prepublication_url.as_deref() {
        if !URL_PATTERN.is_match(url.trim()) {
            issues.push(ValidationIssue::error(
                "prepublicationUrl",
                "Pre-publication URL must start with http:// or https://",
            ));
        }
    }

    issues
}

pub fn validate_ibc_application(application: &IbcApplication) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if application.ibc_number.trim().is_empty() {
        issues.push(ValidationIssue::error("ibcNumber", "IBC number is required"));
    }
    if application.title.trim().is_empty() {
        issues.push(ValidationIssue::error("title", "Title is required"));
    }
    if application.principal_investigator_id.is_none() {
        issues.push(ValidationIssue::warning(
            "principalInvestigatorId",
            "A principal investigator is recommended",
        ));
    }
    if application.biosafety_level.is_none() && application.risk_flags.any() {
        issues.push(ValidationIssue::warning(
            "biosafetyLevel",
            "Biosafety level should be set when risk flags are present",
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_scientist() {
        let issues = validate_scientist(&Scientist::default());
        assert!(issues.iter().any(|i| i.field == "name"));
        assert!(has_errors(&issues));
    }

    #[test]
    fn test_validate_scientist_email() {
        let mut s = Scientist::new("Ada", "Lovelace").with_staff_id("S-1");
        assert!(validate_scientist(&s).is_empty());
        s.email = Some("not-an-email".into());
        assert!(has_errors(&validate_scientist(&s)));
    }

    #[test]
    fn test_validate_room_requires_number() {
        let room = Room::new("b1", "");
        let issues = validate_room(&room);
        assert!(issues.iter().any(|i| i.field == "roomNumber"));
    }

    #[test]
    fn test_validate_publication_doi() {
        let mut p = Publication::new("T");
        p.doi = Some("doi:bad".into());
        assert!(has_errors(&validate_publication(&p)));
        p.doi = Some("10.1038/nature12373".into());
        assert!(!has_errors(&validate_publication(&p)));
    }

    #[test]
    fn test_validate_ibc_application_warnings_only() {
        let app = IbcApplication::new("IBC-1", "Title");
        let issues = validate_ibc_application(&app);
        assert!(!has_errors(&issues));
        assert!(!issues.is_empty());
    }
}
