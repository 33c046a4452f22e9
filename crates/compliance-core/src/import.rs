//! CITI completion certificate text parsing
//!
//! OCR runs elsewhere; this module reads the text it produces and matches it
//! against known scientists and certification modules.

use chrono::{Months, NaiveDate};
use compliance_domain::{CertificationModule, Scientist};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ImportError;

lazy_static! {
    static ref NAME_RE: Regex =
        Regex::new(r"(?mi)^\s*Name:\s*(?P<v>[^(\r\n]+?)\s*(?:\(ID:[^)]*\))?\s*$").unwrap();
    static ref COURSE_RE: Regex = Regex::new(
        r"(?mi)^\s*(?:Course|Course Learner Group|Curriculum Group):\s*(?P<v>.+?)\s*$"
    )
    .unwrap();
    static ref COMPLETION_RE: Regex =
        Regex::new(r"(?mi)Completion Date:\s*(?P<v>[0-9A-Za-z/\-]+)").unwrap();
    static ref EXPIRATION_RE: Regex =
        Regex::new(r"(?mi)Expiration Date:\s*(?P<v>[0-9A-Za-z/\-]+)").unwrap();
    static ref RECORD_RE: Regex = Regex::new(r"(?mi)Record ID:\s*(?P<v>\d+)").unwrap();
}

const DATE_FORMATS: [&str; 3] = ["%d-%b-%Y", "%Y-%m-%d", "%m/%d/%Y"];

/// Fields read from one certificate
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCertificate {
    pub name: Option<String>,
    pub course: Option<String>,
    pub completion_date: Option<NaiveDate>,
    pub expiration_date: Option<NaiveDate>,
    pub record_id: Option<String>,
}

impl ParsedCertificate {
    /// Enough was found to be worth showing for confirmation
    pub fn is_recognized(&self) -> bool {
        self.name.is_some() && (self.course.is_some() || self.completion_date.is_some())
    }
}

/// Parse a date in any of the formats CITI prints
pub fn parse_certificate_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.name("v"))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Read labelled fields out of OCR text
pub fn parse_citi_text(text: &str) -> ParsedCertificate {
    ParsedCertificate {
        name: capture(&NAME_RE, text),
        course: capture(&COURSE_RE, text),
        completion_date: capture(&COMPLETION_RE, text).and_then(|d| parse_certificate_date(&d)),
        expiration_date: capture(&EXPIRATION_RE, text).and_then(|d| parse_certificate_date(&d)),
        record_id: capture(&RECORD_RE, text),
    }
}

/// Module whose name matches the course, exactly or as a substring
pub fn match_module<'a>(
    modules: &'a [CertificationModule],
    course: &str,
) -> Option<&'a CertificationModule> {
    let course = course.to_lowercase();
    modules
        .iter()
        .find(|m| m.name.to_lowercase() == course)
        .or_else(|| {
            modules
                .iter()
                .filter(|m| !m.name.trim().is_empty())
                .find(|m| course.contains(&m.name.to_lowercase()))
        })
}

/// Scientist whose name matches the certificate holder
pub fn match_scientist<'a>(scientists: &'a [Scientist], name: &str) -> Option<&'a Scientist> {
    scientists.iter().find(|s| s.matches_name(name))
}

/// One uploaded file, with the text OCR produced for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFile {
    pub file_name: String,
    pub file_url: Option<String>,
    pub text: String,
}

/// A proposed certificate awaiting confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateCandidate {
    pub file_name: String,
    pub file_url: Option<String>,
    pub parsed: ParsedCertificate,
    pub scientist_id: Option<String>,
    pub module_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl CertificateCandidate {
    pub fn is_matched(&self) -> bool {
        self.scientist_id.is_some() && self.module_id.is_some()
    }
}

/// Turn one file into a candidate. Nothing is written.
pub fn build_candidate(
    file: &BatchFile,
    scientists: &[Scientist],
    modules: &[CertificationModule],
) -> CertificateCandidate {
    let parsed = parse_citi_text(&file.text);
    let mut warnings = Vec::new();

    if !parsed.is_recognized() {
        warnings.push(
            ImportError::Unrecognized {
                file: file.file_name.clone(),
            }
            .to_string(),
        );
    }

    let scientist = parsed.name.as_deref().and_then(|n| match_scientist(scientists, n));
    if scientist.is_none() {
        warnings.push(match &parsed.name {
            Some(name) => format!("No scientist named \"{}\"", name),
            None => "No learner name found".to_string(),
        });
    }

    let module = parsed.course.as_deref().and_then(|c| match_module(modules, c));
    if module.is_none() {
        warnings.push(match &parsed.course {
            Some(course) => format!("No certification module matches \"{}\"", course),
            None => "No course name found".to_string(),
        });
    }

    let end_date = parsed.expiration_date.or_else(|| {
        let months = module.and_then(|m| m.validity_months)?;
        let start = parsed.completion_date?;
        start.checked_add_months(Months::new(months))
    });
    if end_date.is_none() {
        warnings.push("No expiration date; certificate will show as never expiring".to_string());
    }

    CertificateCandidate {
        file_name: file.file_name.clone(),
        file_url: file.file_url.clone(),
        scientist_id: scientist.map(|s| s.id.clone()),
        module_id: module.map(|m| m.id.clone()),
        start_date: parsed.completion_date,
        end_date,
        parsed,
        warnings,
    }
}
