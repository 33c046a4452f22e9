//! CITI certification records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Display state of a certificate, derived from its end date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificationStatus {
    /// No certificate, or no end date on record
    Never,
    Expired,
    Expiring,
    Valid,
}

impl CertificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificationStatus::Never => "never",
            CertificationStatus::Expired => "expired",
            CertificationStatus::Expiring => "expiring",
            CertificationStatus::Valid => "valid",
        }
    }
}

impl std::fmt::Display for CertificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A training course a scientist can be certified in
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationModule {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub validity_months: Option<u32>,
    #[serde(default)]
    pub is_core: bool,
}

impl CertificationModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: crate::new_id(),
            name: name.into(),
            description: None,
            validity_months: None,
            is_core: false,
        }
    }
}

/// Completion certificate for one scientist in one module
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub id: String,
    pub scientist_id: String,
    pub module_id: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub source_file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One processed upload in the PDF import log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfImportRecord {
    pub id: String,
    pub file_name: String,
    pub file_url: Option<String>,
    pub uploaded_by: Option<String>,
    pub processed: bool,
    pub certificates_created: u32,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}
