//! Two-step CITI certificate import: propose, then confirm

use std::collections::HashSet;

use chrono::Utc;
use compliance_domain::{new_id, Certificate, PdfImportRecord};
use serde::{Deserialize, Serialize};

use super::Command;
use crate::error::{ImportError, Result};
use crate::import::{build_candidate, BatchFile, CertificateCandidate};
use crate::persistence::Repository;

/// Parse OCR text for each file and propose certificates. Writes nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessCertificateBatch {
    pub files: Vec<BatchFile>,
}

impl Command for ProcessCertificateBatch {
    type Output = Vec<CertificateCandidate>;

    fn execute(self, repo: &Repository) -> Result<Vec<CertificateCandidate>> {
        if self.files.is_empty() {
            return Err(ImportError::EmptyBatch.into());
        }
        let scientists = repo.list_scientists()?;
        let modules = repo.list_modules()?;

        let candidates: Vec<_> = self
            .files
            .iter()
            .map(|f| build_candidate(f, &scientists, &modules))
            .collect();

        tracing::debug!(
            files = candidates.len(),
            matched = candidates.iter().filter(|c| c.is_matched()).count(),
            "Processed certificate batch"
        );
        Ok(candidates)
    }
}

/// Persist the confirmed candidates and log one import record per file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCertificateBatch {
    pub uploaded_by: Option<String>,
    pub candidates: Vec<CertificateCandidate>,
}

impl Command for ConfirmCertificateBatch {
    type Output = Vec<PdfImportRecord>;

    fn execute(self, repo: &Repository) -> Result<Vec<PdfImportRecord>> {
        if self.candidates.is_empty() {
            return Err(ImportError::EmptyBatch.into());
        }
        let now = Utc::now();
        let uploaded_by = self.uploaded_by;

        let records = repo.transaction(|repo| {
            let scientists: HashSet<String> =
                repo.list_scientists()?.into_iter().map(|s| s.id).collect();
            let modules: HashSet<String> = repo.list_modules()?.into_iter().map(|m| m.id).collect();

            let mut records = Vec::with_capacity(self.candidates.len());
            for candidate in &self.candidates {
                let (certificate, error) = match (&candidate.scientist_id, &candidate.module_id) {
                    (Some(scientist_id), Some(module_id)) => {
                        let mut unknown = Vec::new();
                        if !scientists.contains(scientist_id) {
                            unknown.push(format!("Unknown scientist {}", scientist_id));
                        }
                        if !modules.contains(module_id) {
                            unknown.push(format!("Unknown certification module {}", module_id));
                        }
                        if unknown.is_empty() {
                            let certificate = Certificate {
                                id: new_id(),
                                scientist_id: scientist_id.clone(),
                                module_id: module_id.clone(),
                                start_date: candidate.start_date,
                                end_date: candidate.end_date,
                                source_file_url: candidate.file_url.clone(),
                                created_at: now,
                            };
                            repo.insert_certificate(&certificate)?;
                            (Some(certificate), None)
                        } else {
                            (None, Some(unknown.join("; ")))
                        }
                    }
                    _ if candidate.warnings.is_empty() => {
                        (None, Some("Scientist or module not matched".to_string()))
                    }
                    _ => (None, Some(candidate.warnings.join("; "))),
                };

                let record = PdfImportRecord {
                    id: new_id(),
                    file_name: candidate.file_name.clone(),
                    file_url: candidate.file_url.clone(),
                    uploaded_by: uploaded_by.clone(),
                    processed: certificate.is_some(),
                    certificates_created: u32::from(certificate.is_some()),
                    error,
                    created_at: now,
                };
                repo.append_import_record(&record)?;
                records.push(record);
            }
            Ok(records)
        })?;

        tracing::info!(
            files = records.len(),
            created = records.iter().map(|r| r.certificates_created).sum::<u32>(),
            "Confirmed certificate batch"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComplianceError;
    use compliance_domain::{CertificationModule, Scientist};

    const TEXT: &str = "Name: Grace Hopper (ID: 1)\nCurriculum Group: Biosafety\nCompletion Date: 01-Feb-2024\nExpiration Date: 01-Feb-2027\n";

    #[test]
    fn test_empty_batch() {
        let repo = Repository::in_memory().unwrap();
        let err = ProcessCertificateBatch { files: vec![] }
            .execute(&repo)
            .unwrap_err();
        assert!(matches!(err, ComplianceError::Import(ImportError::EmptyBatch)));
    }

    #[test]
    fn test_process_then_confirm() {
        let repo = Repository::in_memory().unwrap();
        repo.save_scientist(&Scientist::new("Grace", "Hopper")).unwrap();
        repo.save_module(&CertificationModule::new("Biosafety")).unwrap();

        let candidates = ProcessCertificateBatch {
            files: vec![
                BatchFile {
                    file_name: "hopper.pdf".into(),
                    file_url: Some("https://files.example/hopper.pdf".into()),
                    text: TEXT.into(),
                },
                BatchFile {
                    file_name: "blank.pdf".into(),
                    file_url: None,
                    text: String::new(),
                },
            ],
        }
        .execute(&repo)
        .unwrap();
        assert!(repo.list_certificates().unwrap().is_empty());
        assert!(candidates[0].is_matched());
        assert!(!candidates[1].is_matched());

        let records = ConfirmCertificateBatch {
            uploaded_by: Some("pmo".into()),
            candidates,
        }
        .execute(&repo)
        .unwrap();

        assert_eq!(records.len(), 2);
        assert!(records[0].processed);
        assert!(!records[1].processed);
        assert!(records[1].error.is_some());
        assert_eq!(repo.list_certificates().unwrap().len(), 1);
        assert_eq!(repo.list_import_records(10).unwrap().len(), 2);
    }

    #[test]
    fn test_confirm_logs_unknown_ids_without_inserting() {
        let repo = Repository::in_memory().unwrap();
        let known = Scientist::new("Grace", "Hopper");
        repo.save_scientist(&known).unwrap();

        let candidate = |scientist_id: &str, module_id: &str| CertificateCandidate {
            file_name: format!("{scientist_id}.pdf"),
            file_url: None,
            parsed: Default::default(),
            scientist_id: Some(scientist_id.to_string()),
            module_id: Some(module_id.to_string()),
            start_date: None,
            end_date: None,
            warnings: Vec::new(),
        };

        let records = ConfirmCertificateBatch {
            uploaded_by: None,
            candidates: vec![candidate("ghost", "nope"), candidate(&known.id, "nope")],
        }
        .execute(&repo)
        .unwrap();

        assert!(records.iter().all(|r| !r.processed && r.certificates_created == 0));
        let first = records[0].error.as_deref().unwrap();
        assert!(first.contains("Unknown scientist ghost"));
        assert!(first.contains("Unknown certification module nope"));
        assert_eq!(
            records[1].error.as_deref(),
            Some("Unknown certification module nope")
        );
        assert!(repo.list_certificates().unwrap().is_empty());
        assert_eq!(repo.list_import_records(10).unwrap().len(), 2);
    }
}
