//! Certification status derivation and the scientist × module matrix

use std::collections::HashMap;

use chrono::NaiveDate;
use compliance_domain::{Certificate, CertificationModule, CertificationStatus, Scientist};
use serde::Serialize;

use crate::config::DEFAULT_EXPIRING_WINDOW_DAYS;

/// Derive display status from an end date, with the default 30-day window
pub fn certification_status(end_date: Option<NaiveDate>, today: NaiveDate) -> CertificationStatus {
    certification_status_with_window(end_date, today, DEFAULT_EXPIRING_WINDOW_DAYS)
}

/// `never` without an end date, `expired` before today, `expiring` within
/// `window_days` (inclusive), otherwise `valid`
pub fn certification_status_with_window(
    end_date: Option<NaiveDate>,
    today: NaiveDate,
    window_days: u32,
) -> CertificationStatus {
    let Some(end) = end_date else {
        return CertificationStatus::Never;
    };
    let days_left = (end - today).num_days();
    if days_left < 0 {
        CertificationStatus::Expired
    } else if days_left <= i64::from(window_days) {
        CertificationStatus::Expiring
    } else {
        CertificationStatus::Valid
    }
}

/// Column header of the matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleHeader {
    pub id: String,
    pub name: String,
    pub is_core: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixCell {
    pub module_id: String,
    pub status: CertificationStatus,
    pub certificate_id: Option<String>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixRow {
    pub scientist_id: String,
    pub scientist_name: String,
    pub department: Option<String>,
    pub cells: Vec<MatrixCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub never: usize,
    pub expired: usize,
    pub expiring: usize,
    pub valid: usize,
}

impl StatusCounts {
    fn record(&mut self, status: CertificationStatus) {
        match status {
            CertificationStatus::Never => self.never += 1,
            CertificationStatus::Expired => self.expired += 1,
            CertificationStatus::Expiring => self.expiring += 1,
            CertificationStatus::Valid => self.valid += 1,
        }
    }
}

/// Compliance grid: one row per scientist, one cell per module
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationMatrix {
    pub as_of: NaiveDate,
    pub modules: Vec<ModuleHeader>,
    pub rows: Vec<MatrixRow>,
    pub summary: StatusCounts,
}

impl CertificationMatrix {
    /// Build the matrix. Each cell shows the certificate with the latest end date.
    pub fn build(
        scientists: &[Scientist],
        modules: &[CertificationModule],
        certificates: &[Certificate],
        today: NaiveDate,
        window_days: u32,
    ) -> Self {
        let mut latest: HashMap<(&str, &str), &Certificate> = HashMap::new();
        for cert in certificates {
            let key = (cert.scientist_id.as_str(), cert.module_id.as_str());
            let replace = match latest.get(&key) {
                Some(current) => {
                    (cert.end_date, cert.created_at) > (current.end_date, current.created_at)
                }
                None => true,
            };
            if replace {
                latest.insert(key, cert);
            }
        }

        let mut summary = StatusCounts::default();
        let rows = scientists
            .iter()
            .map(|scientist| {
                let cells = modules
                    .iter()
                    .map(|module| {
                        let cert = latest.get(&(scientist.id.as_str(), module.id.as_str()));
                        let end_date = cert.and_then(|c| c.end_date);
                        let status = certification_status_with_window(end_date, today, window_days);
                        summary.record(status);
                        MatrixCell {
                            module_id: module.id.clone(),
                            status,
                            certificate_id: cert.map(|c| c.id.clone()),
                            end_date,
                        }
                    })
                    .collect();
                MatrixRow {
                    scientist_id: scientist.id.clone(),
                    scientist_name: scientist.display_name(),
                    department: scientist.department.clone(),
                    cells,
                }
            })
            .collect();

        Self {
            as_of: today,
            modules: modules
                .iter()
                .map(|m| ModuleHeader {
                    id: m.id.clone(),
                    name: m.name.clone(),
                    is_core: m.is_core,
                })
                .collect(),
            rows,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn test_boundaries() {
        let t = today();
        assert_eq!(certification_status(Some(t), t), CertificationStatus::Expiring);
        assert_eq!(
            certification_status(Some(t + Duration::days(30)), t),
            CertificationStatus::Expiring
        );
        assert_eq!(
            certification_status(Some(t + Duration::days(31)), t),
            CertificationStatus::Valid
        );
        assert_eq!(
            certification_status(Some(t - Duration::days(1)), t),
            CertificationStatus::Expired
        );
    }

    #[test]
    fn test_custom_window() {
        let t = today();
        assert_eq!(
            certification_status_with_window(Some(t + Duration::days(20)), t, 14),
            CertificationStatus::Valid
        );
    }

    fn cert(scientist: &str, module: &str, end: Option<NaiveDate>) -> Certificate {
        Certificate {
            id: compliance_domain::new_id(),
            scientist_id: scientist.into(),
            module_id: module.into(),
            start_date: None,
            end_date: end,
            source_file_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_matrix_picks_latest_certificate() {
        let t = today();
        let mut s = Scientist::new("Ada", "Lovelace");
        s.id = "s1".into();
        let mut m = CertificationModule::new("Biosafety");
        m.id = "m1".into();
        let mut m2 = CertificationModule::new("Human Subjects");
        m2.id = "m2".into();

        let certs = vec![
            cert("s1", "m1", Some(t - Duration::days(400))),
            cert("s1", "m1", Some(t + Duration::days(200))),
            cert("s1", "m1", None),
        ];

        let matrix = CertificationMatrix::build(&[s], &[m, m2], &certs, t, 30);
        assert_eq!(matrix.rows.len(), 1);
        let cells = &matrix.rows[0].cells;
        assert_eq!(cells[0].status, CertificationStatus::Valid);
        assert_eq!(cells[1].status, CertificationStatus::Never);
        assert_eq!(matrix.summary.valid, 1);
        assert_eq!(matrix.summary.never, 1);
    }
}
