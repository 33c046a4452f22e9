//! Scientist records

use serde::{Deserialize, Serialize};

/// Job title that makes a scientist eligible to lead a research activity
pub const INVESTIGATOR_TITLE: &str = "Investigator";

/// A member of research staff
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scientist {
    pub id: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Honorific or academic title (Dr., Prof.)
    pub title: Option<String>,
    pub job_title: Option<String>,
    pub staff_id: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
}

impl Scientist {
    /// Create a scientist with a first and last name
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: crate::new_id(),
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            ..Default::default()
        }
    }

    /// Builder method to set the job title
    pub fn with_job_title(mut self, job_title: impl Into<String>) -> Self {
        self.job_title = Some(job_title.into());
        self
    }

    /// Builder method to set the staff id
    pub fn with_staff_id(mut self, staff_id: impl Into<String>) -> Self {
        self.staff_id = Some(staff_id.into());
        self
    }

    /// Builder method to set the department
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Name for display: the explicit `name` if set, otherwise "First Last"
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim().to_string();
        }
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            self.id.clone()
        } else {
            parts.join(" ")
        }
    }

    /// Only an exact "Investigator" job title qualifies
    pub fn is_investigator(&self) -> bool {
        self.job_title.as_deref() == Some(INVESTIGATOR_TITLE)
    }

    /// Case-insensitive comparison against a full name as printed on a certificate
    pub fn matches_name(&self, full_name: &str) -> bool {
        let wanted = normalize_name(full_name);
        if wanted.is_empty() {
            return false;
        }
        if normalize_name(&self.display_name()) == wanted {
            return true;
        }
        // Certificates sometimes print "Last, First"
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => {
                normalize_name(&format!("{} {}", last, first)) == wanted
                    || normalize_name(&format!("{}, {}", last, first)) == wanted
            }
            _ => false,
        }
    }
}

fn normalize_name(name: &str) -> String {
    name.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_explicit_name() {
        let mut s = Scientist::new("Ada", "Lovelace");
        assert_eq!(s.display_name(), "Ada Lovelace");
        s.name = Some("A. Lovelace".to_string());
        assert_eq!(s.display_name(), "A. Lovelace");
    }

    #[test]
    fn test_is_investigator_exact_match() {
        assert!(Scientist::new("A", "B").with_job_title("Investigator").is_investigator());
        assert!(!Scientist::new("A", "B").with_job_title("Senior Investigator").is_investigator());
        assert!(!Scientist::new("A", "B").with_job_title("investigator").is_investigator());
        assert!(!Scientist::new("A", "B").is_investigator());
    }

    #[test]
    fn test_matches_name_forms() {
        let s = Scientist::new("Grace", "Hopper");
        assert!(s.matches_name("grace hopper"));
        assert!(s.matches_name("Hopper, Grace"));
        assert!(!s.matches_name("Grace Kelly"));
        assert!(!s.matches_name(""));
    }
}
