//! Authorship roles
//!
//! Stored and sent as one string, e.g. `"Co-First Author, Corresponding Author"`,
//! but handled everywhere else as a tagged structure.

use serde::{Deserialize, Serialize};

use crate::ParseLabelError;

const SHARED_PREFIX: &str = "Co-";
const CORRESPONDING_SUFFIX: &str = ", Corresponding Author";

/// Base contribution of an author
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AuthorRole {
    FirstAuthor,
    SeniorAuthor,
    LastAuthor,
    ContributingAuthor,
    /// Free-text role. Build it with [`AuthorRole::other`] so the label cannot
    /// be mistaken for the "Co-" prefix or the corresponding-author suffix.
    Other(String),
}

impl AuthorRole {
    pub fn label(&self) -> &str {
        match self {
            AuthorRole::FirstAuthor => "First Author",
            AuthorRole::SeniorAuthor => "Senior Author",
            AuthorRole::LastAuthor => "Last Author",
            AuthorRole::ContributingAuthor => "Contributing Author",
            AuthorRole::Other(label) => label,
        }
    }

    /// Role for a free-text label, rejecting labels that would not survive the string form
    pub fn other(label: impl Into<String>) -> Result<Self, ParseLabelError> {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.is_empty()
            || trimmed.starts_with(SHARED_PREFIX)
            || trimmed.ends_with(CORRESPONDING_SUFFIX)
        {
            return Err(ParseLabelError::new("author role", label));
        }
        Ok(Self::from_label(trimmed))
    }

    fn from_label(label: &str) -> Self {
        match label {
            "First Author" => AuthorRole::FirstAuthor,
            "Senior Author" => AuthorRole::SeniorAuthor,
            "Last Author" => AuthorRole::LastAuthor,
            "Contributing Author" => AuthorRole::ContributingAuthor,
            other => AuthorRole::Other(other.to_string()),
        }
    }
}

/// Authorship of one author on one publication
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct AuthorshipRole {
    pub base_role: AuthorRole,
    /// Role shared with another author ("Co-")
    pub is_shared: bool,
    pub is_corresponding: bool,
}

impl AuthorshipRole {
    pub fn new(base_role: AuthorRole) -> Self {
        Self {
            base_role,
            is_shared: false,
            is_corresponding: false,
        }
    }

    pub fn shared(mut self) -> Self {
        self.is_shared = true;
        self
    }

    pub fn corresponding(mut self) -> Self {
        self.is_corresponding = true;
        self
    }
}

impl std::fmt::Display for AuthorshipRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_shared {
            f.write_str(SHARED_PREFIX)?;
        }
        f.write_str(self.base_role.label())?;
        if self.is_corresponding {
            f.write_str(CORRESPONDING_SUFFIX)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for AuthorshipRole {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rest = s.trim();

        let is_corresponding = match rest.strip_suffix(CORRESPONDING_SUFFIX) {
            Some(stripped) => {
                rest = stripped.trim_end();
                true
            }
            None => false,
        };

        let is_shared = match rest.strip_prefix(SHARED_PREFIX) {
            Some(stripped) => {
                rest = stripped.trim_start();
                true
            }
            None => false,
        };

        let base_role =
            AuthorRole::other(rest).map_err(|_| ParseLabelError::new("authorship type", s))?;

        Ok(Self {
            base_role,
            is_shared,
            is_corresponding,
        })
    }
}

impl From<AuthorshipRole> for String {
    fn from(role: AuthorshipRole) -> Self {
        role.to_string()
    }
}

impl TryFrom<String> for AuthorshipRole {
    type Error = ParseLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_full_role() {
        let role = AuthorshipRole::new(AuthorRole::FirstAuthor)
            .shared()
            .corresponding();
        assert_eq!(role.to_string(), "Co-First Author, Corresponding Author");
    }

    #[test]
    fn test_parse_plain_role() {
        let role: AuthorshipRole = "Senior Author".parse().unwrap();
        assert_eq!(role, AuthorshipRole::new(AuthorRole::SeniorAuthor));
    }

    #[test]
    fn test_parse_other_role_keeps_label() {
        let role: AuthorshipRole = "Co-Statistician, Corresponding Author".parse().unwrap();
        assert!(role.is_shared);
        assert!(role.is_corresponding);
        assert_eq!(role.base_role, AuthorRole::Other("Statistician".to_string()));
    }

    #[test]
    fn test_other_rejects_ambiguous_labels() {
        assert!(AuthorRole::other("Co-op Lead").is_err());
        assert!(AuthorRole::other("Editor, Corresponding Author").is_err());
        assert!(AuthorRole::other("  ").is_err());
        assert_eq!(AuthorRole::other("Last Author").unwrap(), AuthorRole::LastAuthor);

        let role = AuthorshipRole::new(AuthorRole::other("Statistician").unwrap())
            .shared()
            .corresponding();
        let back: AuthorshipRole = role.to_string().parse().unwrap();
        assert_eq!(back, role);
    }

    #[test]
    fn test_parse_rejects_empty_base() {
        assert!("".parse::<AuthorshipRole>().is_err());
        assert!("Co-, Corresponding Author".parse::<AuthorshipRole>().is_err());
        assert!("Co-Co-op Lead".parse::<AuthorshipRole>().is_err());
    }

    #[test]
    fn test_serde_uses_string_form() {
        let role = AuthorshipRole::new(AuthorRole::LastAuthor).corresponding();
        let json = serde_json::to_string(&role).unwrap();
        assert_eq!(json, "\"Last Author, Corresponding Author\"");
        let back: AuthorshipRole = serde_json::from_str(&json).unwrap();
        assert_eq!(back, role);
    }
}
