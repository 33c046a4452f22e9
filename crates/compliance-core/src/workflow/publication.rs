//! Publication status workflow
//!
//! A linear chain with one fork after vetting:
//! ```text
//! Concept → Complete Draft → Vetted for submission ─┬→ Submitted (with pre-publication) ──┬→ Under review → Accepted/In Press → Published
//!                                                   └→ Submitted (without pre-publication) ┘
//! ```

use std::collections::BTreeMap;

use compliance_domain::{Publication, PublicationField, PublicationStatus};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use super::{Transition, TransitionInput, Workflow};
use crate::error::WorkflowError;

lazy_static! {
    static ref PUBLICATION_WORKFLOW: Workflow<PublicationStatus> = build();
}

fn build() -> Workflow<PublicationStatus> {
    use compliance_domain::PublicationStatus::*;

    Workflow::new("Publication", PublicationStatus::ALL)
        .with(Transition::new(Concept, CompleteDraft).requires(&["authors"]))
        .allow(CompleteDraft, VettedForSubmission)
        .with(
            Transition::new(VettedForSubmission, SubmittedWithPrepublication).requires(&[
                "journal",
                "prepublicationUrl",
                "prepublicationSite",
            ]),
        )
        .with(
            Transition::new(VettedForSubmission, SubmittedWithoutPrepublication)
                .requires(&["journal"]),
        )
        .allow(SubmittedWithPrepublication, UnderReview)
        .allow(SubmittedWithoutPrepublication, UnderReview)
        .with(Transition::new(UnderReview, AcceptedInPress).requires(&["journal"]))
        .with(Transition::new(AcceptedInPress, Published).requires(&["publicationDate", "doi"]))
}

/// The publication status table
pub fn publication_workflow() -> &'static Workflow<PublicationStatus> {
    &PUBLICATION_WORKFLOW
}

/// One field whose value a status change alters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: PublicationField,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

fn normalized(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse update keys into known fields
pub fn parse_updates(
    updates: &BTreeMap<String, String>,
) -> Result<BTreeMap<PublicationField, String>, WorkflowError> {
    updates
        .iter()
        .map(|(name, value)| {
            name.parse::<PublicationField>()
                .map(|field| (field, value.clone()))
                .map_err(|_| WorkflowError::UnknownField(name.clone()))
        })
        .collect()
}

/// Fields whose value would actually change, in field order
pub fn diff_fields(
    publication: &Publication,
    updates: &BTreeMap<PublicationField, String>,
) -> Vec<FieldChange> {
    updates
        .iter()
        .filter_map(|(field, value)| {
            let old_value = publication.get_field(*field).and_then(|v| normalized(&v));
            let new_value = normalized(value);
            (old_value != new_value).then(|| FieldChange {
                field: *field,
                old_value,
                new_value,
            })
        })
        .collect()
}

/// The field values a transition sees: stored values overlaid with updates
pub fn effective_input(
    publication: &Publication,
    updates: &BTreeMap<PublicationField, String>,
) -> TransitionInput {
    let mut input = TransitionInput::new();
    for field in PublicationField::ALL {
        let value = match updates.get(&field) {
            Some(v) => Some(v.clone()),
            None => publication.get_field(field),
        };
        if let Some(value) = value {
            input.fields.insert(field.as_str().to_string(), value);
        }
    }
    input
}

/// Validate a status change and compute its field diff
pub fn plan_status_change(
    publication: &Publication,
    to: PublicationStatus,
    updates: &BTreeMap<PublicationField, String>,
) -> Result<Vec<FieldChange>, WorkflowError> {
    let input = effective_input(publication, updates);
    publication_workflow().validate(publication.status, to, &input)?;

    let mut scratch = publication.clone();
    for (field, value) in updates {
        scratch
            .set_field(*field, value)
            .map_err(|e| WorkflowError::InvalidFieldValue {
                field: field.as_str().to_string(),
                message: e.to_string(),
            })?;
    }

    Ok(diff_fields(publication, updates))
}
