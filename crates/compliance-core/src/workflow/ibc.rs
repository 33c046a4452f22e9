//! IBC application review workflow
//!
//! ```text
//! draft → submitted → vetted → under_review → active → expired
//!   ↑________|   ↑______|  ↑_________|
//! ```
//! Entering `under_review` requires at least one assigned reviewer.

use compliance_domain::IbcStatus;
use lazy_static::lazy_static;

use super::{Guard, Transition, Workflow};

lazy_static! {
    static ref IBC_WORKFLOW: Workflow<IbcStatus> = build();
}

fn build() -> Workflow<IbcStatus> {
    use compliance_domain::IbcStatus::*;

    Workflow::new("IBC application", IbcStatus::ALL)
        .allow(Draft, Submitted)
        .allow(Submitted, Vetted)
        .allow(Submitted, Draft)
        .with(Transition::new(Vetted, UnderReview).guarded(&[Guard::ReviewersAssigned]))
        .allow(Vetted, Submitted)
        .allow(UnderReview, Active)
        .allow(UnderReview, Vetted)
        .allow(Active, Expired)
}

/// The IBC application status table
pub fn ibc_workflow() -> &'static Workflow<IbcStatus> {
    &IBC_WORKFLOW
}
