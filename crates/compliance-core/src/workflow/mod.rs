//! Status workflows with guarded transitions
//!
//! A [`Workflow`] is a typed transition table: for each `(from, to)` pair it
//! records the fields that must be collected on entry and any guards that must
//! hold. The IBC and publication workflows are two instances of it.

pub mod ibc;
pub mod publication;

pub use ibc::ibc_workflow;
pub use publication::{publication_workflow, FieldChange};

use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// A status value that can drive a workflow
pub trait WorkflowState: Copy + Eq + Hash + Display + Debug + Send + Sync + 'static {}

impl<T> WorkflowState for T where T: Copy + Eq + Hash + Display + Debug + Send + Sync + 'static {}

/// Condition, beyond required fields, that a transition demands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    /// At least one reviewer must be attached
    ReviewersAssigned,
}

impl Guard {
    fn check(&self, input: &TransitionInput) -> std::result::Result<(), &'static str> {
        match self {
            Guard::ReviewersAssigned => {
                if input.reviewer_ids.iter().any(|r| !r.trim().is_empty()) {
                    Ok(())
                } else {
                    Err("at least one reviewer must be assigned")
                }
            }
        }
    }
}

/// One allowed edge of a workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition<S> {
    pub from: S,
    pub to: S,
    pub required_fields: &'static [&'static str],
    pub guards: &'static [Guard],
}

impl<S: WorkflowState> Transition<S> {
    pub fn new(from: S, to: S) -> Self {
        Self {
            from,
            to,
            required_fields: &[],
            guards: &[],
        }
    }

    pub fn requires(mut self, fields: &'static [&'static str]) -> Self {
        self.required_fields = fields;
        self
    }

    pub fn guarded(mut self, guards: &'static [Guard]) -> Self {
        self.guards = guards;
        self
    }
}

/// What the caller supplies alongside a requested transition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransitionInput {
    pub fields: BTreeMap<String, String>,
    pub reviewer_ids: Vec<String>,
    pub comment: Option<String>,
}

impl TransitionInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn with_reviewers<I, T>(mut self, reviewers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.reviewer_ids = reviewers.into_iter().map(Into::into).collect();
        self
    }

    /// A field counts as present when its value is not blank
    pub fn has_field(&self, name: &str) -> bool {
        self.fields
            .get(name)
            .map_or(false, |v| !v.trim().is_empty())
    }
}

/// A next status as offered to a user, with what it will ask for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOption<S> {
    pub status: S,
    pub required_fields: Vec<&'static str>,
    pub guards: Vec<Guard>,
}

/// A finite state machine over `S` with per-transition requirements
#[derive(Debug, Clone)]
pub struct Workflow<S> {
    name: &'static str,
    states: Vec<S>,
    transitions: Vec<Transition<S>>,
}

impl<S: WorkflowState> Workflow<S> {
    pub fn new(name: &'static str, states: impl IntoIterator<Item = S>) -> Self {
        Self {
            name,
            states: states.into_iter().collect(),
            transitions: Vec::new(),
        }
    }

    /// Add a transition with no requirements
    pub fn allow(self, from: S, to: S) -> Self {
        self.with(Transition::new(from, to))
    }

    /// Add a fully specified transition
    pub fn with(mut self, transition: Transition<S>) -> Self {
        debug_assert!(self.states.contains(&transition.from));
        debug_assert!(self.states.contains(&transition.to));
        self.transitions.push(transition);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn transitions(&self) -> &[Transition<S>] {
        &self.transitions
    }

    /// Legal next states from `from`, in table order
    pub fn next_states(&self, from: S) -> Vec<S> {
        self.transitions
            .iter()
            .filter(|t| t.from == from)
            .map(|t| t.to)
            .collect()
    }

    /// Next states with their requirements
    pub fn options(&self, from: S) -> Vec<TransitionOption<S>> {
        self.transitions
            .iter()
            .filter(|t| t.from == from)
            .map(|t| TransitionOption {
                status: t.to,
                required_fields: t.required_fields.to_vec(),
                guards: t.guards.to_vec(),
            })
            .collect()
    }

    pub fn find(&self, from: S, to: S) -> Option<&Transition<S>> {
        self.transitions.iter().find(|t| t.from == from && t.to == to)
    }

    pub fn can_transition(&self, from: S, to: S) -> bool {
        self.find(from, to).is_some()
    }

    /// No outgoing transitions
    pub fn is_terminal(&self, state: S) -> bool {
        !self.transitions.iter().any(|t| t.from == state)
    }

    /// The transition for `(from, to)`, or an error naming both states
    pub fn requirements(&self, from: S, to: S) -> Result<&Transition<S>, WorkflowError> {
        self.find(from, to)
            .ok_or_else(|| WorkflowError::InvalidTransition {
                workflow: self.name,
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    /// Check a requested transition against the table, its fields and guards
    pub fn validate(
        &self,
        from: S,
        to: S,
        input: &TransitionInput,
    ) -> Result<&Transition<S>, WorkflowError> {
        let transition = self.requirements(from, to)?;

        let missing: Vec<String> = transition
            .required_fields
            .iter()
            .filter(|f| !input.has_field(f))
            .map(|f| f.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(WorkflowError::MissingFields {
                to: to.to_string(),
                fields: missing,
            });
        }

        for guard in transition.guards {
            guard.check(input).map_err(|message| WorkflowError::GuardFailed {
                to: to.to_string(),
                message: message.to_string(),
            })?;
        }

        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Light {
        Red,
        Green,
        Amber,
        Off,
    }

    impl Display for Light {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn lights() -> Workflow<Light> {
        Workflow::new("lights", [Light::Red, Light::Green, Light::Amber, Light::Off])
            .allow(Light::Red, Light::Green)
            .with(Transition::new(Light::Green, Light::Amber).requires(&["reason"]))
            .with(Transition::new(Light::Amber, Light::Red).guarded(&[Guard::ReviewersAssigned]))
    }

    #[test]
    fn test_next_states_follow_table() {
        let wf = lights();
        assert_eq!(wf.next_states(Light::Red), vec![Light::Green]);
        assert!(wf.next_states(Light::Off).is_empty());
        assert!(wf.is_terminal(Light::Off));
        assert!(!wf.is_terminal(Light::Red));
    }

    #[test]
    fn test_unknown_transition_rejected() {
        let err = lights()
            .validate(Light::Red, Light::Amber, &TransitionInput::new())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
    }

    #[test]
    fn test_required_field_blank_is_missing() {
        let wf = lights();
        let input = TransitionInput::new().with_field("reason", "   ");
        let err = wf.validate(Light::Green, Light::Amber, &input).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::MissingFields {
                to: "Amber".into(),
                fields: vec!["reason".into()]
            }
        );
        let ok = TransitionInput::new().with_field("reason", "slow down");
        assert!(wf.validate(Light::Green, Light::Amber, &ok).is_ok());
    }

    #[test]
    fn test_guard_checked() {
        let wf = lights();
        assert!(matches!(
            wf.validate(Light::Amber, Light::Red, &TransitionInput::new()),
            Err(WorkflowError::GuardFailed { .. })
        ));
        let input = TransitionInput::new().with_reviewers(["r1"]);
        assert!(wf.validate(Light::Amber, Light::Red, &input).is_ok());
    }
}
