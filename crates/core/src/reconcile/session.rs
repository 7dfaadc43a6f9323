//! Review session lifecycle.
//!
//! A session wraps one built comparison and collects decisions for it:
//!
//! ```text
//! Built --decide--> Reviewing --reconcile--> Reconciled
//!   \______________reconcile_______________/
//! ```
//!
//! Reconciling with no decisions applies the default decision to every hunk.
//! A reconciled session is final.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Decision, ReconciliationDecision, ReconciliationEngine};
use crate::comparison::VersionComparison;
use crate::errors::{ReconcileError, ReviewError};
use crate::models::{CandidateRevision, Revision};

/// States of a review session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    Built,
    Reviewing,
    Reconciled,
}

impl std::fmt::Display for ReviewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Built => write!(f, "built"),
            Self::Reviewing => write!(f, "reviewing"),
            Self::Reconciled => write!(f, "reconciled"),
        }
    }
}

/// Decisions in progress for one comparison.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    comparison: Arc<VersionComparison>,
    // Latest decision per hunk; re-deciding replaces.
    decisions: BTreeMap<String, ReconciliationDecision>,
    state: ReviewState,
}

impl ReviewSession {
    pub fn new(comparison: Arc<VersionComparison>) -> Self {
        Self {
            comparison,
            decisions: BTreeMap::new(),
            state: ReviewState::Built,
        }
    }

    pub fn state(&self) -> ReviewState {
        self.state
    }

    pub fn comparison(&self) -> &VersionComparison {
        &self.comparison
    }

    fn transition(&mut self, to: ReviewState) -> Result<(), ReviewError> {
        let allowed = matches!(
            (self.state, to),
            (ReviewState::Built, ReviewState::Reviewing)
                | (ReviewState::Reviewing, ReviewState::Reviewing)
                | (ReviewState::Built, ReviewState::Reconciled)
                | (ReviewState::Reviewing, ReviewState::Reconciled)
        );
        if !allowed {
            return Err(ReviewError::InvalidStateTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        debug!(from = %self.state, to = %to, comparison = %self.comparison.id, "review state transition");
        self.state = to;
        Ok(())
    }

    /// Record a decision for `hunk_id`, replacing any earlier one.
    pub fn decide(&mut self, hunk_id: &str, decision: Decision) -> Result<(), ReviewError> {
        if self.comparison.hunk(hunk_id).is_none() {
            return Err(ReconcileError::InvalidSectionReference(hunk_id.to_string()).into());
        }
        self.transition(ReviewState::Reviewing)?;
        self.decisions
            .insert(hunk_id.to_string(), ReconciliationDecision::new(hunk_id, decision));
        Ok(())
    }

    pub fn accept(&mut self, hunk_id: &str) -> Result<(), ReviewError> {
        self.decide(hunk_id, Decision::Accept)
    }

    pub fn reject(&mut self, hunk_id: &str) -> Result<(), ReviewError> {
        self.decide(hunk_id, Decision::Reject)
    }

    /// Apply `decision` to every hunk of the comparison.
    pub fn decide_all(&mut self, decision: Decision) -> Result<(), ReviewError> {
        let ids: Vec<String> = self.comparison.hunks.iter().map(|h| h.hunk.id.clone()).collect();
        for id in ids {
            self.decide(&id, decision)?;
        }
        Ok(())
    }

    /// Decisions recorded so far, in hunk id order.
    pub fn decisions(&self) -> Vec<ReconciliationDecision> {
        self.decisions.values().cloned().collect()
    }

    /// Hunks with no explicit decision, in diff order.
    pub fn pending(&self) -> Vec<&str> {
        self.comparison
            .hunks
            .iter()
            .map(|h| h.hunk.id.as_str())
            .filter(|id| !self.decisions.contains_key(*id))
            .collect()
    }

    /// Produce the candidate revision and close the session.
    pub fn reconcile(
        &mut self,
        engine: &ReconciliationEngine,
        to: &Revision,
    ) -> Result<CandidateRevision, ReviewError> {
        if self.state == ReviewState::Reconciled {
            return Err(ReviewError::InvalidStateTransition {
                from: self.state.to_string(),
                to: ReviewState::Reconciled.to_string(),
            });
        }
        let candidate = engine.reconcile(&self.comparison, to, &self.decisions())?;
        self.transition(ReviewState::Reconciled)?;
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::ComparisonBuilder;
    use crate::models::SectionKind;
    use semver::Version;

    fn setup() -> (Revision, Revision, ReviewSession) {
        let from = Revision::new("r1", Version::new(1, 0, 0), "alice")
            .with_section(SectionKind::Logic, "a\nb\nc\nd");
        let to = Revision::new("r2", Version::new(1, 1, 0), "alice")
            .with_section(SectionKind::Logic, "A\nb\nc\nD");
        let cmp = ComparisonBuilder::with_defaults().unwrap().compare(&from, &to);
        (from, to, ReviewSession::new(Arc::new(cmp)))
    }

    #[test]
    fn test_new_session_is_built() {
        let (_, _, session) = setup();
        assert_eq!(session.state(), ReviewState::Built);
        assert_eq!(session.pending(), vec!["logic-0", "logic-1"]);
    }

    #[test]
    fn test_decide_moves_to_reviewing_and_replaces() {
        let (_, to, mut session) = setup();
        session.reject("logic-0").unwrap();
        assert_eq!(session.state(), ReviewState::Reviewing);
        session.accept("logic-0").unwrap();
        assert_eq!(session.decisions().len(), 1);
        assert_eq!(session.decisions()[0].decision, Decision::Accept);
        assert_eq!(session.pending(), vec!["logic-1"]);

        let candidate = session
            .reconcile(&ReconciliationEngine::default(), &to)
            .unwrap();
        assert_eq!(candidate.section_text(SectionKind::Logic), "A\nb\nc\nD");
    }

    #[test]
    fn test_reject_all_then_reconcile() {
        let (from, to, mut session) = setup();
        session.decide_all(Decision::Reject).unwrap();
        let candidate = session
            .reconcile(&ReconciliationEngine::default(), &to)
            .unwrap();
        assert_eq!(session.state(), ReviewState::Reconciled);
        assert_eq!(candidate.sections, from.sections);
    }

    #[test]
    fn test_reconcile_without_decisions_uses_default() {
        let (_, to, mut session) = setup();
        let candidate = session
            .reconcile(&ReconciliationEngine::default(), &to)
            .unwrap();
        assert_eq!(candidate.sections, to.sections);
    }

    #[test]
    fn test_reconciled_session_is_final() {
        let (_, to, mut session) = setup();
        session
            .reconcile(&ReconciliationEngine::default(), &to)
            .unwrap();

        let err = session.reject("logic-0").unwrap_err();
        assert!(matches!(err, ReviewError::InvalidStateTransition { .. }));
        assert_eq!(
            err.to_string(),
            "invalid review state transition from reconciled to reviewing"
        );

        let err = session
            .reconcile(&ReconciliationEngine::default(), &to)
            .unwrap_err();
        assert!(matches!(err, ReviewError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_unknown_hunk_rejected() {
        let (_, _, mut session) = setup();
        let err = session.accept("markup-0").unwrap_err();
        assert!(matches!(
            err,
            ReviewError::Reconcile(ReconcileError::InvalidSectionReference(_))
        ));
        assert_eq!(session.state(), ReviewState::Built);
    }

    #[test]
    fn test_failed_reconcile_keeps_session_open() {
        let (from, _, mut session) = setup();
        let err = session
            .reconcile(&ReconciliationEngine::default(), &from)
            .unwrap_err();
        assert!(matches!(
            err,
            ReviewError::Reconcile(ReconcileError::RevisionMismatch { .. })
        ));
        assert_eq!(session.state(), ReviewState::Built);
    }
}
