//! Selective reconciliation of a comparison into a new candidate revision.
//!
//! The reconcile subsystem is responsible for:
//! 1. **Decisions** -- per-hunk accept / reject choices.
//! 2. **Reconciliation** -- rolling rejected hunks back to their old text.
//! 3. **Review lifecycle** -- the `Built -> Reviewing -> Reconciled` state machine.

pub mod engine;
pub mod session;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use engine::ReconciliationEngine;
pub use session::{ReviewSession, ReviewState};

/// A user's choice for one hunk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Keep the `to` revision's content.
    Accept,
    /// Roll the hunk back to the `from` revision's content.
    Reject,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "accept"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// A recorded decision for one hunk of a comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationDecision {
    pub hunk_id: String,
    pub decision: Decision,
    pub decided_at: DateTime<Utc>,
}

impl ReconciliationDecision {
    pub fn new(hunk_id: impl Into<String>, decision: Decision) -> Self {
        Self {
            hunk_id: hunk_id.into(),
            decision,
            decided_at: Utc::now(),
        }
    }

    pub fn accept(hunk_id: impl Into<String>) -> Self {
        Self::new(hunk_id, Decision::Accept)
    }

    pub fn reject(hunk_id: impl Into<String>) -> Self {
        Self::new(hunk_id, Decision::Reject)
    }
}
