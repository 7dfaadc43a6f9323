//! Reconciliation engine.
//!
//! Starts from the comparison's `to` revision and replaces the new-side span
//! of every rejected hunk with its old text. Accepted hunks, explicit or by
//! default, keep the `to` content.

use std::collections::HashMap;

use tracing::{debug, info};

use super::{Decision, ReconciliationDecision};
use crate::comparison::{ClassifiedHunk, VersionComparison};
use crate::config::AppConfig;
use crate::diff::hunk::{join_lines, resolve_spans, split_lines, HunkSpan};
use crate::errors::ReconcileError;
use crate::models::{CandidateRevision, Revision, SectionKind};

/// Stateless reconciliation engine.
#[derive(Debug, Clone, Copy)]
pub struct ReconciliationEngine {
    default_decision: Decision,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new(Decision::Accept)
    }
}

impl ReconciliationEngine {
    /// Create an engine applying `default_decision` to undecided hunks.
    pub fn new(default_decision: Decision) -> Self {
        Self { default_decision }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.reconcile.default_decision)
    }

    pub fn default_decision(&self) -> Decision {
        self.default_decision
    }

    /// Produce a candidate revision from `comparison`, the revision it
    /// targets, and the user's decisions.
    pub fn reconcile(
        &self,
        comparison: &VersionComparison,
        to: &Revision,
        decisions: &[ReconciliationDecision],
    ) -> Result<CandidateRevision, ReconcileError> {
        if to.id != comparison.to_revision_id {
            return Err(ReconcileError::RevisionMismatch {
                expected: comparison.to_revision_id.clone(),
                actual: to.id.clone(),
            });
        }

        let explicit = index_decisions(comparison, decisions)?;
        let effective = |hunk: &ClassifiedHunk| {
            explicit
                .get(hunk.hunk.id.as_str())
                .copied()
                .unwrap_or(self.default_decision)
        };

        info!(
            comparison = %comparison.id,
            hunks = comparison.hunks.len(),
            decisions = decisions.len(),
            default = %self.default_decision,
            "reconciling comparison"
        );

        let mut sections = to.sections.clone();
        let mut rejected_total = 0;

        for section in comparison.changed_sections() {
            let hunks: Vec<&ClassifiedHunk> = comparison.hunks_in(section).collect();
            let spans = resolve_spans(hunks.iter().map(|h| &h.hunk)).map_err(|e| {
                ReconcileError::StaleHunk {
                    hunk_id: e.hunk_id,
                    section: e.section.to_string(),
                }
            })?;

            let mut rejected: Vec<(&ClassifiedHunk, HunkSpan)> = hunks
                .iter()
                .zip(&spans)
                .filter(|(h, _)| effective(**h) == Decision::Reject)
                .map(|(h, span)| (*h, *span))
                .collect();
            if rejected.is_empty() {
                continue;
            }
            let all_rejected = rejected.len() == hunks.len();
            rejected_total += rejected.len();

            rejected.sort_by_key(|(_, span)| (span.new_start, span.new_end()));
            check_overlaps(section, &rejected)?;

            let text = roll_back(section, to.section_text(section), &rejected)?;
            debug!(%section, rejected = rejected.len(), "section rolled back");

            let declared = if all_rejected {
                comparison.from_sections.contains(&section)
            } else {
                comparison.to_sections.contains(&section)
            };
            if !text.is_empty() || declared {
                sections.insert(section, text);
            } else {
                sections.remove(&section);
            }
        }

        info!(
            comparison = %comparison.id,
            rejected = rejected_total,
            "candidate revision produced"
        );
        Ok(CandidateRevision::new(to.id.clone(), sections))
    }
}

/// Map hunk id to decision, rejecting unknown ids and contradictions.
fn index_decisions<'a>(
    comparison: &VersionComparison,
    decisions: &'a [ReconciliationDecision],
) -> Result<HashMap<&'a str, Decision>, ReconcileError> {
    let mut explicit: HashMap<&str, Decision> = HashMap::new();
    for d in decisions {
        let hunk = comparison
            .hunk(&d.hunk_id)
            .ok_or_else(|| ReconcileError::InvalidSectionReference(d.hunk_id.clone()))?;
        if let Some(previous) = explicit.insert(d.hunk_id.as_str(), d.decision) {
            if previous != d.decision {
                return Err(ReconcileError::OverlappingDecisionConflict {
                    section: hunk.hunk.section.to_string(),
                    hunk_ids: vec![d.hunk_id.clone()],
                });
            }
        }
    }
    Ok(explicit)
}

/// Rejected spans must be pairwise disjoint on the new side. Two
/// zero-length spans at the same position have no defined order either.
fn check_overlaps(
    section: SectionKind,
    rejected: &[(&ClassifiedHunk, HunkSpan)],
) -> Result<(), ReconcileError> {
    for pair in rejected.windows(2) {
        let (prev, prev_span) = pair[0];
        let (next, next_span) = pair[1];
        if next_span.new_start < prev_span.new_end() || next_span.new_start == prev_span.new_start {
            return Err(ReconcileError::OverlappingDecisionConflict {
                section: section.to_string(),
                hunk_ids: vec![prev.hunk.id.clone(), next.hunk.id.clone()],
            });
        }
    }
    Ok(())
}

/// Replace each rejected hunk's new span in `current` with its old lines.
/// `rejected` must be sorted by position and disjoint.
fn roll_back(
    section: SectionKind,
    current: &str,
    rejected: &[(&ClassifiedHunk, HunkSpan)],
) -> Result<String, ReconcileError> {
    let mut lines = split_lines(current);

    for (hunk, span) in rejected {
        let stale = || ReconcileError::StaleHunk {
            hunk_id: hunk.hunk.id.clone(),
            section: section.to_string(),
        };
        let covered = lines.get(span.new_start..span.new_end()).ok_or_else(stale)?;
        if covered != hunk.hunk.new_lines().as_slice() {
            return Err(stale());
        }
    }

    // Back to front so earlier spans keep their positions.
    for (hunk, span) in rejected.iter().rev() {
        lines.splice(span.new_start..span.new_end(), hunk.hunk.old_lines());
    }
    Ok(join_lines(&lines))
}
