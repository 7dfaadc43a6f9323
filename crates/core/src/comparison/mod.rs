//! Revision comparison: classification, aggregation and caching.
//!
//! The comparison subsystem is responsible for:
//! 1. **Classification** -- tagging hunks with severity and breaking-change signals.
//! 2. **Building** -- diffing every section of two revisions into a [`VersionComparison`].
//! 3. **Caching** -- reusing comparisons keyed by the revision-id pair.

pub mod builder;
pub mod cache;
pub mod classifier;

use serde::{Deserialize, Serialize};

use crate::diff::ChangeType;
use crate::models::SectionKind;

pub use builder::{comparison_id, ComparisonBuilder};
pub use cache::{CacheStats, ComparisonCache};
pub use classifier::{ChangeClassifier, ClassifiedHunk, ClassifierSettings, ClassifyContext, Severity};

/// Coarse risk classification of a whole comparison.
pub type ImpactLevel = Severity;

/// Aggregate statistics derived from a comparison's hunks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub total_changes: usize,
    pub additions_count: usize,
    pub deletions_count: usize,
    pub modifications_count: usize,
    /// Distinct sections touched by at least one hunk.
    pub files_changed: usize,
    pub impact_level: ImpactLevel,
    pub breaking_changes: bool,
}

impl ComparisonSummary {
    /// Recompute the summary from a set of classified hunks.
    pub fn from_hunks(hunks: &[ClassifiedHunk]) -> Self {
        let mut summary = Self::default();
        let mut sections: Vec<SectionKind> = Vec::new();
        let mut max_severity = Severity::Low;

        for h in hunks {
            match h.hunk.change_type {
                ChangeType::Added => summary.additions_count += 1,
                ChangeType::Removed => summary.deletions_count += 1,
                ChangeType::Modified => summary.modifications_count += 1,
            }
            if !sections.contains(&h.hunk.section) {
                sections.push(h.hunk.section);
            }
            summary.breaking_changes |= h.breaking;
            max_severity = max_severity.max(h.severity);
        }

        summary.total_changes =
            summary.additions_count + summary.deletions_count + summary.modifications_count;
        summary.files_changed = sections.len();
        summary.impact_level = if summary.breaking_changes {
            Severity::High
        } else {
            max_severity
        };
        summary
    }
}

/// The result of comparing one revision to another.
///
/// Comparisons are ephemeral, immutable once built, and fully determined by
/// the two revisions they were built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionComparison {
    pub id: String,
    pub from_revision_id: String,
    pub to_revision_id: String,
    pub hunks: Vec<ClassifiedHunk>,
    pub summary: ComparisonSummary,
    /// Sections declared by the `from` revision.
    #[serde(default)]
    pub from_sections: Vec<SectionKind>,
    /// Sections declared by the `to` revision.
    #[serde(default)]
    pub to_sections: Vec<SectionKind>,
}

impl VersionComparison {
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Look up a hunk by id.
    pub fn hunk(&self, id: &str) -> Option<&ClassifiedHunk> {
        self.hunks.iter().find(|h| h.hunk.id == id)
    }

    /// Hunks of one section, in diff order.
    pub fn hunks_in(&self, section: SectionKind) -> impl Iterator<Item = &ClassifiedHunk> {
        self.hunks.iter().filter(move |h| h.hunk.section == section)
    }

    /// Sections touched by at least one hunk, in reporting order.
    pub fn changed_sections(&self) -> Vec<SectionKind> {
        let mut sections: Vec<SectionKind> = self.hunks.iter().map(|h| h.hunk.section).collect();
        sections.dedup();
        sections
    }

    /// Serialize to the JSON wire shape.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
