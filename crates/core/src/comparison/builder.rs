//! Comparison builder.
//!
//! Orchestrates section extraction, text diffing and classification across
//! two revisions. Building is pure: the same pair of revisions always yields
//! a structurally identical comparison with the same id.

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use super::classifier::{ChangeClassifier, ClassifyContext};
use super::{ComparisonSummary, VersionComparison};
use crate::config::AppConfig;
use crate::diff::TextDiffer;
use crate::errors::ConfigError;
use crate::models::Revision;
use crate::sections::SectionExtractor;

/// Deterministic comparison id for a revision-id pair.
pub fn comparison_id(from_id: &str, to_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(from_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(to_id.as_bytes());
    let digest = hasher.finalize();
    format!("cmp-{}", hex::encode(&digest[..12]))
}

/// Builds [`VersionComparison`]s from pairs of revisions.
#[derive(Debug, Clone)]
pub struct ComparisonBuilder {
    differ: TextDiffer,
    classifier: ChangeClassifier,
}

impl ComparisonBuilder {
    pub fn new(differ: TextDiffer, classifier: ChangeClassifier) -> Self {
        Self { differ, classifier }
    }

    /// Builder configured from the `[diff]` and `[classifier]` sections.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            TextDiffer::new(config.diff.coalesce_gap),
            ChangeClassifier::new(config.classifier.settings())?,
        ))
    }

    /// Builder with default thresholds.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::from_config(&AppConfig::default())
    }

    pub fn classifier(&self) -> &ChangeClassifier {
        &self.classifier
    }

    /// Compare `from` to `to`.
    ///
    /// A section present in only one revision is diffed against empty text,
    /// yielding a whole-section addition or removal. Identical revisions
    /// yield a comparison with no hunks.
    pub fn compare(&self, from: &Revision, to: &Revision) -> VersionComparison {
        info!(from = %from.id, to = %to.id, "building comparison");

        let old_sections = SectionExtractor::extract(from);
        let new_sections = SectionExtractor::extract(to);

        let mut hunks = Vec::new();
        for section in SectionExtractor::union_keys(&old_sections, &new_sections) {
            let old = SectionExtractor::text(&old_sections, section);
            let new = SectionExtractor::text(&new_sections, section);

            let raw = self.differ.diff(section, old, new);
            if raw.is_empty() {
                continue;
            }
            debug!(%section, hunks = raw.len(), "section changed");
            hunks.extend(self.classifier.classify(raw, &ClassifyContext { section }));
        }

        let summary = ComparisonSummary::from_hunks(&hunks);
        info!(
            from = %from.id,
            to = %to.id,
            total = summary.total_changes,
            impact = %summary.impact_level,
            breaking = summary.breaking_changes,
            "comparison built"
        );

        VersionComparison {
            id: comparison_id(&from.id, &to.id),
            from_revision_id: from.id.clone(),
            to_revision_id: to.id.clone(),
            hunks,
            summary,
            from_sections: old_sections.keys().copied().collect(),
            to_sections: new_sections.keys().copied().collect(),
        }
    }
}
