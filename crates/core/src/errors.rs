//! Error types for the revdiff core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.
//!
//! Diffing, classification and comparison are total functions and have no
//! error type of their own; every failure surfaces from the version store,
//! from a malformed decision set, or from configuration.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Review(#[from] ReviewError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Version store errors
// ---------------------------------------------------------------------------

/// Errors raised by a [`VersionStore`](crate::store::VersionStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested revision id could not be resolved.
    #[error("revision not found: {0}")]
    RevisionNotFound(String),

    /// A candidate names a parent the store does not know.
    #[error("parent revision not found: {0}")]
    ParentNotFound(String),

    /// The candidate version does not exceed an ancestor's version.
    #[error("version {version} must be greater than ancestor {ancestor_id} at {ancestor_version}")]
    VersionNotIncreasing {
        version: String,
        ancestor_id: String,
        ancestor_version: String,
    },

    /// The parent chain loops back on itself.
    #[error("revision lineage contains a cycle at {0}")]
    LineageCycle(String),

    /// A revision with this id already exists.
    #[error("revision {0} already exists")]
    DuplicateRevision(String),

    /// Backend-specific failure (I/O, network, ...).
    #[error("version store backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Reconciliation errors
// ---------------------------------------------------------------------------

/// Errors from turning decisions over a comparison into a candidate revision.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// Two decisions cannot be applied independently of each other.
    #[error("overlapping decisions in section '{section}' for hunks {hunk_ids:?}")]
    OverlappingDecisionConflict {
        section: String,
        hunk_ids: Vec<String>,
    },

    /// A decision references a hunk id the comparison does not contain.
    #[error("decision references unknown hunk '{0}'")]
    InvalidSectionReference(String),

    /// The revision content no longer matches what the hunk describes.
    #[error("hunk '{hunk_id}' does not match the current content of section '{section}'")]
    StaleHunk { hunk_id: String, section: String },

    /// The supplied revision is not the comparison's target revision.
    #[error("comparison targets revision {expected}, got {actual}")]
    RevisionMismatch { expected: String, actual: String },
}

// ---------------------------------------------------------------------------
// Review session errors
// ---------------------------------------------------------------------------

/// Errors from the comparison review lifecycle.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// A state-machine transition was invalid.
    #[error("invalid review state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Reconciliation of the reviewed comparison failed.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = StoreError::RevisionNotFound("rev-42".into());
        assert_eq!(err.to_string(), "revision not found: rev-42");

        let err = ReconcileError::InvalidSectionReference("logic-9".into());
        assert_eq!(err.to_string(), "decision references unknown hunk 'logic-9'");

        let err = ReconcileError::OverlappingDecisionConflict {
            section: "logic".into(),
            hunk_ids: vec!["logic-0".into(), "logic-1".into()],
        };
        assert!(err.to_string().contains("logic-1"));

        let err = ConfigError::InvalidValue {
            field: "classifier.large_hunk_threshold".into(),
            detail: "must be > 0".into(),
        };
        assert!(err.to_string().contains("large_hunk_threshold"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let store_err = StoreError::RevisionNotFound("x".into());
        let core_err: CoreError = store_err.into();
        assert!(matches!(
            core_err,
            CoreError::Store(StoreError::RevisionNotFound(_))
        ));

        let review_err: ReviewError = ReconcileError::InvalidSectionReference("h".into()).into();
        let core_err: CoreError = review_err.into();
        assert!(matches!(core_err, CoreError::Review(ReviewError::Reconcile(_))));
    }

    #[test]
    fn test_transparent_display_preserves_root_cause() {
        let core_err: CoreError = StoreError::RevisionNotFound("abc".into()).into();
        assert_eq!(core_err.to_string(), "revision not found: abc");
    }
}
