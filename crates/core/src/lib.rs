//! revdiff core library.
//!
//! This crate provides the foundational components for comparing revisions of
//! a sectioned source document: line diffing, section extraction, change
//! classification, comparison building and caching, selective reconciliation,
//! and the version store boundary.

pub mod comparison;
pub mod config;
pub mod diff;
pub mod errors;
pub mod models;
pub mod reconcile;
pub mod sections;
pub mod service;
pub mod store;

// Re-exports for convenience.
pub use comparison::{ComparisonBuilder, ComparisonSummary, ImpactLevel, Severity, VersionComparison};
pub use config::AppConfig;
pub use diff::{render_unified_patch, DiffHunk, TextDiffer};
pub use errors::CoreError;
pub use models::{CandidateRevision, Revision, SectionKind};
pub use reconcile::{Decision, ReconciliationDecision, ReconciliationEngine, ReviewSession};
pub use service::VersionService;
pub use store::{InMemoryVersionStore, VersionStore};
