//! Domain model types used throughout revdiff.
//!
//! These types bridge the version store, the comparison engine, and the
//! reconciliation workflow.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// The closed set of named sections a revision's source is split into.
///
/// The ordering of the variants is the order sections are diffed and
/// reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// Template / markup source.
    Markup,
    /// Scripted behaviour (functions, classes, props).
    Logic,
    /// Stylesheets.
    Styles,
    /// Component configuration and metadata.
    Config,
}

impl SectionKind {
    /// Every section kind, in reporting order.
    pub const ALL: [SectionKind; 4] = [Self::Markup, Self::Logic, Self::Styles, Self::Config];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markup => "markup",
            Self::Logic => "logic",
            Self::Styles => "styles",
            Self::Config => "config",
        }
    }

    /// Parse a section name. Returns `None` for names outside the closed set.
    pub fn from_str_val(s: &str) -> Option<Self> {
        match s {
            "markup" => Some(Self::Markup),
            "logic" => Some(Self::Logic),
            "styles" => Some(Self::Styles),
            "config" => Some(Self::Config),
            _ => None,
        }
    }
}

impl std::fmt::Display for SectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Revision
// ---------------------------------------------------------------------------

/// Publication status of a revision.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RevisionStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl std::fmt::Display for RevisionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Published => write!(f, "published"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

/// An immutable snapshot of a component's source.
///
/// Revisions are owned by the version store and handed out as shared
/// snapshots; the core only ever reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: String,
    pub version: Version,
    #[serde(default)]
    pub sections: BTreeMap<SectionKind, String>,
    pub created_at: DateTime<Utc>,
    pub author_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub status: RevisionStatus,
}

impl Revision {
    /// Create a root revision with no sections.
    pub fn new(id: impl Into<String>, version: Version, author_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version,
            sections: BTreeMap::new(),
            created_at: Utc::now(),
            author_id: author_id.into(),
            parent_id: None,
            status: RevisionStatus::Draft,
        }
    }

    /// Builder-style helper that sets one section's text.
    pub fn with_section(mut self, kind: SectionKind, text: impl Into<String>) -> Self {
        self.sections.insert(kind, text.into());
        self
    }

    /// Builder-style helper that sets the parent revision.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Text of a section, or the empty string when the section is absent.
    pub fn section_text(&self, kind: SectionKind) -> &str {
        self.sections.get(&kind).map(String::as_str).unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Candidate revision
// ---------------------------------------------------------------------------

/// An unsaved revision produced by reconciliation.
///
/// The version store assigns the final id and creation time when the
/// candidate is persisted. If `version` is left unset the store applies its
/// own numbering policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRevision {
    pub parent_id: String,
    pub sections: BTreeMap<SectionKind, String>,
    #[serde(default)]
    pub version: Option<Version>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub status: RevisionStatus,
}

impl CandidateRevision {
    pub fn new(parent_id: impl Into<String>, sections: BTreeMap<SectionKind, String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            sections,
            version: None,
            author_id: None,
            status: RevisionStatus::Draft,
        }
    }

    /// Set the version the candidate should be saved under.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Set the author recorded on the saved revision.
    pub fn with_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    /// Text of a section, or the empty string when the section is absent.
    pub fn section_text(&self, kind: SectionKind) -> &str {
        self.sections.get(&kind).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_kind_round_trip_names() {
        for kind in SectionKind::ALL {
            assert_eq!(SectionKind::from_str_val(kind.as_str()), Some(kind));
        }
        assert_eq!(SectionKind::from_str_val("scripts"), None);
    }

    #[test]
    fn test_revision_json_shape() {
        let rev = Revision::new("r1", Version::new(1, 0, 0), "alice")
            .with_section(SectionKind::Logic, "function foo(){}")
            .with_parent("r0");
        let json = serde_json::to_value(&rev).unwrap();
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["parentId"], "r0");
        assert_eq!(json["authorId"], "alice");
        assert_eq!(json["status"], "draft");
        assert_eq!(json["sections"]["logic"], "function foo(){}");
    }

    #[test]
    fn test_section_text_defaults_to_empty() {
        let rev = Revision::new("r1", Version::new(0, 1, 0), "bob");
        assert_eq!(rev.section_text(SectionKind::Styles), "");
    }

    #[test]
    fn test_unknown_section_rejected_on_deserialize() {
        let json = r#"{
            "id": "r1",
            "version": "1.0.0",
            "sections": { "scripts": "x" },
            "createdAt": "2025-01-01T00:00:00Z",
            "authorId": "a"
        }"#;
        assert!(serde_json::from_str::<Revision>(json).is_err());
    }
}
