//! Change classification.
//!
//! Tags each hunk with a severity and a breaking-change flag. Breaking
//! changes are detected with pattern matching over public symbol
//! declarations; this is a best-effort heuristic, not static analysis.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diff::{ChangeType, DiffHunk};
use crate::errors::ConfigError;
use crate::models::SectionKind;

/// A modified hunk spanning more lines than this is high severity.
pub const DEFAULT_LARGE_HUNK_THRESHOLD: usize = 20;

/// Declarations of publicly visible symbols. Group 1 captures the name.
pub const PUBLIC_SYMBOL_PATTERNS: &[&str] = &[
    // export function foo / export default class Foo / export const foo ...
    r"\bexport\s+(?:default\s+)?(?:declare\s+)?(?:async\s+)?(?:abstract\s+)?(?:function\*?|class|const|let|var|interface|type|enum)\s+([A-Za-z_$][\w$]*)",
    // exports.foo = / module.exports.foo =
    r"\bexports\.([A-Za-z_$][\w$]*)\s*=",
    // pub fn foo / pub(crate) struct Foo ...
    r"\bpub(?:\([^)]*\))?\s+(?:async\s+)?(?:unsafe\s+)?(?:fn|struct|enum|trait|type|const|static|mod)\s+([A-Za-z_]\w*)",
];

/// `export { a, b as c }` re-export lists.
const EXPORT_LIST_PATTERN: &str = r"\bexport\s*(?:type\s*)?\{([^}]*)\}";

/// Severity of a single change, also used as the comparison impact level.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// A hunk annotated by the classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedHunk {
    #[serde(flatten)]
    pub hunk: DiffHunk,
    pub severity: Severity,
    pub breaking: bool,
    /// Public symbols declared in the old text that the new text lost.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_symbols: Vec<String>,
}

/// Per-call classification context.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext {
    pub section: SectionKind,
}

/// Tunable inputs of the classifier.
#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub large_hunk_threshold: usize,
    pub code_sections: Vec<SectionKind>,
    pub extra_public_patterns: Vec<String>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            large_hunk_threshold: DEFAULT_LARGE_HUNK_THRESHOLD,
            code_sections: vec![SectionKind::Logic],
            extra_public_patterns: Vec::new(),
        }
    }
}

/// Heuristic change classifier.
#[derive(Debug, Clone)]
pub struct ChangeClassifier {
    large_hunk_threshold: usize,
    code_sections: Vec<SectionKind>,
    symbol_patterns: Vec<Regex>,
    export_list: Regex,
}

impl ChangeClassifier {
    /// Build a classifier, compiling the built-in and configured patterns.
    pub fn new(settings: ClassifierSettings) -> Result<Self, ConfigError> {
        let compile = |field: &str, pattern: &str| {
            Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
                field: field.to_string(),
                detail: e.to_string(),
            })
        };

        let mut symbol_patterns = Vec::new();
        for pattern in PUBLIC_SYMBOL_PATTERNS {
            symbol_patterns.push(compile("classifier.builtin_patterns", pattern)?);
        }
        for (i, pattern) in settings.extra_public_patterns.iter().enumerate() {
            symbol_patterns.push(compile(
                &format!("classifier.extra_public_patterns[{i}]"),
                pattern,
            )?);
        }

        Ok(Self {
            large_hunk_threshold: settings.large_hunk_threshold,
            code_sections: settings.code_sections,
            symbol_patterns,
            export_list: compile("classifier.builtin_patterns", EXPORT_LIST_PATTERN)?,
        })
    }

    /// Classifier with the default thresholds and patterns.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::new(ClassifierSettings::default())
    }

    pub fn is_code_section(&self, section: SectionKind) -> bool {
        self.code_sections.contains(&section)
    }

    /// Classify the hunks of one section.
    pub fn classify(&self, hunks: Vec<DiffHunk>, context: &ClassifyContext) -> Vec<ClassifiedHunk> {
        let is_code = self.is_code_section(context.section);
        hunks
            .into_iter()
            .map(|hunk| self.classify_hunk(hunk, is_code))
            .collect()
    }

    fn classify_hunk(&self, hunk: DiffHunk, is_code: bool) -> ClassifiedHunk {
        let removed_symbols = if is_code && !hunk.old_text.is_empty() {
            self.removed_public_symbols(&hunk.old_text, &hunk.new_text)
        } else {
            Vec::new()
        };
        let breaking = !removed_symbols.is_empty();

        let severity = match hunk.change_type {
            ChangeType::Added => Severity::Low,
            ChangeType::Removed if !is_code => Severity::Low,
            ChangeType::Removed if breaking => Severity::High,
            ChangeType::Removed => Severity::Medium,
            ChangeType::Modified
                if breaking || hunk.span_lines() > self.large_hunk_threshold =>
            {
                Severity::High
            }
            ChangeType::Modified => Severity::Medium,
        };

        if breaking {
            debug!(
                hunk = %hunk.id,
                symbols = ?removed_symbols,
                "breaking change detected"
            );
        }

        ClassifiedHunk {
            hunk,
            severity,
            breaking,
            removed_symbols,
        }
    }

    /// Public symbols declared in `old` whose names do not appear as whole
    /// identifiers in `new`. Sorted and de-duplicated.
    pub fn removed_public_symbols(&self, old: &str, new: &str) -> Vec<String> {
        let mut removed: Vec<String> = self
            .public_symbols(old)
            .into_iter()
            .filter(|name| !contains_identifier(new, name))
            .collect();
        removed.sort();
        removed.dedup();
        removed
    }

    /// Names of the public symbols declared in `text`.
    pub fn public_symbols(&self, text: &str) -> Vec<String> {
        let mut names = Vec::new();
        for re in &self.symbol_patterns {
            for caps in re.captures_iter(text) {
                if let Some(m) = caps.get(1) {
                    names.push(m.as_str().to_string());
                }
            }
        }
        for caps in self.export_list.captures_iter(text) {
            let Some(list) = caps.get(1) else { continue };
            for item in list.as_str().split(',') {
                // `a as b` exports the name `b`.
                let exported = item.rsplit(" as ").next().unwrap_or(item).trim();
                let exported = exported.strip_prefix("type ").unwrap_or(exported).trim();
                if !exported.is_empty() && exported.chars().all(is_identifier_char) {
                    names.push(exported.to_string());
                }
            }
        }
        names
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Whether `name` occurs in `text` bounded by non-identifier characters.
pub fn contains_identifier(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    text.match_indices(name).any(|(pos, _)| {
        let before = text[..pos].chars().next_back();
        let after = text[pos + name.len()..].chars().next();
        !before.is_some_and(is_identifier_char) && !after.is_some_and(is_identifier_char)
    })
}
