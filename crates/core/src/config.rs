//! TOML-based configuration for revdiff.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration. The heuristic thresholds of the classifier live
//! here rather than as literals in the engine.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::comparison::classifier::{ClassifierSettings, DEFAULT_LARGE_HUNK_THRESHOLD};
use crate::diff::DEFAULT_COALESCE_GAP;
use crate::errors::ConfigError;
use crate::models::SectionKind;
use crate::reconcile::Decision;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text diff settings.
    #[serde(default)]
    pub diff: DiffConfig,

    /// Change classification heuristics.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Reconciliation behaviour.
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Comparison cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

/// Text diff configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Maximum number of unchanged lines between a removal and an addition
    /// for the two to be merged into one `modified` hunk (default 0).
    #[serde(default = "default_coalesce_gap")]
    pub coalesce_gap: usize,
}

fn default_coalesce_gap() -> usize {
    DEFAULT_COALESCE_GAP
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            coalesce_gap: default_coalesce_gap(),
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Change classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// A modified hunk spanning more lines than this is high severity
    /// (default 20).
    #[serde(default = "default_large_hunk_threshold")]
    pub large_hunk_threshold: usize,

    /// Sections treated as code for breaking-change detection.
    #[serde(default = "default_code_sections")]
    pub code_sections: Vec<SectionKind>,

    /// Additional regular expressions declaring public symbols. Each pattern
    /// must capture the symbol name in its first group.
    #[serde(default)]
    pub extra_public_patterns: Vec<String>,
}

fn default_large_hunk_threshold() -> usize {
    DEFAULT_LARGE_HUNK_THRESHOLD
}
fn default_code_sections() -> Vec<SectionKind> {
    vec![SectionKind::Logic]
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            large_hunk_threshold: default_large_hunk_threshold(),
            code_sections: default_code_sections(),
            extra_public_patterns: Vec::new(),
        }
    }
}

impl ClassifierConfig {
    /// Convert into the settings consumed by the classifier.
    pub fn settings(&self) -> ClassifierSettings {
        ClassifierSettings {
            large_hunk_threshold: self.large_hunk_threshold,
            code_sections: self.code_sections.clone(),
            extra_public_patterns: self.extra_public_patterns.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reconcile
// ---------------------------------------------------------------------------

/// Reconciliation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Decision applied to hunks the user did not explicitly decide.
    #[serde(default = "default_decision")]
    pub default_decision: Decision,
}

fn default_decision() -> Decision {
    Decision::Accept
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            default_decision: default_decision(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Comparison cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether built comparisons are cached by revision-id pair.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of cached comparisons (default 256).
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_true() -> bool {
    true
}
fn default_max_entries() -> usize {
    256
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Validate that all values are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.classifier.large_hunk_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                field: "classifier.large_hunk_threshold".into(),
                detail: "threshold must be > 0".into(),
            });
        }
        for (i, pattern) in self.classifier.extra_public_patterns.iter().enumerate() {
            let re = regex_lite::Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
                field: format!("classifier.extra_public_patterns[{i}]"),
                detail: e.to_string(),
            })?;
            if re.captures_len() < 2 {
                return Err(ConfigError::InvalidValue {
                    field: format!("classifier.extra_public_patterns[{i}]"),
                    detail: "pattern must capture the symbol name in group 1".into(),
                });
            }
        }
        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.max_entries".into(),
                detail: "cache size must be > 0 when the cache is enabled".into(),
            });
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "logging.level".into(),
                detail: format!("expected one of {}", LOG_LEVELS.join(", ")),
            });
        }

        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[diff]
coalesce_gap = 1

[classifier]
large_hunk_threshold = 40
code_sections = ["logic", "config"]
extra_public_patterns = ['defineProps<\w+>\(\s*(\w+)']

[reconcile]
default_decision = "reject"

[cache]
enabled = true
max_entries = 32

[logging]
level = "debug"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.diff.coalesce_gap, 1);
        assert_eq!(config.classifier.large_hunk_threshold, 40);
        assert_eq!(
            config.classifier.code_sections,
            vec![SectionKind::Logic, SectionKind::Config]
        );
        assert_eq!(config.reconcile.default_decision, Decision::Reject);
        assert_eq!(config.cache.max_entries, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.diff.coalesce_gap, 0);
        assert_eq!(config.classifier.large_hunk_threshold, 20);
        assert_eq!(config.classifier.code_sections, vec![SectionKind::Logic]);
        assert_eq!(config.reconcile.default_decision, Decision::Accept);
        assert!(config.cache.enabled);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revdiff.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = AppConfig::load_and_validate(&path).expect("load_and_validate failed");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_file_not_found() {
        let result = AppConfig::load_from_file("/nonexistent/revdiff.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[diff\ncoalesce_gap = ").unwrap();
        let result = AppConfig::load_from_file(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let mut config = AppConfig::default();
        config.classifier.large_hunk_threshold = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "classifier.large_hunk_threshold"
        ));
    }

    #[test]
    fn test_validate_rejects_pattern_without_group() {
        let mut config = AppConfig::default();
        config.classifier.extra_public_patterns = vec![r"export\s+\w+".into()];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field.starts_with("classifier.extra_public_patterns")
        ));
    }

    #[test]
    fn test_validate_rejects_bad_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".into();
        assert!(config.validate().is_err());
    }
}
