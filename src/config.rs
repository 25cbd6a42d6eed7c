//! Repository policy read from `.thumbs.yml`
//!
//! The file lives in the repository under validation, so it is loaded from
//! the integrated workspace once per validation run.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_norway::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Config filename at the repository root
pub const CONFIG_FILE: &str = ".thumbs.yml";

/// Reviewer count shown when the config does not set one
pub const DEFAULT_MINIMUM_REVIEWERS: u64 = 2;

/// Parsed `.thumbs.yml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThumbsConfig {
    /// Required number of qualifying reviews
    #[serde(default)]
    pub minimum_reviewers: Option<u64>,
    /// Build commands, run in order
    #[serde(default)]
    pub build_steps: Option<Vec<String>>,
    /// Auto-merge switch; only boolean `true` enables it
    #[serde(default)]
    pub merge: Option<Value>,
    /// Count only reviews from members of the repository's organization
    #[serde(default)]
    pub org_mode: bool,
    /// Count each reviewer at most once
    #[serde(default)]
    pub dedupe_reviewers_by_login: bool,
}

impl ThumbsConfig {
    /// Configured build commands, empty when the key is absent
    pub fn build_steps(&self) -> &[String] {
        self.build_steps.as_deref().unwrap_or_default()
    }

    /// Whether `merge` is exactly boolean `true`
    #[must_use]
    pub fn merge_enabled(&self) -> bool {
        matches!(self.merge, Some(Value::Bool(true)))
    }

    /// Reviewer threshold for display, falling back to the default
    #[must_use]
    pub fn effective_minimum_reviewers(&self) -> u64 {
        self.minimum_reviewers.unwrap_or(DEFAULT_MINIMUM_REVIEWERS)
    }

    /// `merge` value as written in the file, for notifications
    #[must_use]
    pub fn merge_display(&self) -> String {
        self.merge.as_ref().map_or_else(
            || "null".to_string(),
            |value| {
                serde_norway::to_string(value)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_else(|_| format!("{value:?}"))
            },
        )
    }
}

/// Parse `.thumbs.yml` content
pub fn parse_config(content: &str) -> Result<ThumbsConfig> {
    serde_norway::from_str(content).map_err(|e| Error::Config(format!("invalid {CONFIG_FILE}: {e}")))
}

/// Source of repository configuration
///
/// Absence is a normal outcome: a repository without a usable config is
/// simply never eligible for automatic merge.
pub trait ConfigSource: Send + Sync {
    /// Load the configuration from a workspace directory
    fn load(&self, dir: &Path) -> Option<ThumbsConfig>;
}

/// Reads `.thumbs.yml` from the workspace root
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlConfigSource;

impl ConfigSource for YamlConfigSource {
    fn load(&self, dir: &Path) -> Option<ThumbsConfig> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "config file not found");
            return None;
        }

        let loaded = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))
            .and_then(|content| parse_config(&content));

        match loaded {
            Ok(config) => {
                debug!(path = %path.display(), ?config, "config loaded");
                Some(config)
            }
            Err(e) => {
                warn!(error = %e, "config loading failed, treating as absent");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            "minimum_reviewers: 1\nbuild_steps:\n  - make build\n  - make test\nmerge: true\norg_mode: true\n",
        )
        .unwrap();

        assert_eq!(config.minimum_reviewers, Some(1));
        assert_eq!(config.build_steps(), ["make build", "make test"]);
        assert!(config.merge_enabled());
        assert!(config.org_mode);
        assert!(!config.dedupe_reviewers_by_login);
    }

    #[test]
    fn test_merge_must_be_boolean_true() {
        for (yaml, enabled) in [
            ("merge: true", true),
            ("merge: false", false),
            ("merge: \"true\"", false),
            ("merge: 1", false),
            ("merge: yes_please", false),
            ("minimum_reviewers: 2", false),
        ] {
            let config = parse_config(yaml).unwrap();
            assert_eq!(config.merge_enabled(), enabled, "for {yaml:?}");
        }
    }

    #[test]
    fn test_merge_display() {
        assert_eq!(parse_config("merge: false").unwrap().merge_display(), "false");
        assert_eq!(parse_config("org_mode: false").unwrap().merge_display(), "null");
    }

    #[test]
    fn test_defaults_when_keys_missing() {
        let config = parse_config("org_mode: false").unwrap();
        assert!(config.minimum_reviewers.is_none());
        assert_eq!(config.effective_minimum_reviewers(), DEFAULT_MINIMUM_REVIEWERS);
        assert!(config.build_steps.is_none());
        assert!(config.build_steps().is_empty());
    }

    #[test]
    fn test_yaml_source_missing_file_is_absent() {
        let temp = TempDir::new().unwrap();
        assert!(YamlConfigSource.load(temp.path()).is_none());
    }

    #[test]
    fn test_yaml_source_malformed_file_is_absent() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), "minimum_reviewers: [unclosed").unwrap();
        assert!(YamlConfigSource.load(temp.path()).is_none());
    }

    #[test]
    fn test_yaml_source_reads_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE),
            "minimum_reviewers: 3\nbuild_steps: [\"cargo test\"]\nmerge: true\n",
        )
        .unwrap();

        let config = YamlConfigSource.load(temp.path()).unwrap();
        assert_eq!(config.minimum_reviewers, Some(3));
        assert_eq!(config.build_steps(), ["cargo test"]);
    }
}
