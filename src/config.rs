//! Scan configuration.
//!
//! A scan is tuned by an optional `.tfguard.yml` at the project root:
//!
//! ```yaml
//! jobs: 4                 # worker threads, 0 = one per CPU
//! rule_timeout: 5000      # milliseconds one rule invocation may take
//! exclude: [AWS002]       # rules never run
//! min_severity: WARNING   # drop INFO findings
//! severity_overrides:
//!   AWS070: WARNING
//! ```
//!
//! Every key is optional; a missing file means [`ScanConfig::default`].

use crate::error::{Result, TfguardError};
use crate::rule::{RuleCode, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File names searched for in a project root, in priority order.
pub const CONFIG_FILE_NAMES: [&str; 2] = [".tfguard.yml", ".tfguard.yaml"];

const DEFAULT_RULE_TIMEOUT_MS: u64 = 30_000;

/// Settings applied to every scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of worker threads (0 = auto-detect)
    pub jobs: usize,

    /// Upper bound for a single rule invocation, in milliseconds
    #[serde(rename = "rule_timeout")]
    pub rule_timeout_ms: u64,

    /// Rule codes that are never invoked
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<RuleCode>,

    /// Findings below this severity are dropped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_severity: Option<Severity>,

    /// Per-rule severity replacing the rule's registered severity
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub severity_overrides: BTreeMap<RuleCode, Severity>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            jobs: 0,
            rule_timeout_ms: DEFAULT_RULE_TIMEOUT_MS,
            exclude: Vec::new(),
            min_severity: None,
            severity_overrides: BTreeMap::new(),
        }
    }
}

impl ScanConfig {
    /// Find a config file in `root`.
    pub fn find(root: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }

    /// Load the config from `root`, or the default when none exists.
    pub fn discover(root: &Path) -> Result<Self> {
        match Self::find(root) {
            Some(path) => Self::load(&path),
            None => {
                tracing::debug!("No config file in {}, using defaults", root.display());
                Ok(Self::default())
            }
        }
    }

    /// Load a single config file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(TfguardError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| TfguardError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Parse config YAML. Empty input yields the default config.
    pub fn parse(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Resolved worker count.
    pub fn worker_count(&self) -> usize {
        if self.jobs > 0 {
            self.jobs
        } else {
            num_cpus::get().max(1)
        }
    }

    pub fn rule_timeout(&self) -> Duration {
        Duration::from_millis(self.rule_timeout_ms.max(1))
    }

    pub fn is_excluded(&self, code: &RuleCode) -> bool {
        self.exclude
            .iter()
            .any(|c| c.as_str().eq_ignore_ascii_case(code.as_str()))
    }

    /// Severity to report for `code`, given its registered severity.
    pub fn severity_for(&self, code: &RuleCode, registered: Severity) -> Severity {
        self.severity_overrides
            .get(code)
            .copied()
            .unwrap_or(registered)
    }

    /// Whether a finding of this severity is reported.
    pub fn reports(&self, severity: Severity) -> bool {
        self.min_severity.map_or(true, |min| severity >= min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_values() {
        let config = ScanConfig::default();

        assert_eq!(config.jobs, 0);
        assert_eq!(config.rule_timeout(), Duration::from_secs(30));
        assert!(config.exclude.is_empty());
        assert!(config.worker_count() >= 1);
        assert!(config.reports(Severity::Info));
    }

    #[test]
    fn parses_full_config() {
        let yaml = r#"
jobs: 4
rule_timeout: 250
exclude: [AWS002, aws003]
min_severity: WARNING
severity_overrides:
  AWS070: info
"#;
        let config = ScanConfig::parse(yaml).unwrap();

        assert_eq!(config.worker_count(), 4);
        assert_eq!(config.rule_timeout(), Duration::from_millis(250));
        assert!(config.is_excluded(&RuleCode::new("AWS002")));
        assert!(config.is_excluded(&RuleCode::new("AWS003")));
        assert!(!config.is_excluded(&RuleCode::new("AWS070")));
        assert!(!config.reports(Severity::Info));
        assert!(config.reports(Severity::Warning));
        assert_eq!(
            config.severity_for(&RuleCode::new("AWS070"), Severity::Error),
            Severity::Info
        );
        assert_eq!(
            config.severity_for(&RuleCode::new("AWS001"), Severity::Error),
            Severity::Error
        );
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ScanConfig::parse("jobs: 2").unwrap();

        assert_eq!(config.jobs, 2);
        assert_eq!(config.rule_timeout_ms, DEFAULT_RULE_TIMEOUT_MS);
    }

    #[test]
    fn empty_config_is_default() {
        assert_eq!(ScanConfig::parse("  \n").unwrap(), ScanConfig::default());
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let config = ScanConfig::parse("rule_timeout: 0").unwrap();
        assert_eq!(config.rule_timeout(), Duration::from_millis(1));
    }

    #[test]
    fn discover_without_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = ScanConfig::discover(temp.path()).unwrap();

        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn discover_reads_yml() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".tfguard.yml"), "jobs: 3\n").unwrap();

        let config = ScanConfig::discover(temp.path()).unwrap();
        assert_eq!(config.jobs, 3);
    }

    #[test]
    fn load_missing_file_errors() {
        let temp = TempDir::new().unwrap();
        let err = ScanConfig::load(&temp.path().join("nope.yml")).unwrap_err();

        assert!(matches!(err, TfguardError::ConfigNotFound { .. }));
    }

    #[test]
    fn load_invalid_yaml_errors_with_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".tfguard.yml");
        fs::write(&path, "jobs: [not a number").unwrap();

        let err = ScanConfig::load(&path).unwrap_err();
        assert!(matches!(err, TfguardError::ConfigParseError { .. }));
        assert!(err.to_string().contains(".tfguard.yml"));
    }
}
