//! Rule definitions.
//!
//! This module provides the core types for declaring a rule:
//!
//! - [`RuleSpec`] - Registration record: metadata plus the check function
//! - [`RuleCode`] - Unique identifier for a rule (`AWS070`)
//! - [`Severity`] - Severity level for findings (Info, Warning, Error)
//! - [`Provider`] - Which blocks a rule is eligible for
//! - [`Documentation`] - Opaque text shown to users, never read by the engine

use crate::context::Context;
use crate::finding::Finding;
use crate::model::{Block, SourceRange};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Unique identifier for a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleCode(pub String);

impl RuleCode {
    /// Create a new rule code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RuleCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for RuleCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Severity level for findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational, does not indicate a problem on its own.
    #[serde(rename = "INFO", alias = "info")]
    Info,
    /// Should be addressed.
    #[serde(rename = "WARNING", alias = "warning")]
    Warning,
    /// Must be addressed.
    #[serde(rename = "ERROR", alias = "error")]
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Provider a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Matches blocks of every provider, and blocks without one.
    General,
    /// Matches only blocks whose derived provider has this name.
    Named(String),
}

impl Provider {
    pub fn aws() -> Self {
        Provider::Named("aws".to_string())
    }

    pub fn azure() -> Self {
        Provider::Named("azurerm".to_string())
    }

    pub fn google() -> Self {
        Provider::Named("google".to_string())
    }

    /// Whether a block with the given derived provider is eligible.
    pub fn matches(&self, block_provider: Option<&str>) -> bool {
        match self {
            Provider::General => true,
            Provider::Named(name) => block_provider == Some(name.as_str()),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::General => write!(f, "general"),
            Provider::Named(name) => write!(f, "{}", name),
        }
    }
}

/// User-facing documentation for a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Documentation {
    pub summary: String,
    pub explanation: String,
    pub bad_example: String,
    pub good_example: String,
    pub links: Vec<String>,
}

/// The logic of a rule: inspect one block, report zero or more findings.
///
/// Check functions must be pure: no mutation of the block or context and no
/// dependence on other invocations.
pub type CheckFn = Arc<dyn Fn(&RuleSpec, &Block, &Context) -> Vec<Finding> + Send + Sync>;

/// Registration record for one rule.
#[derive(Clone)]
pub struct RuleSpec {
    /// Unique code, e.g. `AWS070`.
    pub code: RuleCode,
    /// Severity stamped on every finding of this rule.
    pub severity: Severity,
    pub provider: Provider,
    /// Block types the rule targets; empty matches any type.
    pub required_block_types: Vec<String>,
    /// Prefix of the block's labels; empty matches any labels.
    pub required_labels: Vec<String>,
    pub documentation: Documentation,
    pub check: Option<CheckFn>,
}

impl RuleSpec {
    /// Start a rule with `Warning` severity, no requirements and no check.
    pub fn new(code: impl Into<RuleCode>, provider: Provider) -> Self {
        Self {
            code: code.into(),
            severity: Severity::Warning,
            provider,
            required_block_types: Vec::new(),
            required_labels: Vec::new(),
            documentation: Documentation::default(),
            check: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_block_types<I, S>(mut self, block_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_block_types = block_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_documentation(mut self, documentation: Documentation) -> Self {
        self.documentation = documentation;
        self
    }

    pub fn with_check<F>(mut self, check: F) -> Self
    where
        F: Fn(&RuleSpec, &Block, &Context) -> Vec<Finding> + Send + Sync + 'static,
    {
        self.check = Some(Arc::new(check));
        self
    }

    /// Whether this rule should run against a block.
    ///
    /// The provider must match (or be [`Provider::General`]), the block type
    /// must be one of `required_block_types` (or that list is empty), and
    /// `required_labels` must be a prefix of `labels`. Required labels longer
    /// than the block's labels never match.
    pub fn applies_to(&self, provider: Option<&str>, block_type: &str, labels: &[String]) -> bool {
        if !self.provider.matches(provider) {
            return false;
        }

        if !self.required_block_types.is_empty()
            && !self.required_block_types.iter().any(|t| t == block_type)
        {
            return false;
        }

        self.required_labels.len() <= labels.len()
            && self
                .required_labels
                .iter()
                .zip(labels)
                .all(|(required, actual)| required == actual)
    }

    /// Build a finding for this rule at `range`.
    pub fn finding(&self, message: impl Into<String>, range: &SourceRange) -> Finding {
        Finding::new(self.code.clone(), self.severity, message, range.clone())
    }
}

impl fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSpec")
            .field("code", &self.code)
            .field("severity", &self.severity)
            .field("provider", &self.provider)
            .field("required_block_types", &self.required_block_types)
            .field("required_labels", &self.required_labels)
            .field("has_check", &self.check.is_some())
            .finish()
    }
}
