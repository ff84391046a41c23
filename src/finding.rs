//! Findings reported by rules.
//!
//! This module provides the [`Finding`] type, one reported issue with its rule
//! code, severity and source location. Findings serialize to the flat record
//! consumed by report writers:
//!
//! ```text
//! {"ruleCode": "AWS070", "message": "...", "severity": "ERROR",
//!  "file": "main.tf", "startLine": 1, "endLine": 12, "kind": "violation"}
//! ```

use crate::model::SourceRange;
use crate::rule::{RuleCode, Severity};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Whether a finding is a genuine rule result or an engine-side failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// The rule reported a problem in the configuration.
    Violation,
    /// The rule's check function panicked or exceeded its time bound.
    ExecutionError,
}

/// One reported issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// The rule that produced this finding.
    pub rule_code: RuleCode,
    /// Human-readable message.
    pub message: String,
    /// Severity of this finding.
    pub severity: Severity,
    /// Location inside the originating block.
    #[serde(flatten)]
    pub range: SourceRange,
    pub kind: FindingKind,
}

impl Finding {
    /// Create a new rule violation.
    pub fn new(
        rule_code: RuleCode,
        severity: Severity,
        message: impl Into<String>,
        range: SourceRange,
    ) -> Self {
        Self {
            rule_code,
            message: message.into(),
            severity,
            range,
            kind: FindingKind::Violation,
        }
    }

    /// Create a finding recording that `rule_code` failed to execute.
    pub fn execution_error(
        rule_code: RuleCode,
        message: impl Into<String>,
        range: SourceRange,
    ) -> Self {
        Self {
            rule_code,
            message: message.into(),
            severity: Severity::Error,
            range,
            kind: FindingKind::ExecutionError,
        }
    }

    pub fn is_execution_error(&self) -> bool {
        self.kind == FindingKind::ExecutionError
    }

    /// Report ordering: file, start line, rule code, then the remaining
    /// fields so that the order is total.
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.range
            .file
            .cmp(&other.range.file)
            .then(self.range.start_line.cmp(&other.range.start_line))
            .then_with(|| self.rule_code.cmp(&other.rule_code))
            .then(self.range.end_line.cmp(&other.range.end_line))
            .then(self.kind.cmp(&other.kind))
            .then(self.severity.cmp(&other.severity))
            .then_with(|| self.message.cmp(&other.message))
    }
}
