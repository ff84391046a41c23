//! Rule registry.
//!
//! The [`Registry`] stores every registered rule, rejects duplicate codes and
//! answers "which rules apply to this block" in registration order. It is
//! built once at startup, then shared read-only (behind an `Arc`) with the
//! scanner, so lookups need no locking.

use std::collections::HashMap;
use std::sync::Arc;

use super::spec::{RuleCode, RuleSpec};
use crate::error::{Result, TfguardError};
use crate::rules::builtin_rules;

/// Registry of rules, keyed by unique code.
#[derive(Debug, Default)]
pub struct Registry {
    rules: Vec<Arc<RuleSpec>>,
    index: HashMap<RuleCode, usize>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding all built-in rules.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for spec in builtin_rules() {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    /// Register a rule.
    ///
    /// Fails with `InvalidRuleSpec` when the code is blank or no check
    /// function is set, and with `DuplicateRuleCode` when the code is taken.
    /// A rejected spec leaves the registry unchanged.
    pub fn register(&mut self, spec: RuleSpec) -> Result<()> {
        if spec.code.is_empty() {
            return Err(TfguardError::InvalidRuleSpec {
                code: spec.code.to_string(),
                reason: "rule code is empty".to_string(),
            });
        }
        if spec.check.is_none() {
            return Err(TfguardError::InvalidRuleSpec {
                code: spec.code.to_string(),
                reason: "no check function".to_string(),
            });
        }
        if self.index.contains_key(&spec.code) {
            return Err(TfguardError::DuplicateRuleCode {
                code: spec.code.to_string(),
            });
        }

        tracing::debug!(code = %spec.code, provider = %spec.provider, "registered rule");
        self.index.insert(spec.code.clone(), self.rules.len());
        self.rules.push(Arc::new(spec));
        Ok(())
    }

    /// Rules applicable to a block, in registration order.
    pub fn lookup(
        &self,
        provider: Option<&str>,
        block_type: &str,
        labels: &[String],
    ) -> Vec<&Arc<RuleSpec>> {
        self.rules
            .iter()
            .filter(|spec| spec.applies_to(provider, block_type, labels))
            .collect()
    }

    /// Get a rule by code.
    pub fn get(&self, code: &RuleCode) -> Option<&RuleSpec> {
        self.index.get(code).map(|&i| self.rules[i].as_ref())
    }

    /// Iterate over all rules in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleSpec> {
        self.rules.iter().map(|r| r.as_ref())
    }

    /// Codes of all rules in registration order.
    pub fn codes(&self) -> Vec<&RuleCode> {
        self.rules.iter().map(|r| &r.code).collect()
    }

    /// Get the number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Provider, Severity};

    fn mock_rule(code: &str) -> RuleSpec {
        RuleSpec::new(code, Provider::aws())
            .with_block_types(["resource"])
            .with_check(|_, _, _| Vec::new())
    }

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn registry_new_is_empty() {
        let registry = Registry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn registry_register_and_get() {
        let mut registry = Registry::new();
        registry.register(mock_rule("AWS001")).unwrap();

        assert!(!registry.is_empty());
        assert!(registry.get(&RuleCode::new("AWS001")).is_some());
        assert!(registry.get(&RuleCode::new("AWS999")).is_none());
    }

    #[test]
    fn duplicate_code_is_rejected_and_first_stays_active() {
        let mut registry = Registry::new();
        registry
            .register(mock_rule("AWS001").with_severity(Severity::Info))
            .unwrap();

        let err = registry
            .register(mock_rule("AWS001").with_severity(Severity::Error))
            .unwrap_err();

        assert!(matches!(err, TfguardError::DuplicateRuleCode { ref code } if code == "AWS001"));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(&RuleCode::new("AWS001")).unwrap().severity,
            Severity::Info
        );
    }

    #[test]
    fn empty_code_is_invalid() {
        let mut registry = Registry::new();
        let err = registry.register(mock_rule("")).unwrap_err();

        assert!(matches!(err, TfguardError::InvalidRuleSpec { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn missing_check_is_invalid() {
        let mut registry = Registry::new();
        let err = registry
            .register(RuleSpec::new("AWS002", Provider::aws()))
            .unwrap_err();

        assert!(matches!(err, TfguardError::InvalidRuleSpec { ref reason, .. } if reason.contains("check")));
        assert!(registry.is_empty());
    }

    #[test]
    fn lookup_preserves_registration_order() {
        let mut registry = Registry::new();
        registry.register(mock_rule("AWS300")).unwrap();
        registry.register(mock_rule("AWS100")).unwrap();
        registry.register(mock_rule("AWS200")).unwrap();

        let codes: Vec<&str> = registry
            .lookup(Some("aws"), "resource", &labels(&["aws_s3_bucket", "a"]))
            .iter()
            .map(|spec| spec.code.as_str())
            .collect();

        assert_eq!(codes, vec!["AWS300", "AWS100", "AWS200"]);
    }

    #[test]
    fn lookup_filters_by_provider_type_and_labels() {
        let mut registry = Registry::new();
        registry
            .register(mock_rule("AWS070").with_labels(["aws_elasticsearch_domain"]))
            .unwrap();
        registry
            .register(
                RuleSpec::new("GEN001", Provider::General)
                    .with_check(|_, _, _| Vec::new()),
            )
            .unwrap();
        registry
            .register(
                RuleSpec::new("GCP001", Provider::google()).with_check(|_, _, _| Vec::new()),
            )
            .unwrap();

        let matched = |provider, block_type, l: &[&str]| -> Vec<String> {
            registry
                .lookup(provider, block_type, &labels(l))
                .iter()
                .map(|s| s.code.to_string())
                .collect()
        };

        assert_eq!(
            matched(Some("aws"), "resource", &["aws_elasticsearch_domain", "example"]),
            vec!["AWS070", "GEN001"]
        );
        assert_eq!(
            matched(Some("aws"), "resource", &["aws_s3_bucket", "logs"]),
            vec!["GEN001"]
        );
        assert_eq!(matched(None, "variable", &["region"]), vec!["GEN001"]);
        assert_eq!(
            matched(Some("google"), "resource", &["google_sql_database_instance", "db"]),
            vec!["GEN001", "GCP001"]
        );
    }

    #[test]
    fn codes_and_iteration() {
        let mut registry = Registry::new();
        registry.register(mock_rule("AWS001")).unwrap();
        registry.register(mock_rule("AWS002")).unwrap();

        assert_eq!(registry.iter().count(), 2);
        assert_eq!(
            registry.codes(),
            vec![&RuleCode::new("AWS001"), &RuleCode::new("AWS002")]
        );
    }

    #[test]
    fn registry_with_builtins_has_rules() {
        let registry = Registry::with_builtins().unwrap();
        assert!(!registry.is_empty());
        assert!(registry.get(&RuleCode::new("AWS070")).is_some());
    }
}
