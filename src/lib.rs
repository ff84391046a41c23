//! tfguard - Rule engine for static analysis of infrastructure-as-code.
//!
//! tfguard evaluates a registry of independent security and compliance rules
//! against a parsed block/attribute tree and reports findings with severity
//! and source location. Turning raw configuration text into that tree is the
//! job of an external parser.
//!
//! # Modules
//!
//! - [`model`] - Blocks, attributes, values and source ranges
//! - [`rule`] - Rule declaration and the rule registry
//! - [`rules`] - Built-in rules
//! - [`scanner`] - Dispatch of rules against blocks, and scan reports
//! - [`context`] - Scan-wide lookups available to rules
//! - [`finding`] - Reported issues
//! - [`suppression`] - Inline suppression directives
//! - [`config`] - Scan configuration loading
//! - [`error`] - Error types and result aliases
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tfguard::{Attribute, Block, Registry, Scanner, SourceFile, SourceRange};
//!
//! let domain = Block::new(
//!     "resource",
//!     ["aws_elasticsearch_domain", "example"],
//!     SourceRange::new("main.tf", 1, 7),
//! )
//! .with_child(
//!     Block::new("log_publishing_options", Vec::<String>::new(), SourceRange::new("main.tf", 3, 6))
//!         .with_attribute(Attribute::new("log_type", "AUDIT_LOGS", SourceRange::line("main.tf", 5))),
//! );
//!
//! let scanner = Scanner::new(Arc::new(Registry::with_builtins().unwrap()));
//! let report = scanner.scan(vec![SourceFile::new("main.tf", vec![domain])]);
//! assert!(report.findings.is_empty());
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod finding;
pub mod model;
pub mod rule;
pub mod rules;
pub mod scanner;
pub mod suppression;

pub use config::ScanConfig;
pub use context::Context;
pub use error::{Result, TfguardError};
pub use finding::{Finding, FindingKind};
pub use model::{Attribute, Block, Reference, SourceFile, SourceRange, Value};
pub use rule::{Documentation, Provider, Registry, RuleCode, RuleSpec, Severity};
pub use scanner::{ScanReport, Scanner};
pub use suppression::{parse_directives, RuleSelector, SuppressionDirective};
