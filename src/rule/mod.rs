//! Rule declaration and registration.
//!
//! The rule system consists of:
//!
//! - **Specs** - One [`RuleSpec`] per rule: code, severity, matching
//!   requirements, documentation and check function
//! - **Registry** - Every registered rule, unique by code ([`Registry`])
//!
//! # Example
//!
//! ```
//! use tfguard::rule::{Provider, Registry, RuleCode, RuleSpec, Severity};
//!
//! let mut registry = Registry::new();
//! registry
//!     .register(
//!         RuleSpec::new("AWS999", Provider::aws())
//!             .with_severity(Severity::Warning)
//!             .with_block_types(["resource"])
//!             .with_labels(["aws_s3_bucket"])
//!             .with_check(|spec, block, _ctx| {
//!                 match block.attribute("acl") {
//!                     Some(acl) if acl.equals("public-read") => {
//!                         vec![spec.finding("bucket is public", acl.range())]
//!                     }
//!                     _ => Vec::new(),
//!                 }
//!             }),
//!     )
//!     .unwrap();
//!
//! assert!(registry.get(&RuleCode::new("AWS999")).is_some());
//! assert!(Severity::Warning < Severity::Error);
//! ```

pub mod registry;
pub mod spec;

pub use registry::Registry;
pub use spec::{CheckFn, Documentation, Provider, RuleCode, RuleSpec, Severity};
