//! Built-in rules.
//!
//! Each rule lives in its own module and exposes a `rule()` constructor.

pub mod elasticsearch_logging;

use crate::rule::RuleSpec;

/// Every built-in rule, in registration order.
pub fn builtin_rules() -> Vec<RuleSpec> {
    vec![elasticsearch_logging::rule()]
}
