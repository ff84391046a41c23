//! Attribute values and comparison.
//!
//! An [`Attribute`] is one `name = value` pair inside a block. Its [`Value`]
//! is fixed at construction and compared with [`Attribute::equals`], which is
//! strict-typed and total: a type mismatch is "not equal", never an error.

use super::range::SourceRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An unresolved traversal such as `aws_cloudwatch_log_group.example.arn`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    #[serde(rename = "$ref")]
    traversal: String,
}

impl Reference {
    /// Create a reference from its dotted traversal text.
    pub fn new(traversal: impl Into<String>) -> Self {
        Self {
            traversal: traversal.into(),
        }
    }

    /// The traversal text as written.
    pub fn as_str(&self) -> &str {
        &self.traversal
    }

    /// Dot-separated traversal segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.traversal.split('.')
    }

    /// Labels of the block this reference addresses.
    ///
    /// `aws_kms_key.main.arn` addresses `["aws_kms_key", "main"]` and
    /// `data.aws_iam_policy.admin.json` addresses the data block
    /// `["aws_iam_policy", "admin"]`. Returns `None` for traversals that
    /// are too short to name a block (`var.region`, `local.x`).
    pub fn block_address(&self) -> Option<(&str, [&str; 2])> {
        let mut segments = self.segments();
        let first = segments.next()?;
        match first {
            "var" | "local" | "module" | "each" | "count" | "path" | "self" => None,
            "data" => {
                let kind = segments.next()?;
                let name = segments.next()?;
                Some(("data", [kind, name]))
            }
            _ => {
                let name = segments.next()?;
                Some(("resource", [first, name]))
            }
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.traversal)
    }
}

/// A polymorphic attribute value.
///
/// Deserialization is untagged: JSON scalars, arrays and objects map onto the
/// matching variant, and an object of the exact shape `{"$ref": "..."}` is a
/// [`Reference`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Reference(Reference),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short name of the value's type, used in log and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Reference(_) => "reference",
            Value::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Reference(r) => Some(r),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Number(value as f64)
                }
            }
        )*
    };
}

number_from!(i32, i64, u32, u64, usize);

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<Reference> for Value {
    fn from(value: Reference) -> Self {
        Value::Reference(value)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Value::Map(value)
    }
}

/// A single `name = value` pair within a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    name: String,
    value: Value,
    range: SourceRange,
}

impl Attribute {
    /// Create a new attribute.
    pub fn new(name: impl Into<String>, value: impl Into<Value>, range: SourceRange) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            range,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn range(&self) -> &SourceRange {
        &self.range
    }

    /// Strict-typed equality against a literal.
    ///
    /// Numbers, booleans and strings compare by value, lists and maps
    /// structurally, references by traversal text. A single-element list is
    /// not unwrapped to its scalar. Mismatched types are simply not equal.
    pub fn equals(&self, literal: impl Into<Value>) -> bool {
        self.value == literal.into()
    }

    /// Membership test: list element, map key or substring of a string.
    ///
    /// Returns `false` for any other combination of operand types.
    pub fn contains(&self, literal: impl Into<Value>) -> bool {
        let literal = literal.into();
        match (&self.value, &literal) {
            (Value::List(items), _) => items.contains(&literal),
            (Value::Map(entries), Value::String(key)) => entries.contains_key(key),
            (Value::String(s), Value::String(needle)) => s.contains(needle.as_str()),
            _ => false,
        }
    }

    pub fn is_true(&self) -> bool {
        self.equals(true)
    }

    pub fn is_false(&self) -> bool {
        self.equals(false)
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.value, Value::Reference(_))
    }
}
