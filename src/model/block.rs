//! Configuration blocks.
//!
//! A [`Block`] is one parsed configuration unit, for example
//!
//! ```text
//! resource "aws_elasticsearch_domain" "example" {
//!   domain_name = "example"
//!   log_publishing_options {
//!     log_type = "AUDIT_LOGS"
//!   }
//! }
//! ```
//!
//! which is a `resource` block with labels `["aws_elasticsearch_domain",
//! "example"]`, one attribute and one nested `log_publishing_options` block.
//! Blocks own their children, so the structure is always a tree.

use super::attribute::Attribute;
use super::range::SourceRange;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One configuration block with its attributes and nested blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BlockRepr", into = "BlockRepr")]
pub struct Block {
    block_type: String,
    labels: Vec<String>,
    attributes: BTreeMap<String, Attribute>,
    children: Vec<Block>,
    range: SourceRange,
    parse_error: Option<String>,
}

impl Block {
    /// Create an empty block.
    pub fn new<I, S>(block_type: impl Into<String>, labels: I, range: SourceRange) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            block_type: block_type.into(),
            labels: labels.into_iter().map(Into::into).collect(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            range,
            parse_error: None,
        }
    }

    /// Create a placeholder for a block the parser could not read.
    ///
    /// The scanner skips malformed blocks together with their subtree.
    pub fn malformed<I, S>(
        block_type: impl Into<String>,
        labels: I,
        range: SourceRange,
        message: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut block = Self::new(block_type, labels, range);
        block.parse_error = Some(message.into());
        block
    }

    /// Add an attribute. A later attribute with the same name replaces the
    /// earlier one.
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes
            .insert(attribute.name().to_string(), attribute);
        self
    }

    /// Append a nested block.
    pub fn with_child(mut self, child: Block) -> Self {
        self.children.push(child);
        self
    }

    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn range(&self) -> &SourceRange {
        &self.range
    }

    /// Nested blocks in source order.
    pub fn children(&self) -> &[Block] {
        &self.children
    }

    /// Attributes ordered by name.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.values()
    }

    /// Parser message if this block failed upstream parsing.
    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    pub fn is_malformed(&self) -> bool {
        self.parse_error.is_some()
    }

    /// Look up an attribute by name. Absent attributes are `None`, never an
    /// error.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Nested blocks of the given type.
    pub fn blocks<'a, 'b>(&'a self, block_type: &'b str) -> impl Iterator<Item = &'a Block> + 'b
    where
        'a: 'b,
    {
        self.children
            .iter()
            .filter(move |child| child.block_type == block_type)
    }

    /// First nested block of the given type.
    pub fn block(&self, block_type: &str) -> Option<&Block> {
        self.blocks(block_type).next()
    }

    pub fn has_block(&self, block_type: &str) -> bool {
        self.block(block_type).is_some()
    }

    /// Follow a dotted path of nested block types ending in an attribute name.
    ///
    /// `server_side_encryption_configuration.rule.sse_algorithm` descends into
    /// the first matching child at every step.
    pub fn nested_attribute(&self, path: &str) -> Option<&Attribute> {
        let mut segments: Vec<&str> = path.split('.').collect();
        let name = segments.pop()?;
        let mut current = self;
        for segment in segments {
            current = current.block(segment)?;
        }
        current.attribute(name)
    }

    /// First label, the resource type for `resource` and `data` blocks.
    pub fn type_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    /// Second label, the resource name for `resource` and `data` blocks.
    pub fn name_label(&self) -> Option<&str> {
        self.labels.get(1).map(String::as_str)
    }

    /// Human-readable address such as `aws_s3_bucket.logs`.
    pub fn full_name(&self) -> String {
        if self.labels.is_empty() {
            return self.block_type.clone();
        }
        let name = self.labels.join(".");
        if self.block_type == "data" {
            format!("data.{}", name)
        } else {
            name
        }
    }

    /// Whether this is a `resource` block of the given resource type.
    pub fn is_resource_type(&self, resource_type: &str) -> bool {
        self.block_type == "resource" && self.type_label() == Some(resource_type)
    }

    /// Provider this block belongs to.
    ///
    /// `resource "aws_s3_bucket"` and `data "aws_iam_policy"` belong to `aws`,
    /// `provider "google"` to `google`. Other blocks carry no provider of
    /// their own.
    pub fn provider(&self) -> Option<&str> {
        match self.block_type.as_str() {
            "resource" | "data" => {
                let type_label = self.type_label()?;
                type_label.split_once('_').map(|(prefix, _)| prefix)
            }
            "provider" => self.type_label(),
            _ => None,
        }
    }

    /// Pre-order iterator over this block and all of its descendants.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Depth-first pre-order traversal returned by [`Block::walk`].
pub struct Walk<'a> {
    stack: Vec<&'a Block>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.stack.pop()?;
        self.stack.extend(block.children.iter().rev());
        Some(block)
    }
}

/// Wire shape of a block: attributes as a list, optional fields defaulted.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockRepr {
    block_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Block>,
    range: SourceRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parse_error: Option<String>,
}

impl From<BlockRepr> for Block {
    fn from(repr: BlockRepr) -> Self {
        let mut block = Block::new(repr.block_type, repr.labels, repr.range);
        block.parse_error = repr.parse_error;
        block.children = repr.children;
        for attribute in repr.attributes {
            block = block.with_attribute(attribute);
        }
        block
    }
}

impl From<Block> for BlockRepr {
    fn from(block: Block) -> Self {
        Self {
            block_type: block.block_type,
            labels: block.labels,
            attributes: block.attributes.into_values().collect(),
            children: block.children,
            range: block.range,
            parse_error: block.parse_error,
        }
    }
}
