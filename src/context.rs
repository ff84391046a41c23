//! Scan-wide lookup surface for check functions.
//!
//! A [`Context`] is built once per scan from every parsed file. It lets rules
//! look past the block they are inspecting (resolving references between
//! resources, finding blocks that point at a resource) and answers suppression
//! queries. It is never mutated after construction and is shared across
//! worker threads.

use crate::model::{Block, Reference, SourceFile, Value};
use crate::rule::RuleCode;
use crate::suppression::SuppressionDirective;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Position of a block inside the context: file index, top-level index, then
/// child indices down the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct BlockAddress {
    pub file: usize,
    pub path: Vec<usize>,
}

/// Read-only, scan-wide view over all parsed files.
#[derive(Debug, Default)]
pub struct Context {
    files: Vec<SourceFile>,
    /// (block type, type label, name label) -> (file index, top-level index)
    named: HashMap<(String, String, String), (usize, usize)>,
    suppressions: HashMap<PathBuf, Vec<SuppressionDirective>>,
}

impl Context {
    /// Build a context over the complete set of files in a scan.
    pub fn new(files: Vec<SourceFile>) -> Self {
        let mut named = HashMap::new();
        let mut suppressions: HashMap<PathBuf, Vec<SuppressionDirective>> = HashMap::new();

        for (file_idx, file) in files.iter().enumerate() {
            for (block_idx, block) in file.blocks().iter().enumerate() {
                if block.is_malformed() {
                    continue;
                }
                if let (Some(kind), Some(name)) = (block.type_label(), block.name_label()) {
                    // First definition wins, as in source order
                    named
                        .entry((
                            block.block_type().to_string(),
                            kind.to_string(),
                            name.to_string(),
                        ))
                        .or_insert((file_idx, block_idx));
                }
            }

            if !file.suppressions().is_empty() {
                suppressions
                    .entry(file.path().to_path_buf())
                    .or_default()
                    .extend(file.suppressions().iter().cloned());
            }
        }

        Self {
            files,
            named,
            suppressions,
        }
    }

    /// All files in the scan.
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Every well-formed block across all files, depth-first pre-order.
    ///
    /// Malformed blocks and their subtrees are skipped.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.files
            .iter()
            .flat_map(|file| file.blocks().iter())
            .flat_map(well_formed)
    }

    /// Top-level `resource` block with the given type and name.
    pub fn resource(&self, resource_type: &str, name: &str) -> Option<&Block> {
        self.named_block("resource", resource_type, name)
    }

    /// Top-level `data` block with the given type and name.
    pub fn data(&self, data_type: &str, name: &str) -> Option<&Block> {
        self.named_block("data", data_type, name)
    }

    /// Top-level blocks of the given resource type, in file order.
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a Block> + 'a {
        self.files
            .iter()
            .flat_map(|file| file.blocks().iter())
            .filter(move |block| !block.is_malformed() && block.is_resource_type(resource_type))
    }

    /// The block a reference points at, if it is part of this scan.
    pub fn resolve_reference(&self, reference: &Reference) -> Option<&Block> {
        let (block_type, [kind, name]) = reference.block_address()?;
        self.named_block(block_type, kind, name)
    }

    /// Top-level blocks holding at least one reference to `target`.
    ///
    /// References nested in child blocks, lists and maps are included.
    pub fn referencing_blocks(&self, target: &Block) -> Vec<&Block> {
        let (Some(kind), Some(name)) = (target.type_label(), target.name_label()) else {
            return Vec::new();
        };
        let target_type = target.block_type();

        self.files
            .iter()
            .flat_map(|file| file.blocks().iter())
            .filter(|block| !block.is_malformed())
            .filter(|block| {
                block.walk().any(|b| {
                    b.attributes().any(|attr| {
                        value_refers_to(attr.value(), target_type, kind, name)
                    })
                })
            })
            .collect()
    }

    /// Whether a suppression directive in `file` disables `code` on `line`.
    ///
    /// Multiple directives compose by logical OR.
    pub fn is_suppressed(&self, file: &Path, code: &RuleCode, line: usize) -> bool {
        self.suppressions
            .get(file)
            .is_some_and(|directives| directives.iter().any(|d| d.covers(code, line)))
    }

    pub(crate) fn block_at(&self, address: &BlockAddress) -> Option<&Block> {
        let file = self.files.get(address.file)?;
        let (first, rest) = address.path.split_first()?;
        let mut block = file.blocks().get(*first)?;
        for idx in rest {
            block = block.children().get(*idx)?;
        }
        Some(block)
    }

    fn named_block(&self, block_type: &str, kind: &str, name: &str) -> Option<&Block> {
        let &(file_idx, block_idx) = self.named.get(&(
            block_type.to_string(),
            kind.to_string(),
            name.to_string(),
        ))?;
        self.files.get(file_idx)?.blocks().get(block_idx)
    }
}

/// Pre-order walk that prunes malformed subtrees.
fn well_formed(root: &Block) -> Vec<&Block> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(block) = stack.pop() {
        if block.is_malformed() {
            continue;
        }
        out.push(block);
        stack.extend(block.children().iter().rev());
    }
    out
}

fn value_refers_to(value: &Value, block_type: &str, kind: &str, name: &str) -> bool {
    match value {
        Value::Reference(reference) => reference
            .block_address()
            .is_some_and(|(t, [k, n])| t == block_type && k == kind && n == name),
        Value::List(items) => items
            .iter()
            .any(|item| value_refers_to(item, block_type, kind, name)),
        Value::Map(entries) => entries
            .values()
            .any(|item| value_refers_to(item, block_type, kind, name)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attribute, SourceRange};
    use crate::suppression::RuleSelector;

    fn range(file: &str, start: usize, end: usize) -> SourceRange {
        SourceRange::new(file, start, end)
    }

    fn fixture() -> Context {
        let key = Block::new("resource", ["aws_kms_key", "main"], range("kms.tf", 1, 3));
        let bucket = Block::new("resource", ["aws_s3_bucket", "logs"], range("s3.tf", 1, 12))
            .with_child(
                Block::new(
                    "server_side_encryption_configuration",
                    Vec::<String>::new(),
                    range("s3.tf", 3, 10),
                )
                .with_attribute(Attribute::new(
                    "kms_master_key_id",
                    Reference::new("aws_kms_key.main.arn"),
                    range("s3.tf", 5, 5),
                )),
            );
        let other = Block::new("resource", ["aws_s3_bucket", "other"], range("s3.tf", 14, 16))
            .with_attribute(Attribute::new(
                "tags",
                Value::List(vec![Value::from(Reference::new("aws_kms_key.main.id"))]),
                range("s3.tf", 15, 15),
            ));
        let broken = Block::malformed("resource", ["aws_s3_bucket", "broken"], range("s3.tf", 18, 20), "bad");
        let policy = Block::new("data", ["aws_iam_policy", "admin"], range("iam.tf", 1, 2));

        Context::new(vec![
            SourceFile::new("kms.tf", vec![key]),
            SourceFile::new("s3.tf", vec![bucket, other, broken]).with_suppressions(vec![
                SuppressionDirective::line(RuleSelector::Code(RuleCode::new("AWS002")), 5),
                SuppressionDirective::span(RuleSelector::All, 14, 16),
            ]),
            SourceFile::new("iam.tf", vec![policy]),
        ])
    }

    #[test]
    fn blocks_walks_all_files_pre_order_skipping_malformed() {
        let ctx = fixture();
        let names: Vec<String> = ctx.blocks().map(Block::full_name).collect();

        assert_eq!(
            names,
            vec![
                "aws_kms_key.main",
                "aws_s3_bucket.logs",
                "server_side_encryption_configuration",
                "aws_s3_bucket.other",
                "data.aws_iam_policy.admin",
            ]
        );
    }

    #[test]
    fn resource_and_data_lookup() {
        let ctx = fixture();

        assert!(ctx.resource("aws_kms_key", "main").is_some());
        assert!(ctx.resource("aws_kms_key", "missing").is_none());
        assert!(ctx.data("aws_iam_policy", "admin").is_some());
        assert!(ctx.resource("aws_iam_policy", "admin").is_none());
        assert!(ctx.resource("aws_s3_bucket", "broken").is_none());
        assert_eq!(ctx.resources_of_type("aws_s3_bucket").count(), 2);
    }

    #[test]
    fn resolve_reference_finds_target() {
        let ctx = fixture();

        let block = ctx
            .resolve_reference(&Reference::new("aws_kms_key.main.arn"))
            .unwrap();
        assert_eq!(block.full_name(), "aws_kms_key.main");

        let data = ctx
            .resolve_reference(&Reference::new("data.aws_iam_policy.admin.json"))
            .unwrap();
        assert_eq!(data.block_type(), "data");

        assert!(ctx.resolve_reference(&Reference::new("var.region")).is_none());
        assert!(ctx
            .resolve_reference(&Reference::new("aws_kms_key.other.arn"))
            .is_none());
    }

    #[test]
    fn referencing_blocks_includes_nested_and_list_references() {
        let ctx = fixture();
        let key = ctx.resource("aws_kms_key", "main").unwrap();

        let names: Vec<String> = ctx
            .referencing_blocks(key)
            .into_iter()
            .map(Block::full_name)
            .collect();
        assert_eq!(names, vec!["aws_s3_bucket.logs", "aws_s3_bucket.other"]);

        let bucket = ctx.resource("aws_s3_bucket", "logs").unwrap();
        assert!(ctx.referencing_blocks(bucket).is_empty());
    }

    #[test]
    fn is_suppressed_is_per_file_rule_and_line() {
        let ctx = fixture();
        let s3 = Path::new("s3.tf");

        assert!(ctx.is_suppressed(s3, &RuleCode::new("AWS002"), 5));
        assert!(!ctx.is_suppressed(s3, &RuleCode::new("AWS002"), 6));
        assert!(!ctx.is_suppressed(s3, &RuleCode::new("AWS001"), 5));
        assert!(!ctx.is_suppressed(Path::new("kms.tf"), &RuleCode::new("AWS002"), 5));
        // wildcard span
        assert!(ctx.is_suppressed(s3, &RuleCode::new("AWS001"), 15));
        assert!(ctx.is_suppressed(s3, &RuleCode::new("AWS002"), 15));
    }

    #[test]
    fn block_at_follows_address() {
        let ctx = fixture();

        let nested = ctx
            .block_at(&BlockAddress {
                file: 1,
                path: vec![0, 0],
            })
            .unwrap();
        assert_eq!(nested.block_type(), "server_side_encryption_configuration");

        assert!(ctx
            .block_at(&BlockAddress {
                file: 9,
                path: vec![0],
            })
            .is_none());
        assert!(ctx
            .block_at(&BlockAddress {
                file: 0,
                path: vec![],
            })
            .is_none());
    }
}
