//! Inline suppression directives.
//!
//! A directive disables one rule (or all rules) for a span of lines in one
//! file. Front-ends that hold the raw source text can extract directives with
//! [`parse_directives`], which recognizes comments such as:
//!
//! - `acl = "public-read" # tfguard:ignore:AWS001` - trailing comment,
//!   suppresses AWS001 on that line
//! - `# tfguard:ignore:AWS001,AWS002` on its own line - suppresses both rules
//!   on the next code line, or across the whole block starting on that line
//! - `// tfguard:ignore:*` - suppresses every rule
//!
//! `#`, `//` and `/* */` comment markers are all accepted. Overlapping
//! directives compose by logical OR: any match suppresses.

use crate::model::Block;
use crate::rule::RuleCode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static IGNORE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"tfguard:ignore:([A-Za-z0-9_\-*]+(?:\s*,\s*[A-Za-z0-9_\-*]+)*)")
        .expect("suppression pattern is valid")
});

/// Which rules a directive disables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleSelector {
    /// Every rule (`*`).
    All,
    /// A single rule code.
    Code(RuleCode),
}

impl RuleSelector {
    pub fn matches(&self, code: &RuleCode) -> bool {
        match self {
            RuleSelector::All => true,
            RuleSelector::Code(c) => c.as_str().eq_ignore_ascii_case(code.as_str()),
        }
    }
}

impl From<String> for RuleSelector {
    fn from(value: String) -> Self {
        if value.trim() == "*" {
            RuleSelector::All
        } else {
            RuleSelector::Code(RuleCode::new(value.trim()))
        }
    }
}

impl From<RuleSelector> for String {
    fn from(selector: RuleSelector) -> Self {
        match selector {
            RuleSelector::All => "*".to_string(),
            RuleSelector::Code(code) => code.0,
        }
    }
}

/// One suppression directive: a rule selector bound to a line span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionDirective {
    pub rule: RuleSelector,
    pub start_line: usize,
    pub end_line: usize,
}

impl SuppressionDirective {
    /// Suppress `rule` on a single line.
    pub fn line(rule: RuleSelector, line: usize) -> Self {
        Self {
            rule,
            start_line: line,
            end_line: line,
        }
    }

    /// Suppress `rule` on every line of `start_line..=end_line`.
    pub fn span(rule: RuleSelector, start_line: usize, end_line: usize) -> Self {
        Self {
            rule,
            start_line: start_line.min(end_line),
            end_line: start_line.max(end_line),
        }
    }

    /// Whether this directive suppresses `code` on `line`.
    pub fn covers(&self, code: &RuleCode, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line && self.rule.matches(code)
    }
}

/// Extract suppression directives from a file's source text.
///
/// `blocks` are the file's parsed blocks; a comment-only directive line that
/// precedes a block widens to the block's whole line range.
pub fn parse_directives(source: &str, blocks: &[Block]) -> Vec<SuppressionDirective> {
    let lines: Vec<&str> = source.lines().collect();
    let mut directives = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_num = idx + 1;
        let selectors = selectors_on_line(line);
        if selectors.is_empty() {
            continue;
        }

        let (start, end) = if is_comment_only(line) {
            match next_code_line(&lines, idx + 1) {
                Some(target) => match block_starting_at(blocks, target) {
                    Some(block) => (target, block.range().end_line.max(target)),
                    None => (target, target),
                },
                // Directive at end of file binds to nothing
                None => continue,
            }
        } else {
            (line_num, line_num)
        };

        for selector in selectors {
            directives.push(SuppressionDirective::span(selector, start, end));
        }
    }

    directives
}

fn selectors_on_line(line: &str) -> Vec<RuleSelector> {
    let Some(comment_start) = comment_start(line) else {
        return Vec::new();
    };
    let comment = &line[comment_start..];

    IGNORE_PATTERN
        .captures_iter(comment)
        .filter_map(|caps| caps.get(1))
        .flat_map(|m| m.as_str().split(','))
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| RuleSelector::from(code.to_string()))
        .collect()
}

/// Byte offset of the first comment marker on the line that is not inside a
/// quoted string.
fn comment_start(line: &str) -> Option<usize> {
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = line.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '#' => return Some(idx),
            '/' if matches!(chars.peek(), Some((_, '/' | '*'))) => return Some(idx),
            _ => {}
        }
    }
    None
}

fn is_comment_only(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#') || trimmed.starts_with("//") || trimmed.starts_with("/*")
}

/// First line at or after `from` (0-based) holding code, as a 1-based number.
fn next_code_line(lines: &[&str], from: usize) -> Option<usize> {
    lines
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, line)| !line.trim().is_empty() && !is_comment_only(line))
        .map(|(idx, _)| idx + 1)
}

fn block_starting_at(blocks: &[Block], line: usize) -> Option<&Block> {
    blocks
        .iter()
        .flat_map(Block::walk)
        .find(|block| block.range().start_line == line)
}
