//! Source location ranges.
//!
//! Every block, attribute and finding carries a [`SourceRange`] pointing back
//! into the configuration file it came from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A line range in a source file (1-indexed, inclusive on both ends).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRange {
    /// File path.
    pub file: PathBuf,
    /// Starting line (1-indexed).
    pub start_line: usize,
    /// Ending line (1-indexed).
    pub end_line: usize,
}

impl SourceRange {
    /// Create a range spanning `start_line..=end_line`.
    ///
    /// An inverted pair is normalized so that `start_line <= end_line` holds.
    pub fn new(file: impl Into<PathBuf>, start_line: usize, end_line: usize) -> Self {
        let (start_line, end_line) = if start_line <= end_line {
            (start_line, end_line)
        } else {
            (end_line, start_line)
        };
        Self {
            file: file.into(),
            start_line,
            end_line,
        }
    }

    /// Create a range covering a single line.
    pub fn line(file: impl Into<PathBuf>, line: usize) -> Self {
        Self::new(file, line, line)
    }

    /// File this range points into.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Whether `line` falls inside this range.
    pub fn covers_line(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    /// Whether `other` lies entirely inside this range, in the same file.
    pub fn contains(&self, other: &SourceRange) -> bool {
        self.file == other.file
            && self.start_line <= other.start_line
            && other.end_line <= self.end_line
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}:{}", self.file.display(), self.start_line)
        } else {
            write!(
                f,
                "{}:{}-{}",
                self.file.display(),
                self.start_line,
                self.end_line
            )
        }
    }
}
