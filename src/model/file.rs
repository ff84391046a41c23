//! Parsed source files.

use super::block::Block;
use crate::error::{Result, TfguardError};
use crate::suppression::SuppressionDirective;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The parsed contents of one configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    #[serde(default)]
    path: PathBuf,
    #[serde(default)]
    blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    suppressions: Vec<SuppressionDirective>,
}

impl SourceFile {
    /// Create a file from its top-level blocks.
    pub fn new(path: impl Into<PathBuf>, blocks: Vec<Block>) -> Self {
        Self {
            path: path.into(),
            blocks,
            suppressions: Vec::new(),
        }
    }

    /// Attach inline suppression directives found in this file.
    pub fn with_suppressions(mut self, suppressions: Vec<SuppressionDirective>) -> Self {
        self.suppressions.extend(suppressions);
        self
    }

    /// Deserialize a file from the JSON tree an external parser produced.
    ///
    /// `path` takes precedence over any path recorded in the JSON.
    pub fn from_json(path: impl Into<PathBuf>, json: &str) -> Result<Self> {
        let path = path.into();
        let mut file: SourceFile =
            serde_json::from_str(json).map_err(|e| TfguardError::TreeParseError {
                path: path.clone(),
                message: e.to_string(),
            })?;
        file.path = path;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Top-level blocks in source order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn suppressions(&self) -> &[SuppressionDirective] {
        &self.suppressions
    }
}
