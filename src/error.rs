//! Error types for tfguard operations.
//!
//! This module defines [`TfguardError`], the error type returned by
//! registration, configuration loading and tree loading, and a [`Result`]
//! type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Startup errors (`DuplicateRuleCode`, `InvalidRuleSpec`, config errors)
//!   are returned as `Err` and are expected to abort before any scan begins
//! - A faulting check function is never an `Err`: the scanner records it as
//!   a [`Finding`](crate::finding::Finding) of kind
//!   [`ExecutionError`](crate::finding::FindingKind::ExecutionError)
//! - Use `anyhow::Error` (via `TfguardError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for tfguard operations.
#[derive(Debug, Error)]
pub enum TfguardError {
    /// A rule with the same code is already registered.
    #[error("Duplicate rule code: {code}")]
    DuplicateRuleCode { code: String },

    /// A rule spec is missing required fields.
    #[error("Invalid rule spec '{code}': {reason}")]
    InvalidRuleSpec { code: String, reason: String },

    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Failed to deserialize a block tree handed over by a parser.
    #[error("Failed to load block tree for {path}: {message}")]
    TreeParseError { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for tfguard operations.
pub type Result<T> = std::result::Result<T, TfguardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_rule_code_displays_code() {
        let err = TfguardError::DuplicateRuleCode {
            code: "AWS070".into(),
        };
        assert_eq!(err.to_string(), "Duplicate rule code: AWS070");
    }

    #[test]
    fn invalid_rule_spec_displays_code_and_reason() {
        let err = TfguardError::InvalidRuleSpec {
            code: "AWS001".into(),
            reason: "missing check function".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("AWS001"));
        assert!(msg.contains("missing check function"));
    }

    #[test]
    fn config_not_found_displays_path() {
        let err = TfguardError::ConfigNotFound {
            path: PathBuf::from("/repo/.tfguard.yml"),
        };
        assert!(err.to_string().contains("/repo/.tfguard.yml"));
    }

    #[test]
    fn config_parse_error_displays_path_and_message() {
        let err = TfguardError::ConfigParseError {
            path: PathBuf::from("/config.yml"),
            message: "invalid syntax".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("/config.yml"));
        assert!(msg.contains("invalid syntax"));
    }

    #[test]
    fn tree_parse_error_displays_path() {
        let err = TfguardError::TreeParseError {
            path: PathBuf::from("main.tf"),
            message: "expected value".into(),
        };
        assert!(err.to_string().contains("main.tf"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: TfguardError = io_err.into();
        assert!(matches!(err, TfguardError::Io(_)));
    }
}
