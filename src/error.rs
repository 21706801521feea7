use std::path::PathBuf;

use thiserror::Error;

/// Main application error type that encompasses all possible failure modes
///
/// Findings about the checked extension are never errors: they are reported
/// as diagnostics. These variants cover failures of the checker itself.
#[derive(Error, Debug)]
pub enum CheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error("File system traversal error: {path} - {reason}")]
    FileSystemTraversal { path: PathBuf, reason: String },

    #[error("Check timed out: {file} after {timeout_ms}ms")]
    Timeout { file: PathBuf, timeout_ms: u64 },

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },

    #[error("Unknown rule: {0}")]
    UnknownRule(String),
}

/// Grammar document loading errors
///
/// `Clone` so that a failed load can be shared by every caller waiting on the
/// same cache entry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GrammarError {
    #[error("Failed to read grammar {path}: {details}")]
    Io { path: PathBuf, details: String },

    #[error("Malformed grammar document {name}: {details}")]
    Json { name: String, details: String },

    #[error("Unknown child mode '{mode}' for <{child}> in ruleset '{ruleset}'")]
    UnknownMode {
        ruleset: String,
        child: String,
        mode: String,
    },

    #[error("Invalid grammar document {name}: {details}")]
    InvalidDocument { name: String, details: String },
}

impl From<crate::config::ConfigError> for CheckError {
    fn from(err: crate::config::ConfigError) -> Self {
        CheckError::Config(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CheckError>;

/// Grammar result type alias
pub type GrammarResult<T> = std::result::Result<T, GrammarError>;
