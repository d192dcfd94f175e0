//! Errors raised by the analysis core

use thiserror::Error;

/// Errors from extraction, scoring, and configuration
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input that is not text (e.g. non-UTF-8 bytes, missing content)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A URL-like match whose hostname cannot be parsed.
    /// Recovered inside the extractor; never returned from `extract`.
    #[error("Malformed URL candidate {candidate}: {reason}")]
    MalformedUrlCandidate { candidate: String, reason: String },

    #[error("Invalid keyword pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
