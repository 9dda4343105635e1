//! Error types for the rewrite registry
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for rewrite registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the rewrite registry
#[derive(Error, Debug)]
pub enum Error {
    /// Candidate rule failed normalization
    #[error("Invalid rewrite rule: {0}")]
    Validation(String),

    /// An identical domain/answer pair is already registered
    #[error("Rewrite rule already exists: {domain} -> {answer}")]
    Duplicate {
        /// Domain of the rejected pair
        domain: String,
        /// Answer of the rejected pair
        answer: String,
    },

    /// Update target is not in the collection
    #[error("Target rule not found: {domain} -> {answer}")]
    NotFound {
        /// Domain of the missing target
        domain: String,
        /// Answer of the missing target
        answer: String,
    },

    /// Persistence sink errors
    #[error("Sink error: {0}")]
    Sink(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a duplicate error for the given pair
    pub fn duplicate(domain: impl Into<String>, answer: impl Into<String>) -> Self {
        Self::Duplicate {
            domain: domain.into(),
            answer: answer.into(),
        }
    }

    /// Create a "not found" error for the given target pair
    pub fn not_found(domain: impl Into<String>, answer: impl Into<String>) -> Self {
        Self::NotFound {
            domain: domain.into(),
            answer: answer.into(),
        }
    }

    /// Create a sink error
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error is one of the caller-recoverable rule conditions
    /// (validation, duplicate, not found)
    pub fn is_rule_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Duplicate { .. } | Self::NotFound { .. }
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_errors_are_classified() {
        assert!(Error::validation("empty domain").is_rule_error());
        assert!(Error::duplicate("a.com", "1.1.1.1").is_rule_error());
        assert!(Error::not_found("a.com", "1.1.1.1").is_rule_error());
        assert!(!Error::sink("disk full").is_rule_error());
    }

    #[test]
    fn test_duplicate_message_names_pair() {
        let err = Error::duplicate("a.com", "1.1.1.1");
        assert_eq!(err.to_string(), "Rewrite rule already exists: a.com -> 1.1.1.1");
    }
}
