//! Error types for the domain layer.

use thiserror::Error;

/// Errors that occur while validating a raw path as a topic name.
///
/// Rejection is a hard boundary: a rejected path must never reach the
/// broker, neither as a subscription nor as a publish. This is what stops
/// wildcard subscription hijacking and cross-topic injection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    #[error("Topic '{raw}' contains characters outside [a-z0-9._-]")]
    InvalidCharacters { raw: String },
}

impl TopicError {
    /// Creates an invalid-characters rejection for the given raw input.
    pub fn invalid(raw: impl Into<String>) -> Self {
        TopicError::InvalidCharacters { raw: raw.into() }
    }
}
