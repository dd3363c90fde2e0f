//! Domain error types
//!
//! This module defines the error hierarchy for Tokumei. The anonymization
//! core raises [`AnonymizationError`]; everything around it (configuration,
//! recognizers, file I/O) is folded into [`TokumeiError`].

use crate::anonymization::models::Category;
use thiserror::Error;

/// Main Tokumei error type
///
/// This is the primary error type used throughout the application.
/// It wraps the anonymization core errors and provides context for the
/// surrounding layers.
#[derive(Debug, Error)]
pub enum TokumeiError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors raised by the span resolution and token mapping core
    #[error("Anonymization error: {0}")]
    Anonymization(#[from] AnonymizationError),

    /// An external recognizer failed to produce candidate spans
    #[error("Recognizer error: {0}")]
    Recognizer(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl TokumeiError {
    /// Returns the underlying core error, if this is one
    pub fn as_anonymization(&self) -> Option<&AnonymizationError> {
        match self {
            Self::Anonymization(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors raised by the anonymization core
///
/// Only [`AnonymizationError::InvalidSpan`] is recoverable: the offending
/// candidate is dropped and counted while the rest of the document is
/// processed. The other variants abort the current call without leaving a
/// partial mapping behind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnonymizationError {
    /// A recognizer produced a span with malformed offsets or score
    #[error("Invalid span [{start}, {end}) for text of {text_len} chars: {reason}")]
    InvalidSpan {
        start: usize,
        end: usize,
        text_len: usize,
        reason: String,
    },

    /// Every extension of a truncated digest is already taken by another entry
    #[error("Token space exhausted for {category} after {attempts} attempts")]
    TokenSpaceExhausted { category: Category, attempts: u32 },

    /// A token was never issued in this session
    #[error("Unknown token: {0}")]
    UnknownToken(String),

    /// Accepted spans handed to the rewriter were unsorted or overlapping
    #[error(
        "Overlap invariant violated: span [{start}, {end}) starts before the previous span ends at {previous_end}"
    )]
    OverlapInvariantViolation {
        start: usize,
        end: usize,
        previous_end: usize,
    },
}

impl AnonymizationError {
    /// Builds an [`AnonymizationError::InvalidSpan`]
    pub fn invalid_span(start: usize, end: usize, text_len: usize, reason: impl Into<String>) -> Self {
        Self::InvalidSpan {
            start,
            end,
            text_len,
            reason: reason.into(),
        }
    }

    /// Whether processing may continue after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidSpan { .. })
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for TokumeiError {
    fn from(err: std::io::Error) -> Self {
        TokumeiError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for TokumeiError {
    fn from(err: serde_json::Error) -> Self {
        TokumeiError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for TokumeiError {
    fn from(err: toml::de::Error) -> Self {
        TokumeiError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokumei_error_display() {
        let err = TokumeiError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_anonymization_error_conversion() {
        let core_err = AnonymizationError::UnknownToken("deadbeef".to_string());
        let err: TokumeiError = core_err.clone().into();
        assert!(matches!(err, TokumeiError::Anonymization(_)));
        assert_eq!(err.as_anonymization(), Some(&core_err));
    }

    #[test]
    fn test_invalid_span_display() {
        let err = AnonymizationError::invalid_span(5, 3, 10, "start must be before end");
        assert_eq!(
            err.to_string(),
            "Invalid span [5, 3) for text of 10 chars: start must be before end"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_token_space_exhausted_display() {
        let err = AnonymizationError::TokenSpaceExhausted {
            category: Category::Person,
            attempts: 17,
        };
        assert_eq!(
            err.to_string(),
            "Token space exhausted for PERSON after 17 attempts"
        );
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: TokumeiError = io_err.into();
        assert!(matches!(err, TokumeiError::Io(_)));
        assert!(err.as_anonymization().is_none());
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: TokumeiError = json_err.into();
        assert!(matches!(err, TokumeiError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: TokumeiError = toml_err.into();
        assert!(matches!(err, TokumeiError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let err = TokumeiError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
        let core = AnonymizationError::UnknownToken("x".to_string());
        let _: &dyn std::error::Error = &core;
    }
}
