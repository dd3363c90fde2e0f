//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Configurable log levels, overridable through `RUST_LOG`
//! - Console output on stderr
//! - JSON-formatted local file logging with rotation
//!
//! Log events carry categories, tokens, counts and lengths. Original span
//! text never reaches a log line.
//!
//! # Example
//!
//! ```no_run
//! use tokumei::logging::init_logging;
//! use tokumei::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log the completion of one document
///
/// # Example
///
/// ```no_run
/// use tokumei::log_document_anonymized;
/// use std::time::Duration;
///
/// log_document_anonymized!("memo.txt", 3, Duration::from_millis(4));
/// ```
#[macro_export]
macro_rules! log_document_anonymized {
    ($document:expr, $accepted:expr, $duration:expr) => {
        tracing::info!(
            document = %$document,
            accepted = $accepted,
            duration_ms = $duration.as_millis(),
            "Document written"
        );
    };
}

/// Log the end of a multi-document run
///
/// # Example
///
/// ```no_run
/// use tokumei::log_session_complete;
/// use std::time::Duration;
///
/// log_session_complete!(12, 2, Duration::from_secs(1));
/// ```
#[macro_export]
macro_rules! log_session_complete {
    ($documents:expr, $failed:expr, $duration:expr) => {
        tracing::info!(
            documents = $documents,
            failed = $failed,
            duration_ms = $duration.as_millis(),
            "Anonymization run completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use tokumei::log_error_with_context;
/// use tokumei::domain::TokumeiError;
///
/// let error = TokumeiError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::TokumeiError;
    use std::time::Duration;

    #[test]
    fn test_macros_expand_without_subscriber() {
        log_document_anonymized!("memo.txt", 2usize, Duration::from_millis(3));
        log_session_complete!(1usize, 0usize, Duration::from_secs(1));
        let error = TokumeiError::Other("boom".to_string());
        log_error_with_context!(&error, "while testing");
    }
}
