//! Result type aliases for Tokumei
//!
//! [`Result`] carries the application-wide [`TokumeiError`]; [`CoreResult`]
//! is used by the anonymization core, which only raises
//! [`AnonymizationError`].

use super::errors::{AnonymizationError, TokumeiError};

/// Result type alias for Tokumei operations
///
/// # Examples
///
/// ```
/// use tokumei::domain::result::Result;
/// use tokumei::domain::errors::TokumeiError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(TokumeiError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, TokumeiError>;

/// Result type alias for the span resolution and token mapping core
pub type CoreResult<T> = std::result::Result<T, AnonymizationError>;
