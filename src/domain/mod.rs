//! Domain types shared across Tokumei.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`Token`], [`SessionId`])
//! - **Error types** ([`TokumeiError`], [`AnonymizationError`])
//! - **Result type aliases** ([`Result`], [`CoreResult`])
//! - **Protected plaintext** ([`SensitiveText`]) for originals held by the vault
//!
//! # Type Safety
//!
//! Tokens are validated on construction, so a string that made it into a
//! [`Token`] is always lowercase hex with an optional `-N` extension:
//!
//! ```rust
//! use tokumei::domain::Token;
//!
//! assert!(Token::new("a1b2c3d4").is_ok());
//! assert!(Token::new("<<a1b2c3d4>>").is_err());
//! ```
//!
//! # Error Handling
//!
//! Core operations return [`CoreResult`]; the `?` operator lifts their
//! errors into [`TokumeiError`]:
//!
//! ```rust
//! use tokumei::domain::{AnonymizationError, CoreResult, Result};
//!
//! fn core() -> CoreResult<()> {
//!     Err(AnonymizationError::UnknownToken("0000ffff".to_string()))
//! }
//!
//! fn app() -> Result<()> {
//!     core()?;
//!     Ok(())
//! }
//!
//! assert!(app().is_err());
//! ```

pub mod errors;
pub mod ids;
pub mod result;
pub mod sensitive;

// Re-export commonly used types for convenience
pub use errors::{AnonymizationError, TokumeiError};
pub use ids::{SessionId, Token, MARKER_CLOSE, MARKER_OPEN};
pub use result::{CoreResult, Result};
pub use sensitive::{sensitive_text, SensitiveText, SensitiveValue};
