//! In-memory protection for original span text
//!
//! The session vault is the only place where the plaintext behind a token
//! lives. Originals are wrapped in a `secrecy::Secret` so they are zeroed
//! when dropped and never show up in `Debug` output.
//!
//! # Example
//!
//! ```rust
//! use tokumei::domain::sensitive::sensitive_text;
//! use secrecy::ExposeSecret;
//!
//! let original = sensitive_text("山田太郎");
//! assert_eq!(original.expose_secret().as_str(), "山田太郎");
//! assert!(!format!("{original:?}").contains("山田"));
//! ```

use secrecy::{CloneableSecret, DebugSecret, Secret};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Newtype wrapper for String that implements the required traits for Secret
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SensitiveValue(String);

impl CloneableSecret for SensitiveValue {}
impl DebugSecret for SensitiveValue {}

impl SensitiveValue {
    /// Returns the protected text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the protected text in characters
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

impl From<String> for SensitiveValue {
    fn from(s: String) -> Self {
        SensitiveValue(s)
    }
}

impl From<&str> for SensitiveValue {
    fn from(s: &str) -> Self {
        SensitiveValue(s.to_string())
    }
}

impl PartialEq<str> for SensitiveValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl AsRef<str> for SensitiveValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Original span text held by the vault
///
/// - Zeros the memory when dropped
/// - Prevents accidental logging via Debug
/// - Requires explicit `expose_secret()` to access
pub type SensitiveText = Secret<SensitiveValue>;

/// Wraps a string as [`SensitiveText`]
#[inline]
pub fn sensitive_text(value: impl Into<SensitiveValue>) -> SensitiveText {
    Secret::new(value.into())
}
