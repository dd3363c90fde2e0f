//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers handed out by an anonymization
//! session.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opening delimiter of a token marker in anonymized text
pub const MARKER_OPEN: &str = "<<";

/// Closing delimiter of a token marker in anonymized text
pub const MARKER_CLOSE: &str = ">>";

/// Opaque token replacing a span of sensitive text
///
/// A token is lowercase hex, optionally followed by `-N` when the truncated
/// digest collided with a different entry earlier in the session.
///
/// # Examples
///
/// ```
/// use tokumei::domain::ids::Token;
/// use std::str::FromStr;
///
/// let token = Token::from_str("1a2b3c4d").unwrap();
/// assert_eq!(token.marker(), "<<1a2b3c4d>>");
///
/// let extended = Token::from_str("1a2b3c4d-2").unwrap();
/// assert_eq!(extended.base(), "1a2b3c4d");
/// assert_eq!(extended.extension(), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Token(String);

impl Token {
    /// Creates a new Token from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(Token)` if the string is lowercase hex with an optional
    /// numeric `-N` extension, `Err` otherwise
    pub fn new(token: impl Into<String>) -> Result<Self, String> {
        let token = token.into();
        let (base, extension) = match token.split_once('-') {
            Some((base, ext)) => (base, Some(ext)),
            None => (token.as_str(), None),
        };

        if base.is_empty() {
            return Err("Token cannot be empty".to_string());
        }
        if !base
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(format!("Token must be lowercase hex, got: {token}"));
        }
        if let Some(ext) = extension {
            if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("Invalid token extension in: {token}"));
            }
        }

        Ok(Self(token))
    }

    /// Builds a token from a digest prefix and a collision extension
    pub(crate) fn from_parts(base: &str, extension: u32) -> Self {
        if extension == 0 {
            Self(base.to_string())
        } else {
            Self(format!("{base}-{extension}"))
        }
    }

    /// Returns the token as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digest prefix without the collision extension
    pub fn base(&self) -> &str {
        self.0.split_once('-').map_or(self.0.as_str(), |(base, _)| base)
    }

    /// Collision extension, if any
    pub fn extension(&self) -> Option<u32> {
        self.0
            .split_once('-')
            .and_then(|(_, ext)| ext.parse().ok())
    }

    /// The token wrapped in marker delimiters, as written into anonymized text
    pub fn marker(&self) -> String {
        format!("{MARKER_OPEN}{}{MARKER_CLOSE}", self.0)
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Token {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier of one anonymization session
///
/// Sessions are never persisted; the id only correlates log lines, audit
/// entries and reports produced by the same engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a fresh random session id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid session id '{s}': {e}"))
    }
}
