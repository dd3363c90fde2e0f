//! Session token vault
//!
//! Holds the forward `(original, category) -> token` and reverse
//! `token -> (original, category)` tables of one session. Both directions
//! are written together or not at all.
//!
//! Tokens are the lowercase hex SHA-256 of the normalized original and its
//! category, truncated to the configured width. When a truncated digest is
//! already held by a different entry, `-1`, `-2`, ... is appended until a
//! free token is found or the retry budget runs out.

use crate::anonymization::models::Category;
use crate::anonymization::text::normalize;
use crate::domain::{sensitive_text, AnonymizationError, CoreResult, SensitiveText, Token};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, warn};
use zeroize::Zeroize;

/// Default number of hex characters in a token
pub const DEFAULT_TOKEN_WIDTH: usize = 8;

/// Default number of `-N` extensions tried after a digest collision
pub const DEFAULT_MAX_COLLISION_RETRIES: u32 = 16;

/// Digest used to derive token candidates
pub trait TokenDigest: Send + Sync {
    /// Lowercase hex digest of `input`
    fn hex_digest(&self, input: &[u8]) -> String;
}

/// SHA-256 token digest
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl TokenDigest for Sha256Digest {
    fn hex_digest(&self, input: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input);
        format!("{:x}", hasher.finalize())
    }
}

/// Result of a successful [`TokenVault::assign_token`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAssignment {
    pub token: Token,
    /// True when the pair was already mapped in this session
    pub reused: bool,
}

/// Reverse-table entry
struct VaultEntry {
    original: SensitiveText,
    category: Category,
}

/// Read-only view of one mapping, without the original text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingView {
    pub token: Token,
    pub category: Category,
    /// Length of the original in characters
    pub original_chars: usize,
}

/// Bidirectional token mapping of one session
pub struct TokenVault {
    width: usize,
    max_retries: u32,
    digest: Box<dyn TokenDigest>,
    forward: HashMap<Category, HashMap<String, Token>>,
    reverse: HashMap<Token, VaultEntry>,
}

impl TokenVault {
    /// Creates an empty vault using SHA-256
    pub fn new(width: usize, max_retries: u32) -> Self {
        Self::with_digest(width, max_retries, Box::new(Sha256Digest))
    }

    /// Creates an empty vault with a custom digest
    pub fn with_digest(width: usize, max_retries: u32, digest: Box<dyn TokenDigest>) -> Self {
        Self {
            width: width.max(1),
            max_retries,
            digest,
            forward: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    /// Returns the token for `(source_text, category)`, issuing one if needed
    ///
    /// Calling this again with the same arguments returns the same token and
    /// changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AnonymizationError::TokenSpaceExhausted`] when the base token
    /// and all of its extensions are held by other entries. The vault is
    /// left unchanged.
    pub fn assign_token(
        &mut self,
        source_text: &str,
        category: Category,
    ) -> CoreResult<TokenAssignment> {
        if let Some(token) = self.lookup(source_text, category) {
            return Ok(TokenAssignment {
                token: token.clone(),
                reused: true,
            });
        }

        let base = self.base_token(source_text, category);
        for extension in 0..=self.max_retries {
            let candidate = Token::from_parts(&base, extension);
            if self.reverse.contains_key(&candidate) {
                continue;
            }
            if extension > 0 {
                debug!(
                    token = %candidate,
                    category = %category,
                    extension,
                    "Extended token after digest collision"
                );
            }
            self.commit(source_text, category, candidate.clone());
            return Ok(TokenAssignment {
                token: candidate,
                reused: false,
            });
        }

        warn!(
            category = %category,
            attempts = self.max_retries + 1,
            "Token space exhausted"
        );
        Err(AnonymizationError::TokenSpaceExhausted {
            category,
            attempts: self.max_retries + 1,
        })
    }

    /// Assigns tokens to a batch, all or nothing
    ///
    /// If any assignment fails, tokens issued earlier in the same batch are
    /// revoked before the error is returned.
    pub fn assign_all<'s>(
        &mut self,
        items: impl IntoIterator<Item = (&'s str, Category)>,
    ) -> CoreResult<Vec<TokenAssignment>> {
        let mut assignments = Vec::new();
        for (source_text, category) in items {
            match self.assign_token(source_text, category) {
                Ok(assignment) => assignments.push(assignment),
                Err(err) => {
                    for issued in assignments.iter().filter(|a| !a.reused) {
                        self.revoke(&issued.token);
                    }
                    return Err(err);
                }
            }
        }
        Ok(assignments)
    }

    /// Original text behind a token
    ///
    /// # Errors
    ///
    /// Returns [`AnonymizationError::UnknownToken`] if the token was never
    /// issued in this session.
    pub fn resolve_token(&self, token: &str) -> CoreResult<&str> {
        self.reverse
            .get(token)
            .map(|entry| entry.original.expose_secret().as_str())
            .ok_or_else(|| AnonymizationError::UnknownToken(token.to_string()))
    }

    /// Token already mapped to `(source_text, category)`, if any
    pub fn lookup(&self, source_text: &str, category: Category) -> Option<&Token> {
        self.forward
            .get(&category)
            .and_then(|by_text| by_text.get(source_text))
    }

    /// Every mapping, sorted by token, without originals
    pub fn mappings(&self) -> Vec<MappingView> {
        let mut views: Vec<MappingView> = self
            .reverse
            .iter()
            .map(|(token, entry)| MappingView {
                token: token.clone(),
                category: entry.category,
                original_chars: entry.original.expose_secret().char_len(),
            })
            .collect();
        views.sort_by(|a, b| a.token.cmp(&b.token));
        views
    }

    /// Number of issued tokens
    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    /// Whether no token has been issued
    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// Drops every mapping, zeroing stored originals
    pub fn clear(&mut self) {
        for (_, mut by_text) in self.forward.drain() {
            for (mut original, _) in by_text.drain() {
                original.zeroize();
            }
        }
        // Originals in the reverse table are zeroed when their Secret drops
        self.reverse.clear();
    }

    fn base_token(&self, source_text: &str, category: Category) -> String {
        let input = format!("{}\u{1f}{}", normalize(source_text), category.label());
        let mut digest = self.digest.hex_digest(input.as_bytes());
        digest.truncate(self.width);
        digest
    }

    fn commit(&mut self, source_text: &str, category: Category, token: Token) {
        self.reverse.insert(
            token.clone(),
            VaultEntry {
                original: sensitive_text(source_text),
                category,
            },
        );
        self.forward
            .entry(category)
            .or_default()
            .insert(source_text.to_string(), token);
    }

    fn revoke(&mut self, token: &Token) {
        if let Some(entry) = self.reverse.remove(token) {
            if let Some(by_text) = self.forward.get_mut(&entry.category) {
                if let Some(mut original) = by_text
                    .remove_entry(entry.original.expose_secret().as_str())
                    .map(|(original, _)| original)
                {
                    original.zeroize();
                }
            }
        }
    }
}

impl Default for TokenVault {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_WIDTH, DEFAULT_MAX_COLLISION_RETRIES)
    }
}

impl Drop for TokenVault {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for TokenVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVault")
            .field("width", &self.width)
            .field("max_retries", &self.max_retries)
            .field("tokens", &self.reverse.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Digest that maps every input to the same value
    struct ConstantDigest;

    impl TokenDigest for ConstantDigest {
        fn hex_digest(&self, _input: &[u8]) -> String {
            "0123456789abcdef".to_string()
        }
    }

    #[test]
    fn test_assign_is_deterministic_across_sessions() {
        let mut a = TokenVault::default();
        let mut b = TokenVault::default();

        let ta = a.assign_token("山田太郎", Category::Person).unwrap();
        let tb = b.assign_token("山田太郎", Category::Person).unwrap();

        assert_eq!(ta.token, tb.token);
        assert_eq!(ta.token.as_str().len(), DEFAULT_TOKEN_WIDTH);
        assert!(!ta.reused);
    }

    #[test]
    fn test_assign_reuses_existing_mapping() {
        let mut vault = TokenVault::default();
        let first = vault.assign_token("yamada@example.com", Category::Email).unwrap();
        let second = vault.assign_token("yamada@example.com", Category::Email).unwrap();

        assert_eq!(first.token, second.token);
        assert!(second.reused);
        assert_eq!(vault.len(), 1);
    }

    #[test]
    fn test_category_is_part_of_the_key() {
        let mut vault = TokenVault::default();
        let as_person = vault.assign_token("東京", Category::Person).unwrap();
        let as_location = vault.assign_token("東京", Category::Location).unwrap();

        assert_ne!(as_person.token, as_location.token);
        assert_eq!(vault.lookup("東京", Category::Location), Some(&as_location.token));
        assert_eq!(vault.lookup("東京", Category::Person), Some(&as_person.token));
    }

    #[test]
    fn test_normalized_variant_gets_extended_token() {
        let mut vault = TokenVault::default();
        let exact = vault.assign_token("Project-X", Category::Project).unwrap();
        let variant = vault.assign_token("project-x", Category::Project).unwrap();

        assert_eq!(variant.token.base(), exact.token.as_str());
        assert_eq!(variant.token.extension(), Some(1));
        assert_eq!(vault.resolve_token(exact.token.as_str()).unwrap(), "Project-X");
        assert_eq!(vault.resolve_token(variant.token.as_str()).unwrap(), "project-x");
    }

    #[test]
    fn test_collision_extension_sequence() {
        let mut vault = TokenVault::with_digest(8, 3, Box::new(ConstantDigest));
        let tokens: Vec<String> = ["a", "b", "c", "d"]
            .iter()
            .map(|s| vault.assign_token(s, Category::Custom).unwrap().token.into_inner())
            .collect();

        assert_eq!(tokens, vec!["01234567", "01234567-1", "01234567-2", "01234567-3"]);
    }

    #[test]
    fn test_token_space_exhausted_leaves_vault_unchanged() {
        let mut vault = TokenVault::with_digest(8, 1, Box::new(ConstantDigest));
        vault.assign_token("a", Category::Custom).unwrap();
        vault.assign_token("b", Category::Custom).unwrap();

        let err = vault.assign_token("c", Category::Custom).unwrap_err();
        assert_eq!(
            err,
            AnonymizationError::TokenSpaceExhausted {
                category: Category::Custom,
                attempts: 2
            }
        );
        assert_eq!(vault.len(), 2);
        assert!(vault.lookup("c", Category::Custom).is_none());
    }

    #[test]
    fn test_assign_all_rolls_back_on_failure() {
        let mut vault = TokenVault::with_digest(8, 1, Box::new(ConstantDigest));
        let kept = vault.assign_token("a", Category::Custom).unwrap();

        let result = vault.assign_all([
            ("a", Category::Custom),
            ("b", Category::Custom),
            ("c", Category::Custom),
        ]);

        assert!(result.is_err());
        assert_eq!(vault.len(), 1);
        assert_eq!(vault.lookup("a", Category::Custom), Some(&kept.token));
        assert!(vault.lookup("b", Category::Custom).is_none());
    }

    #[test]
    fn test_resolve_unknown_token() {
        let vault = TokenVault::default();
        let err = vault.resolve_token("abcdef01").unwrap_err();
        assert_eq!(err, AnonymizationError::UnknownToken("abcdef01".to_string()));
    }

    #[test]
    fn test_forward_and_reverse_stay_symmetric() {
        let mut vault = TokenVault::default();
        let inputs = [
            ("佐藤", Category::Person),
            ("営業部", Category::Department),
            ("03-1234-5678", Category::Phone),
            ("佐藤", Category::Person),
        ];
        for (text, category) in inputs {
            let assignment = vault.assign_token(text, category).unwrap();
            assert_eq!(vault.resolve_token(assignment.token.as_str()).unwrap(), text);
            assert_eq!(vault.lookup(text, category), Some(&assignment.token));
        }
        assert_eq!(vault.len(), 3);
    }

    #[test]
    fn test_width_controls_token_length() {
        let mut vault = TokenVault::new(12, 4);
        let assignment = vault.assign_token("株式会社テスト", Category::Org).unwrap();
        assert_eq!(assignment.token.as_str().len(), 12);
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut vault = TokenVault::default();
        let assignment = vault.assign_token("鈴木", Category::Person).unwrap();
        vault.clear();

        assert!(vault.is_empty());
        assert!(vault.resolve_token(assignment.token.as_str()).is_err());
        assert!(vault.lookup("鈴木", Category::Person).is_none());
    }

    #[test]
    fn test_mappings_hide_originals() {
        let mut vault = TokenVault::default();
        vault.assign_token("田中一郎", Category::Person).unwrap();
        let views = vault.mappings();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].original_chars, 4);
        assert!(!format!("{vault:?}").contains("田中"));
    }
}
