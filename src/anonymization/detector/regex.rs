//! Regex-based span recognizer

use super::{patterns::PatternRegistry, Recognizer};
use crate::anonymization::models::RawSpan;
use crate::anonymization::text::CharIndex;
use anyhow::Result;
use std::sync::Arc;

/// Recognizer backed by a [`PatternRegistry`]
///
/// Every match of every pattern becomes a candidate; overlaps between
/// patterns are left to the resolver.
pub struct PatternRecognizer {
    pattern_registry: Arc<PatternRegistry>,
}

impl PatternRecognizer {
    /// Create a new recognizer with the built-in pattern library
    pub fn new() -> Result<Self> {
        let registry = PatternRegistry::default_patterns()?;
        Ok(Self::with_registry(registry))
    }

    /// Create a new recognizer with a custom pattern registry
    pub fn with_registry(registry: PatternRegistry) -> Self {
        Self {
            pattern_registry: Arc::new(registry),
        }
    }

    /// The patterns in use
    pub fn registry(&self) -> &PatternRegistry {
        &self.pattern_registry
    }
}

impl Recognizer for PatternRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<RawSpan>> {
        let chars = CharIndex::new(text);
        let mut spans = Vec::new();

        for pattern in self.pattern_registry.all_patterns() {
            for matched in pattern.regex.find_iter(text) {
                if matched.as_str().is_empty() {
                    continue;
                }
                // Matches of a str regex always sit on char boundaries
                let (Some(start), Some(end)) = (
                    chars.char_offset(matched.start()),
                    chars.char_offset(matched.end()),
                ) else {
                    continue;
                };
                spans.push(
                    RawSpan::new(start, end, pattern.category.label(), pattern.confidence)
                        .with_text(matched.as_str()),
                );
            }
        }

        Ok(spans)
    }

    fn name(&self) -> &str {
        "patterns"
    }
}
