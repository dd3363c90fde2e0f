//! Candidate span recognition
//!
//! A recognizer is a pure `text -> raw spans` function. The engine never
//! cares how the spans were found: the built-in regex library, spans
//! replayed from an external NER model, or a test double all plug in
//! through [`Recognizer`].

pub mod patterns;
pub mod regex;
pub mod span_list;

use crate::anonymization::models::RawSpan;
use anyhow::Result;
use std::sync::Arc;

pub use self::regex::PatternRecognizer;
pub use span_list::SpanListRecognizer;

/// Trait for span recognizer implementations
pub trait Recognizer: Send + Sync {
    /// Candidate spans in `text`, with character offsets
    fn recognize(&self, text: &str) -> Result<Vec<RawSpan>>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Runs several recognizers and concatenates their spans
pub struct CompositeRecognizer {
    recognizers: Vec<Arc<dyn Recognizer>>,
}

impl CompositeRecognizer {
    /// Creates a composite over `recognizers`, queried in order
    pub fn new(recognizers: Vec<Arc<dyn Recognizer>>) -> Self {
        Self { recognizers }
    }

    /// Appends another recognizer
    pub fn push(&mut self, recognizer: Arc<dyn Recognizer>) {
        self.recognizers.push(recognizer);
    }

    /// Number of wrapped recognizers
    pub fn len(&self) -> usize {
        self.recognizers.len()
    }

    /// Whether no recognizer is wrapped
    pub fn is_empty(&self) -> bool {
        self.recognizers.is_empty()
    }
}

impl Recognizer for CompositeRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<RawSpan>> {
        let mut spans = Vec::new();
        for recognizer in &self.recognizers {
            let found = recognizer.recognize(text)?;
            tracing::trace!(
                recognizer = recognizer.name(),
                spans = found.len(),
                "Recognizer finished"
            );
            spans.extend(found);
        }
        Ok(spans)
    }

    fn name(&self) -> &str {
        "composite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<RawSpan>);

    impl Recognizer for Fixed {
        fn recognize(&self, _text: &str) -> Result<Vec<RawSpan>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct Failing;

    impl Recognizer for Failing {
        fn recognize(&self, _text: &str) -> Result<Vec<RawSpan>> {
            anyhow::bail!("model unavailable")
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_composite_concatenates() {
        let composite = CompositeRecognizer::new(vec![
            Arc::new(Fixed(vec![RawSpan::new(0, 2, "PERSON", 0.9)])),
            Arc::new(Fixed(vec![RawSpan::new(3, 5, "ORG", 0.8)])),
        ]);

        let spans = composite.recognize("abcdef").unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].label, "ORG");
    }

    #[test]
    fn test_composite_propagates_failure() {
        let mut composite = CompositeRecognizer::new(vec![]);
        assert!(composite.is_empty());
        composite.push(Arc::new(Failing));
        assert!(composite.recognize("text").is_err());
    }
}
