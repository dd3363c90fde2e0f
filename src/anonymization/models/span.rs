//! Span data models

use super::Category;
use crate::anonymization::text::CharIndex;
use crate::domain::{AnonymizationError, CoreResult, Token};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::Range;

/// Where a candidate span came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanSource {
    /// An external recognizer or the pattern library
    Recognizer,
    /// A literal registered through the pattern learner
    Learned,
}

/// Candidate span as emitted by a recognizer
///
/// Offsets are character offsets into the exact text handed to the
/// recognizer. The label is free-form until it is mapped onto a
/// [`Category`]; `text`, when present, must equal the slice the offsets
/// denote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSpan {
    pub start: usize,
    pub end: usize,
    pub label: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl RawSpan {
    /// Creates a raw span without recognizer-supplied text
    pub fn new(start: usize, end: usize, label: impl Into<String>, score: f64) -> Self {
        Self {
            start,
            end,
            label: label.into(),
            score,
            text: None,
        }
    }

    /// Attaches the text the recognizer saw
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Labeled, scored, half-open interval `[start, end)` of characters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub label: Category,
    pub score: f64,
    pub source: SpanSource,
}

impl Span {
    /// Creates a span, checking it against the length of the text it covers
    ///
    /// # Errors
    ///
    /// Returns [`AnonymizationError::InvalidSpan`] when the interval is empty,
    /// reversed or past the end of the text, or when the score is not a
    /// number in `[0, 1]`.
    pub fn new(
        start: usize,
        end: usize,
        label: Category,
        score: f64,
        source: SpanSource,
        text_len: usize,
    ) -> CoreResult<Self> {
        validate_bounds(start, end, text_len)?;
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(AnonymizationError::invalid_span(
                start,
                end,
                text_len,
                format!("score {score} is outside [0, 1]"),
            ));
        }

        Ok(Self {
            start,
            end,
            label,
            score,
            source,
        })
    }

    /// Promotes a recognizer span whose label is already mapped
    ///
    /// Besides the checks of [`Span::new`], a recognizer-supplied `text`
    /// must match the slice of `text` the offsets denote.
    pub fn from_raw(
        raw: &RawSpan,
        label: Category,
        text: &str,
        chars: &CharIndex,
    ) -> CoreResult<Self> {
        let span = Self::new(
            raw.start,
            raw.end,
            label,
            raw.score,
            SpanSource::Recognizer,
            chars.char_len(),
        )?;

        if let Some(expected) = raw.text.as_deref() {
            if span.slice(text, chars) != Some(expected) {
                return Err(AnonymizationError::invalid_span(
                    raw.start,
                    raw.end,
                    chars.char_len(),
                    "recognizer text does not match the offsets",
                ));
            }
        }

        Ok(span)
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always false for a validated span
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Character range covered by the span
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether the two half-open intervals share at least one character
    pub fn overlaps(&self, other: &Range<usize>) -> bool {
        !other.is_empty() && self.start < other.end && other.start < self.end
    }

    /// The covered text
    pub fn slice<'t>(&self, text: &'t str, chars: &CharIndex) -> Option<&'t str> {
        chars.slice(text, self.start, self.end)
    }

    /// Resolution priority: the span ordering first wins
    ///
    /// Higher score first, then learned rules ahead of recognizer spans,
    /// then longer spans, then the left-most start, then category order.
    /// Callers break any remaining tie by insertion order.
    pub fn priority_cmp(&self, other: &Span) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.source_rank().cmp(&other.source_rank()))
            .then_with(|| other.len().cmp(&self.len()))
            .then_with(|| self.start.cmp(&other.start))
            .then_with(|| self.label.cmp(&other.label))
    }

    fn source_rank(&self) -> u8 {
        match self.source {
            SpanSource::Learned => 0,
            SpanSource::Recognizer => 1,
        }
    }
}

/// Checks `0 <= start < end <= text_len`
pub(crate) fn validate_bounds(start: usize, end: usize, text_len: usize) -> CoreResult<()> {
    let reason = if start >= end {
        "span is empty or reversed"
    } else if end > text_len {
        "span ends past the end of the text"
    } else {
        return Ok(());
    };
    Err(AnonymizationError::invalid_span(start, end, text_len, reason))
}

/// A span promoted to the non-overlapping cover, with its token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedSpan {
    #[serde(flatten)]
    pub span: Span,
    pub token: Token,
}

/// Why a candidate lost resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum RejectionReason {
    /// Score below the configured minimum confidence
    LowConfidence,
    /// Intersects a higher-priority accepted span
    Overlap { winner_start: usize, winner_end: usize },
}

/// A candidate that did not make it into the cover
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedSpan {
    #[serde(flatten)]
    pub span: Span,
    #[serde(flatten)]
    pub reason: RejectionReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize, score: f64, source: SpanSource) -> Span {
        Span::new(start, end, Category::Person, score, source, 100).unwrap()
    }

    #[test]
    fn test_span_validation() {
        assert!(Span::new(0, 4, Category::Person, 0.9, SpanSource::Recognizer, 4).is_ok());
        assert!(Span::new(3, 3, Category::Person, 0.9, SpanSource::Recognizer, 4).is_err());
        assert!(Span::new(3, 2, Category::Person, 0.9, SpanSource::Recognizer, 4).is_err());
        assert!(Span::new(2, 5, Category::Person, 0.9, SpanSource::Recognizer, 4).is_err());
        assert!(Span::new(0, 1, Category::Person, 1.5, SpanSource::Recognizer, 4).is_err());
        assert!(Span::new(0, 1, Category::Person, f64::NAN, SpanSource::Recognizer, 4).is_err());
    }

    #[test]
    fn test_from_raw_checks_text() {
        let text = "山田太郎さん";
        let chars = CharIndex::new(text);

        let ok = RawSpan::new(0, 4, "PERSON", 0.9).with_text("山田太郎");
        assert!(Span::from_raw(&ok, Category::Person, text, &chars).is_ok());

        let mismatch = RawSpan::new(0, 4, "PERSON", 0.9).with_text("山田");
        let err = Span::from_raw(&mismatch, Category::Person, text, &chars).unwrap_err();
        assert!(matches!(err, AnonymizationError::InvalidSpan { .. }));
    }

    #[test]
    fn test_overlaps_is_half_open() {
        let s = span(2, 5, 0.5, SpanSource::Recognizer);
        assert!(s.overlaps(&(4..6)));
        assert!(s.overlaps(&(0..3)));
        assert!(!s.overlaps(&(5..7)));
        assert!(!s.overlaps(&(0..2)));
    }

    #[test]
    fn test_priority_prefers_score_then_learned_then_length() {
        let high = span(0, 2, 0.9, SpanSource::Recognizer);
        let low = span(0, 8, 0.5, SpanSource::Recognizer);
        assert_eq!(high.priority_cmp(&low), Ordering::Less);

        let learned = span(0, 2, 0.9, SpanSource::Learned);
        assert_eq!(learned.priority_cmp(&high), Ordering::Less);

        let longer = span(3, 9, 0.9, SpanSource::Recognizer);
        assert_eq!(longer.priority_cmp(&high), Ordering::Less);

        let left = span(0, 2, 0.9, SpanSource::Recognizer);
        let right = span(5, 7, 0.9, SpanSource::Recognizer);
        assert_eq!(left.priority_cmp(&right), Ordering::Less);
    }

    #[test]
    fn test_raw_span_deserializes_without_text() {
        let raw: RawSpan =
            serde_json::from_str(r#"{"start":0,"end":4,"label":"PER","score":0.8}"#).unwrap();
        assert_eq!(raw, RawSpan::new(0, 4, "PER", 0.8));
    }
}
