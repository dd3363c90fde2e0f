//! Interval index over candidate spans
//!
//! Spans are kept in a `BTreeMap` ordered by start offset. Because every
//! stored span is at most `max_len` characters long, a span overlapping
//! `[a, b)` must start in `[a - max_len, b)`, so an overlap query walks only
//! that key range instead of the whole set.

use crate::anonymization::models::{validate_bounds, Span};
use crate::domain::CoreResult;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::Range;

/// Handle to a span stored in an [`IntervalIndex`]
///
/// Keys order by position, then by insertion, so iterating an index is
/// deterministic and `slot` doubles as the insertion-order tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanKey {
    pub start: usize,
    pub end: usize,
    pub slot: u64,
}

impl SpanKey {
    fn lower_bound(start: usize) -> Self {
        Self {
            start,
            end: 0,
            slot: 0,
        }
    }
}

/// Ordered store of spans supporting overlap queries
#[derive(Debug, Clone)]
pub struct IntervalIndex {
    spans: BTreeMap<SpanKey, Span>,
    text_len: usize,
    max_len: usize,
    next_slot: u64,
}

impl IntervalIndex {
    /// Creates an empty index for a text of `text_len` characters
    pub fn new(text_len: usize) -> Self {
        Self {
            spans: BTreeMap::new(),
            text_len,
            max_len: 0,
            next_slot: 0,
        }
    }

    /// Stores a span; duplicates are kept and collapse during resolution
    ///
    /// # Errors
    ///
    /// Returns `InvalidSpan` when the span is empty or reaches past the end of
    /// the indexed text.
    pub fn insert(&mut self, span: Span) -> CoreResult<SpanKey> {
        validate_bounds(span.start, span.end, self.text_len)?;

        let key = SpanKey {
            start: span.start,
            end: span.end,
            slot: self.next_slot,
        };
        self.next_slot += 1;
        self.max_len = self.max_len.max(span.len());
        self.spans.insert(key, span);
        Ok(key)
    }

    /// Removes a span, returning it if it was still present
    ///
    /// `max_len` is left untouched; it stays a valid upper bound.
    pub fn remove(&mut self, key: SpanKey) -> Option<Span> {
        self.spans.remove(&key)
    }

    /// Looks up a stored span
    pub fn get(&self, key: SpanKey) -> Option<&Span> {
        self.spans.get(&key)
    }

    /// All stored spans intersecting `range`
    ///
    /// The iterator is lazy and can be cloned to restart a scan. Callers
    /// must not rely on the order of the results.
    pub fn query_overlaps(&self, range: Range<usize>) -> Overlaps<'_> {
        let lower = range.start.saturating_sub(self.max_len);
        let upper = range.end.max(lower);
        Overlaps {
            inner: self
                .spans
                .range(SpanKey::lower_bound(lower)..SpanKey::lower_bound(upper)),
            query: range,
        }
    }

    /// Keys of every stored span, in key order
    pub fn keys(&self) -> Vec<SpanKey> {
        self.spans.keys().copied().collect()
    }

    /// Number of stored spans
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether the index holds no spans
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Iterator returned by [`IntervalIndex::query_overlaps`]
#[derive(Debug, Clone)]
pub struct Overlaps<'a> {
    inner: btree_map::Range<'a, SpanKey, Span>,
    query: Range<usize>,
}

impl<'a> Iterator for Overlaps<'a> {
    type Item = (SpanKey, &'a Span);

    fn next(&mut self) -> Option<Self::Item> {
        for (key, span) in self.inner.by_ref() {
            if span.overlaps(&self.query) {
                return Some((*key, span));
            }
        }
        None
    }
}
