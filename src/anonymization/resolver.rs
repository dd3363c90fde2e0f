//! Conflict resolution of overlapping candidates
//!
//! Greedy interval scheduling by priority: candidates are visited best
//! first, and each accepted span evicts every remaining candidate it
//! intersects. A candidate still present in the index when its turn comes
//! therefore overlaps nothing accepted so far.

use crate::anonymization::index::{IntervalIndex, SpanKey};
use crate::anonymization::models::{RejectedSpan, RejectionReason, Span};
use tracing::debug;

/// Default minimum confidence a candidate needs to be considered
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;

/// Outcome of one resolution pass
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Non-overlapping spans in position order
    pub accepted: Vec<Span>,
    /// Everything else, with the reason it lost
    pub rejected: Vec<RejectedSpan>,
}

impl Resolution {
    /// Number of candidates dropped for low confidence
    pub fn low_confidence_count(&self) -> usize {
        self.rejected
            .iter()
            .filter(|r| r.reason == RejectionReason::LowConfidence)
            .count()
    }

    /// Number of candidates that lost to an overlapping winner
    pub fn overlap_count(&self) -> usize {
        self.rejected.len() - self.low_confidence_count()
    }
}

/// Turns overlapping candidates into a non-overlapping cover
#[derive(Debug, Clone, Copy)]
pub struct ConflictResolver {
    min_confidence: f64,
}

impl ConflictResolver {
    /// Creates a resolver; the threshold is clamped to `[0, 1]`
    pub fn new(min_confidence: f64) -> Self {
        Self {
            min_confidence: min_confidence.clamp(0.0, 1.0),
        }
    }

    /// Minimum confidence a candidate needs
    pub fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Resolves all candidates held by `candidates`
    ///
    /// The index is drained: accepted spans are removed as they win, losers
    /// as they are evicted.
    pub fn resolve(&self, mut candidates: IntervalIndex) -> Resolution {
        let mut resolution = Resolution::default();

        let mut order: Vec<SpanKey> = Vec::with_capacity(candidates.len());
        for key in candidates.keys() {
            let below_threshold = candidates
                .get(key)
                .is_some_and(|span| span.score < self.min_confidence);
            if below_threshold {
                if let Some(span) = candidates.remove(key) {
                    resolution.rejected.push(RejectedSpan {
                        span,
                        reason: RejectionReason::LowConfidence,
                    });
                }
            } else {
                order.push(key);
            }
        }

        order.sort_by(|a, b| match (candidates.get(*a), candidates.get(*b)) {
            (Some(x), Some(y)) => x.priority_cmp(y).then_with(|| a.slot.cmp(&b.slot)),
            _ => a.slot.cmp(&b.slot),
        });

        for key in order {
            let Some(winner) = candidates.remove(key) else {
                continue;
            };

            let losers: Vec<SpanKey> = candidates
                .query_overlaps(winner.range())
                .map(|(loser, _)| loser)
                .collect();
            for loser in losers {
                if let Some(span) = candidates.remove(loser) {
                    resolution.rejected.push(RejectedSpan {
                        span,
                        reason: RejectionReason::Overlap {
                            winner_start: winner.start,
                            winner_end: winner.end,
                        },
                    });
                }
            }

            resolution.accepted.push(winner);
        }

        resolution.accepted.sort_by_key(|span| span.start);

        debug!(
            accepted = resolution.accepted.len(),
            rejected_low_confidence = resolution.low_confidence_count(),
            rejected_overlap = resolution.overlap_count(),
            min_confidence = self.min_confidence,
            "Resolved candidate spans"
        );

        resolution
    }
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}
