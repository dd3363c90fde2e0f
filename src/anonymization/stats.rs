//! Session statistics
//!
//! Passive counters fed by the engine. Nothing here influences resolution or
//! token assignment.

use crate::anonymization::models::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Something worth counting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatEvent {
    /// A candidate entered resolution
    SpanSeen,
    /// A candidate made it into the cover
    SpanAccepted(Category),
    /// A candidate fell below the minimum confidence
    SpanRejectedLowConfidence,
    /// A candidate lost to an overlapping winner
    SpanRejectedOverlap,
    /// A recognizer span had malformed offsets or score
    SpanInvalid,
    /// A recognizer label mapped onto no category
    LabelUnmapped,
    /// The vault issued a new token
    TokenIssued,
    /// The vault returned an existing token
    TokenReused,
    /// A marker was decoded
    DecodeSuccess,
    /// A marker could not be decoded
    DecodeFailure,
    /// A new learned rule
    LearnedRuleRegistered,
    /// A learned rule replaced an earlier one
    LearnedRuleOverwritten,
    /// A literal was not learned because the sample text lacks it
    LearnedRuleSkipped,
    /// A document went through anonymize
    DocumentAnonymized,
}

/// Snapshot of the counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub documents_anonymized: u64,
    pub spans_seen: u64,
    pub spans_accepted: u64,
    pub spans_rejected_low_confidence: u64,
    pub spans_rejected_overlap: u64,
    pub spans_invalid: u64,
    pub labels_unmapped: u64,
    pub tokens_issued: u64,
    pub tokens_reused: u64,
    pub decode_successes: u64,
    pub decode_failures: u64,
    pub learned_rules_registered: u64,
    pub learned_rules_overwritten: u64,
    pub learned_rules_skipped: u64,
    pub accepted_by_category: BTreeMap<Category, u64>,
}

impl Statistics {
    /// Share of seen candidates that were accepted
    pub fn acceptance_rate(&self) -> f64 {
        if self.spans_seen == 0 {
            0.0
        } else {
            self.spans_accepted as f64 / self.spans_seen as f64
        }
    }
}

/// Accumulates [`StatEvent`]s
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    stats: Statistics,
}

impl StatsCollector {
    /// Creates a collector with every counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one event
    pub fn record(&mut self, event: StatEvent) {
        self.record_n(event, 1);
    }

    /// Records `n` occurrences of an event
    pub fn record_n(&mut self, event: StatEvent, n: u64) {
        let s = &mut self.stats;
        match event {
            StatEvent::SpanSeen => s.spans_seen += n,
            StatEvent::SpanAccepted(category) => {
                s.spans_accepted += n;
                *s.accepted_by_category.entry(category).or_insert(0) += n;
            }
            StatEvent::SpanRejectedLowConfidence => s.spans_rejected_low_confidence += n,
            StatEvent::SpanRejectedOverlap => s.spans_rejected_overlap += n,
            StatEvent::SpanInvalid => s.spans_invalid += n,
            StatEvent::LabelUnmapped => s.labels_unmapped += n,
            StatEvent::TokenIssued => s.tokens_issued += n,
            StatEvent::TokenReused => s.tokens_reused += n,
            StatEvent::DecodeSuccess => s.decode_successes += n,
            StatEvent::DecodeFailure => s.decode_failures += n,
            StatEvent::LearnedRuleRegistered => s.learned_rules_registered += n,
            StatEvent::LearnedRuleOverwritten => s.learned_rules_overwritten += n,
            StatEvent::LearnedRuleSkipped => s.learned_rules_skipped += n,
            StatEvent::DocumentAnonymized => s.documents_anonymized += n,
        }
    }

    /// Copy of the current counters
    pub fn snapshot(&self) -> Statistics {
        self.stats.clone()
    }

    /// Resets every counter
    pub fn reset(&mut self) {
        self.stats = Statistics::default();
    }
}
