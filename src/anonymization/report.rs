//! Session reporting for anonymization
//!
//! This module provides formatted reports for a session, showing span
//! statistics, sample replacements, and warnings.

use crate::anonymization::engine::{AnonymizationEngine, AnonymizationOutcome};
use crate::anonymization::models::Category;
use crate::anonymization::stats::Statistics;
use crate::anonymization::text::CharIndex;
use serde::{Deserialize, Serialize};

/// Longest original prefix shown in a sample
const SAMPLE_ORIGINAL_CHARS: usize = 8;

/// Sample cap for the whole report
const MAX_SAMPLES: usize = 20;

/// Session report with span statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session the report covers
    pub session_id: String,

    /// Session counters at the time the report was built
    pub statistics: Statistics,

    /// Number of distinct tokens issued
    pub distinct_tokens: usize,

    /// Sample replacements (before/after examples)
    pub samples: Vec<ReplacementSample>,

    /// Warnings worth a reviewer's attention
    pub warnings: Vec<String>,

    /// Processing statistics
    pub stats: ProcessingStats,

    #[serde(skip)]
    notes: Vec<String>,
}

/// Sample replacement showing before/after
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplacementSample {
    /// Document the span came from
    pub document: String,

    /// Original value (truncated for privacy)
    pub original: String,

    /// Marker written in its place
    pub marker: String,

    pub category: Category,

    /// Confidence score (0.0-1.0)
    pub confidence: f64,
}

/// Processing statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Average processing time per document (ms)
    pub avg_processing_time_ms: u64,

    /// Total processing time (ms)
    pub total_processing_time_ms: u64,

    /// Documents with at least one accepted span
    pub documents_with_spans: usize,

    /// Documents left unchanged
    pub documents_without_spans: usize,
}

impl SessionReport {
    /// Create a report for the current state of `engine`
    ///
    /// Per-document samples and timings are added with
    /// [`add_document`](Self::add_document).
    pub fn from_engine(engine: &AnonymizationEngine) -> Self {
        let mut report = Self {
            session_id: engine.session_id().to_string(),
            statistics: Statistics::default(),
            distinct_tokens: 0,
            samples: Vec::new(),
            warnings: Vec::new(),
            stats: ProcessingStats::default(),
            notes: Vec::new(),
        };
        report.refresh(engine);
        report
    }

    /// Re-read counters from `engine` and recompute the derived warnings
    pub fn refresh(&mut self, engine: &AnonymizationEngine) {
        self.statistics = engine.statistics();
        self.distinct_tokens = engine.mappings().len();
        self.warnings.clear();

        let s = &self.statistics;
        if s.spans_invalid > 0 {
            self.warnings.push(format!(
                "[spans] {} span(s) had invalid offsets or scores and were skipped",
                s.spans_invalid
            ));
        }
        if s.labels_unmapped > 0 {
            self.warnings.push(format!(
                "[labels] {} span(s) carried a label with no category and were skipped",
                s.labels_unmapped
            ));
        }
        if s.decode_failures > 0 {
            self.warnings.push(format!(
                "[decode] {} marker(s) could not be decoded",
                s.decode_failures
            ));
        }
        if s.learned_rules_skipped > 0 {
            self.warnings.push(format!(
                "[learn] {} literal(s) were absent from the sample and not learned",
                s.learned_rules_skipped
            ));
        }
        self.warnings.extend(self.notes.iter().cloned());
    }

    /// Add results from one anonymized document
    pub fn add_document(&mut self, document: &str, original: &str, outcome: &AnonymizationOutcome) {
        self.stats.total_processing_time_ms += outcome.processing_time_ms;

        if outcome.accepted.is_empty() {
            self.stats.documents_without_spans += 1;
        } else {
            self.stats.documents_with_spans += 1;

            let chars = CharIndex::new(original);
            // At most 3 samples per document
            for accepted in outcome.accepted.iter().take(3) {
                if self.samples.len() >= MAX_SAMPLES {
                    break;
                }
                let Some(covered) = accepted.span.slice(original, &chars) else {
                    continue;
                };
                self.samples.push(ReplacementSample {
                    document: document.to_string(),
                    original: truncate_original(covered),
                    marker: accepted.token.marker(),
                    category: accepted.span.label,
                    confidence: accepted.span.score,
                });
            }
        }

        let documents = self.stats.documents_with_spans + self.stats.documents_without_spans;
        self.stats.avg_processing_time_ms =
            self.stats.total_processing_time_ms / documents as u64;
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: String) {
        self.notes.push(warning.clone());
        self.warnings.push(warning);
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();
        let s = &self.statistics;

        output.push('\n');
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str("                 TOKUMEI ANONYMIZATION REPORT                  \n");
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output.push_str("📊 SUMMARY\n");
        output.push_str("───────────────────────────────────────────────────────────────\n");
        output.push_str(&format!("  Session:                     {}\n", self.session_id));
        output.push_str(&format!(
            "  Documents Anonymized:        {}\n",
            s.documents_anonymized
        ));
        output.push_str(&format!("  Candidate Spans Seen:        {}\n", s.spans_seen));
        output.push_str(&format!(
            "  Spans Accepted:              {} ({:.1}%)\n",
            s.spans_accepted,
            s.acceptance_rate() * 100.0
        ));
        output.push_str(&format!(
            "  Rejected (low confidence):   {}\n",
            s.spans_rejected_low_confidence
        ));
        output.push_str(&format!(
            "  Rejected (overlap):          {}\n",
            s.spans_rejected_overlap
        ));
        output.push_str(&format!(
            "  Tokens Issued / Reused:      {} / {}\n",
            s.tokens_issued, s.tokens_reused
        ));
        output.push_str(&format!(
            "  Markers Decoded / Failed:    {} / {}\n",
            s.decode_successes, s.decode_failures
        ));
        output.push_str(&format!(
            "  Learned Rules:               {} new, {} replaced\n",
            s.learned_rules_registered, s.learned_rules_overwritten
        ));
        output.push_str(&format!(
            "  Avg Processing Time:         {} ms\n",
            self.stats.avg_processing_time_ms
        ));
        output.push('\n');

        if !s.accepted_by_category.is_empty() {
            output.push_str("🔍 ACCEPTED SPANS BY CATEGORY\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");

            let mut categories: Vec<_> = s.accepted_by_category.iter().collect();
            categories.sort_by(|a, b| b.1.cmp(a.1));

            for (category, count) in categories {
                output.push_str(&format!("  {:30} {:>5}\n", category.label(), count));
            }
            output.push('\n');
        }

        if !self.samples.is_empty() {
            output.push_str("📝 SAMPLE REPLACEMENTS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");

            for (i, sample) in self.samples.iter().take(10).enumerate() {
                output.push_str(&format!("\n  Sample #{}\n", i + 1));
                output.push_str(&format!("    Document:    {}\n", sample.document));
                output.push_str(&format!("    Category:    {}\n", sample.category));
                output.push_str(&format!(
                    "    Confidence:  {:.2}%\n",
                    sample.confidence * 100.0
                ));
                output.push_str(&format!("    Original:    \"{}\"\n", sample.original));
                output.push_str(&format!("    Marker:      \"{}\"\n", sample.marker));
            }
            output.push('\n');
        }

        if !self.warnings.is_empty() {
            output.push_str("⚠️  WARNINGS\n");
            output.push_str("───────────────────────────────────────────────────────────────\n");
            for warning in &self.warnings {
                output.push_str(&format!("  • {warning}\n"));
            }
            output.push('\n');
        }

        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push('\n');

        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write report to file
    pub fn write_to_file(&self, path: &std::path::Path) -> std::io::Result<()> {
        let json = self.format_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Keeps a short prefix of an original, never the whole value
fn truncate_original(original: &str) -> String {
    let total = original.chars().count();
    let shown = if total > SAMPLE_ORIGINAL_CHARS {
        SAMPLE_ORIGINAL_CHARS
    } else {
        total.div_ceil(2)
    };
    let mut truncated: String = original.chars().take(shown).collect();
    if shown < total {
        truncated.push_str("...");
    }
    truncated
}
