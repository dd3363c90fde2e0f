//! Anonymization module for Tokumei
//!
//! This module turns Japanese business text into text where every sensitive
//! span is replaced by an opaque, session-scoped `<<token>>` marker, and
//! turns such text back into the original.
//!
//! # Architecture
//!
//! The anonymization pipeline consists of:
//! - **Recognition**: pluggable [`detector::Recognizer`]s (built-in regex
//!   library, externally supplied spans) plus learned literal rules
//! - **Resolution**: an [`index::IntervalIndex`] drained by the
//!   [`resolver::ConflictResolver`] into a non-overlapping cover
//! - **Tokenization**: the [`vault::TokenVault`] with deterministic,
//!   collision-extended tokens
//! - **Shaping**: [`shaping::SpanShaper`] keeping titles, currency and
//!   counter affixes visible and splitting addresses into units
//! - **Rewriting**: [`rewriter::Rewriter`] writing and decoding markers
//! - **Audit**: structured logging with hashed originals
//!
//! # Usage
//!
//! ```rust,no_run
//! use tokumei::anonymization::{AnonymizationEngine, config::AnonymizationConfig};
//!
//! # fn example() -> tokumei::domain::Result<()> {
//! let mut engine = AnonymizationEngine::new(AnonymizationConfig::default())?;
//! let anonymized = engine.anonymize("鈴木部長に yamada@example.com から連絡")?;
//! let restored = engine.decode(&anonymized)?;
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod config;
pub mod detector;
pub mod engine;
pub mod index;
pub mod learner;
pub mod models;
pub mod report;
pub mod resolver;
pub mod rewriter;
pub mod shaping;
pub mod stats;
pub mod text;
pub mod titles;
pub mod vault;

// Re-export main types
pub use config::AnonymizationConfig;
pub use engine::{AnonymizationEngine, AnonymizationOutcome, LearnOutcome};
pub use models::{AcceptedSpan, Category, RawSpan, RejectedSpan, RejectionReason, Span, SpanSource};
pub use report::SessionReport;
pub use rewriter::DecodePolicy;
pub use stats::Statistics;
