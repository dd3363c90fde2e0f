// Tokumei - Reversible anonymization of Japanese business text
// Copyright (c) 2025 Tokumei Contributors
// Licensed under the MIT License

//! # Tokumei - Reversible anonymization of Japanese business text
//!
//! Tokumei replaces the sensitive spans of a Japanese document (people,
//! companies, addresses, email addresses, phone numbers, dates, amounts,
//! project names, ...) with opaque `<<token>>` markers, and turns
//! the anonymized text back into the original within the same session.
//!
//! ## Overview
//!
//! This library provides:
//! - **Recognition** of candidate spans through pluggable recognizers
//! - **Conflict resolution** of overlapping candidates into a disjoint cover
//! - **Deterministic tokens** that stay stable for a value across documents
//! - **Rewriting and decoding** of marker text
//! - **Learned rules** that teach the session new literals
//!
//! ## Architecture
//!
//! - [`anonymization`] - Span model, resolver, vault, rewriter, engine
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration management
//! - [`domain`] - Error types, identifiers and secret wrappers
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tokumei::anonymization::{AnonymizationConfig, AnonymizationEngine};
//!
//! # fn example() -> tokumei::domain::Result<()> {
//! let mut engine = AnonymizationEngine::new(AnonymizationConfig::default())?;
//!
//! let anonymized = engine.anonymize("山田太郎様の連絡先は yamada@example.com です")?;
//! assert!(!anonymized.contains("yamada@example.com"));
//!
//! let restored = engine.decode(&anonymized)?;
//! assert_eq!(restored, "山田太郎様の連絡先は yamada@example.com です");
//! # Ok(())
//! # }
//! ```
//!
//! ## External Spans
//!
//! Spans produced elsewhere (an NER model, a reviewer) are passed with
//! character offsets and a label:
//!
//! ```rust,no_run
//! use tokumei::anonymization::{AnonymizationConfig, AnonymizationEngine, RawSpan};
//!
//! # fn example() -> tokumei::domain::Result<()> {
//! let mut engine = AnonymizationEngine::without_recognizer(AnonymizationConfig::default())?;
//! let spans = vec![RawSpan::new(0, 4, "PERSON", 0.9)];
//! let anonymized = engine.anonymize_with_spans("山田太郎です", &spans)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`domain::Result`], whose error type
//! [`domain::TokumeiError`] wraps the core [`domain::AnonymizationError`].
//!
//! ## Logging
//!
//! Tokumei logs through the `tracing` crate. Log events carry categories,
//! tokens and counts; original span text is never logged.

pub mod anonymization;
pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;
