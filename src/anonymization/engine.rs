//! Session anonymization engine
//!
//! This module provides the [`AnonymizationEngine`], one anonymization
//! session. It owns every piece of mutable state a session has (the token
//! vault, learned rules and statistics) and runs each document through the
//! pipeline:
//!
//! 1. **Recognition**: candidate spans from the configured recognizer, spans
//!    supplied by the caller, and learned literal rules
//! 2. **Resolution**: overlapping candidates settled into a non-overlapping
//!    cover
//! 3. **Shaping**: titles and unit affixes trimmed off, addresses split
//! 4. **Tokenization**: each accepted span mapped to a deterministic token
//! 5. **Rewriting**: accepted spans replaced by `<<token>>` markers
//!
//! Decoding reverses step 5 using the same session's vault.
//!
//! # Examples
//!
//! ```no_run
//! use tokumei::anonymization::{AnonymizationEngine, config::AnonymizationConfig};
//! use tokumei::anonymization::models::RawSpan;
//!
//! # fn example() -> tokumei::domain::Result<()> {
//! let mut engine = AnonymizationEngine::new(AnonymizationConfig::default())?;
//!
//! let text = "山田太郎さんに連絡してください。yamada@example.com";
//! let spans = [
//!     RawSpan::new(0, 4, "PERSON", 0.9),
//!     RawSpan::new(16, 34, "EMAIL", 0.95),
//! ];
//! let anonymized = engine.anonymize_with_spans(text, &spans)?;
//! assert_eq!(engine.decode(&anonymized)?, text);
//! # Ok(())
//! # }
//! ```

use crate::anonymization::{
    audit::{AuditLogger, DocumentRecord},
    config::AnonymizationConfig,
    detector::{patterns::PatternRegistry, PatternRecognizer, Recognizer},
    index::IntervalIndex,
    learner::{LearnedRule, PatternLearner, RuleChange},
    models::{AcceptedSpan, Category, RawSpan, RejectedSpan, RejectionReason, Span},
    resolver::ConflictResolver,
    rewriter::{DecodePolicy, Decoded, Rewriter},
    shaping::SpanShaper,
    stats::{StatEvent, Statistics, StatsCollector},
    text::CharIndex,
    vault::{MappingView, TokenVault},
};
use crate::domain::{AnonymizationError, Result, SessionId, TokumeiError};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Everything one anonymize call produced
#[derive(Debug, Clone)]
pub struct AnonymizationOutcome {
    /// Text with every accepted span replaced by its marker
    pub text: String,
    /// Accepted spans in position order, with their tokens
    pub accepted: Vec<AcceptedSpan>,
    /// Candidates that lost, with the reason
    pub rejected: Vec<RejectedSpan>,
    /// Recognizer spans dropped before resolution (bad offsets or label)
    pub invalid: usize,
    pub processing_time_ms: u64,
}

/// Result of a [`learn`](AnonymizationEngine::learn) call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LearnOutcome {
    /// Literals learned for the first time
    pub registered: usize,
    /// Literals whose category was replaced
    pub overwritten: usize,
    /// Literals not learned because they are absent from the sample text
    pub skipped: Vec<String>,
}

impl LearnOutcome {
    fn apply(&mut self, change: RuleChange) {
        match change {
            RuleChange::Registered => self.registered += 1,
            RuleChange::Overwritten { .. } => self.overwritten += 1,
        }
    }
}

/// One anonymization session
///
/// The engine is `Send` but not shared: every operation takes `&mut self`,
/// so callers that need concurrent access wrap the whole engine in a
/// `Mutex`. Independent engines share no state.
pub struct AnonymizationEngine {
    config: AnonymizationConfig,
    session_id: SessionId,
    recognizer: Option<Arc<dyn Recognizer>>,
    resolver: ConflictResolver,
    rewriter: Rewriter,
    shaper: SpanShaper,
    vault: TokenVault,
    learner: PatternLearner,
    stats: StatsCollector,
    audit_logger: Option<AuditLogger>,
    documents: u64,
}

impl AnonymizationEngine {
    /// Create a new engine with the recognizer named by the configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if validation fails, the pattern
    /// library cannot be loaded, or the audit log cannot be prepared.
    pub fn new(config: AnonymizationConfig) -> Result<Self> {
        let recognizer: Option<Arc<dyn Recognizer>> = if !config.recognizer.enabled {
            None
        } else if let Some(ref pattern_path) = config.recognizer.pattern_library {
            let registry = PatternRegistry::from_file(pattern_path)
                .map_err(|e| TokumeiError::Configuration(format!("{e:#}")))?;
            Some(Arc::new(PatternRecognizer::with_registry(registry)))
        } else {
            let recognizer = PatternRecognizer::new()
                .map_err(|e| TokumeiError::Configuration(format!("{e:#}")))?;
            Some(Arc::new(recognizer))
        };

        Self::build(config, recognizer)
    }

    /// Create a new engine around a caller-provided recognizer
    ///
    /// The `recognizer` section of the configuration is ignored.
    pub fn with_recognizer(
        config: AnonymizationConfig,
        recognizer: Arc<dyn Recognizer>,
    ) -> Result<Self> {
        Self::build(config, Some(recognizer))
    }

    /// Create a new engine that only uses caller-supplied spans and learned rules
    pub fn without_recognizer(config: AnonymizationConfig) -> Result<Self> {
        Self::build(config, None)
    }

    fn build(
        config: AnonymizationConfig,
        recognizer: Option<Arc<dyn Recognizer>>,
    ) -> Result<Self> {
        config.engine.validate().map_err(|e| {
            TokumeiError::Configuration(format!("Invalid anonymization configuration: {e:#}"))
        })?;
        config.audit.validate().map_err(|e| {
            TokumeiError::Configuration(format!("Invalid anonymization configuration: {e:#}"))
        })?;

        let engine = &config.engine;
        let rewriter = Rewriter::new(engine.token_width)
            .map_err(|e| TokumeiError::Configuration(format!("Invalid token width: {e}")))?;
        let shaper = SpanShaper::new(engine)
            .map_err(|e| TokumeiError::Configuration(format!("Invalid span shaping rule: {e}")))?;

        let audit_logger = if config.audit.enabled {
            let logger = AuditLogger::new(
                config.audit.log_path.clone(),
                config.audit.json_format,
                true,
            )
            .map_err(|e| TokumeiError::Configuration(format!("{e:#}")))?;
            Some(logger)
        } else {
            None
        };

        let session_id = SessionId::new();
        debug!(
            session_id = %session_id,
            recognizer = recognizer.as_ref().map(|r| r.name()).unwrap_or("none"),
            min_confidence = engine.min_confidence,
            token_width = engine.token_width,
            "Anonymization session created"
        );

        Ok(Self {
            resolver: ConflictResolver::new(engine.min_confidence),
            rewriter,
            shaper,
            vault: TokenVault::new(engine.token_width, engine.max_collision_retries),
            learner: PatternLearner::new(engine.learned_rule_score),
            stats: StatsCollector::new(),
            session_id,
            recognizer,
            audit_logger,
            config,
            documents: 0,
        })
    }

    /// Anonymize `text`, returning it with every accepted span replaced
    pub fn anonymize(&mut self, text: &str) -> Result<String> {
        Ok(self.anonymize_detailed(text)?.text)
    }

    /// Anonymize `text`, adding spans found by an external recognizer
    pub fn anonymize_with_spans(&mut self, text: &str, spans: &[RawSpan]) -> Result<String> {
        let label = self.next_document_label();
        Ok(self.anonymize_document(&label, text, spans)?.text)
    }

    /// Anonymize `text`, returning accepted and rejected spans too
    pub fn anonymize_detailed(&mut self, text: &str) -> Result<AnonymizationOutcome> {
        let label = self.next_document_label();
        self.anonymize_document(&label, text, &[])
    }

    /// Anonymize one labeled document
    ///
    /// `external_spans` are candidate spans from outside the engine, with
    /// character offsets into `text`; they compete with the configured
    /// recognizer and learned rules on equal terms.
    ///
    /// # Errors
    ///
    /// Fails if the recognizer fails or the vault runs out of tokens for a
    /// span. Either way nothing from this call stays in the vault.
    /// Malformed candidate spans are not errors: they are logged, counted
    /// and skipped.
    pub fn anonymize_document(
        &mut self,
        document: &str,
        text: &str,
        external_spans: &[RawSpan],
    ) -> Result<AnonymizationOutcome> {
        let start = Instant::now();
        let chars = CharIndex::new(text);

        if self.rewriter.contains_marker(text) {
            warn!(
                document,
                "Input already contains token markers; decode may misinterpret them"
            );
        }

        let mut raw_spans = match self.recognizer {
            Some(ref recognizer) => recognizer.recognize(text).map_err(|e| {
                TokumeiError::Recognizer(format!("{} recognizer failed: {e:#}", recognizer.name()))
            })?,
            None => Vec::new(),
        };
        raw_spans.extend_from_slice(external_spans);

        let mut candidates = IntervalIndex::new(chars.char_len());
        let mut invalid = 0;

        let learned = self.learner.candidates(text, &chars).map_err(|e| {
            TokumeiError::Configuration(format!("Learned rules cannot be compiled: {e}"))
        })?;
        for span in learned {
            candidates.insert(span)?;
        }

        for raw in &raw_spans {
            let Some(label) = Category::from_label(&raw.label) else {
                warn!(
                    document,
                    label = %raw.label,
                    start = raw.start,
                    end = raw.end,
                    "Dropping span with unmapped label"
                );
                self.stats.record(StatEvent::LabelUnmapped);
                invalid += 1;
                continue;
            };
            match Span::from_raw(raw, label, text, &chars).and_then(|s| candidates.insert(s)) {
                Ok(_) => {}
                Err(err) if err.is_recoverable() => {
                    warn!(document, error = %err, "Dropping invalid span");
                    self.stats.record(StatEvent::SpanInvalid);
                    invalid += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }

        self.stats
            .record_n(StatEvent::SpanSeen, candidates.len() as u64);

        let resolution = self.resolver.resolve(candidates);
        let winners = self.shaper.shape(resolution.accepted, text, &chars);

        let originals = winners
            .iter()
            .map(|span| {
                span.slice(text, &chars)
                    .map(|original| (original, span.label))
                    .ok_or_else(|| {
                        AnonymizationError::invalid_span(
                            span.start,
                            span.end,
                            chars.char_len(),
                            "accepted span does not fit the text",
                        )
                    })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let assignments = self.vault.assign_all(originals)?;

        let accepted: Vec<AcceptedSpan> = winners
            .into_iter()
            .zip(assignments.iter())
            .map(|(span, assignment)| AcceptedSpan {
                span,
                token: assignment.token.clone(),
            })
            .collect();

        let anonymized = match self.rewriter.anonymize(text, &accepted) {
            Ok(anonymized) => anonymized,
            Err(err) => {
                error!(document, error = %err, "Rewriting failed");
                return Err(err.into());
            }
        };

        for assignment in &assignments {
            self.stats.record(if assignment.reused {
                StatEvent::TokenReused
            } else {
                StatEvent::TokenIssued
            });
        }
        for accepted_span in &accepted {
            self.stats
                .record(StatEvent::SpanAccepted(accepted_span.span.label));
        }
        for rejected in &resolution.rejected {
            self.stats.record(match rejected.reason {
                RejectionReason::LowConfidence => StatEvent::SpanRejectedLowConfidence,
                RejectionReason::Overlap { .. } => StatEvent::SpanRejectedOverlap,
            });
        }
        self.stats.record(StatEvent::DocumentAnonymized);

        let processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            session_id = %self.session_id,
            document,
            accepted = accepted.len(),
            rejected = resolution.rejected.len(),
            invalid,
            processing_time_ms,
            "Document anonymized"
        );

        if let Some(ref logger) = self.audit_logger {
            let record = DocumentRecord {
                session_id: &self.session_id,
                document,
                text,
                accepted: &accepted,
                rejected_count: resolution.rejected.len(),
                processing_time_ms,
            };
            if let Err(e) = logger.log_document(&record) {
                error!(document, error = ?e, "Failed to write audit entry");
            }
        }

        Ok(AnonymizationOutcome {
            text: anonymized,
            accepted,
            rejected: resolution.rejected,
            invalid,
            processing_time_ms,
        })
    }

    /// Restore the originals in text anonymized by this session
    ///
    /// Uses the configured decode policy.
    pub fn decode(&mut self, anonymized: &str) -> Result<String> {
        let policy = self.config.engine.decode_policy;
        Ok(self.decode_with_policy(anonymized, policy)?.text)
    }

    /// Restore originals with an explicit policy
    ///
    /// # Errors
    ///
    /// Under [`DecodePolicy::Strict`], an unknown token aborts the whole
    /// call with `UnknownToken` and one decode failure is counted.
    pub fn decode_with_policy(
        &mut self,
        anonymized: &str,
        policy: DecodePolicy,
    ) -> Result<Decoded> {
        match self.rewriter.decode(anonymized, &self.vault, policy) {
            Ok(decoded) => {
                self.stats
                    .record_n(StatEvent::DecodeSuccess, decoded.resolved as u64);
                self.stats
                    .record_n(StatEvent::DecodeFailure, decoded.unresolved.len() as u64);
                if !decoded.unresolved.is_empty() {
                    warn!(
                        unresolved = decoded.unresolved.len(),
                        "Markers left in place during best-effort decode"
                    );
                }
                Ok(decoded)
            }
            Err(err) => {
                self.stats.record(StatEvent::DecodeFailure);
                warn!(error = %err, "Decode aborted");
                Err(err.into())
            }
        }
    }

    /// Original text behind a single token
    pub fn resolve_token(&self, token: &str) -> Result<String> {
        Ok(self.vault.resolve_token(token)?.to_string())
    }

    /// Teach the session literal-to-category rules
    ///
    /// Each rule applies to every later document. With a `sample`, literals
    /// that do not occur in it are skipped, and recognizer spans found in
    /// the sample at or above the minimum confidence are learned as well,
    /// unless their literal already has a rule. Learning never changes
    /// tokens already issued.
    pub fn learn<I, S>(&mut self, rules: I, sample: Option<&str>) -> Result<LearnOutcome>
    where
        I: IntoIterator<Item = (S, Category)>,
        S: AsRef<str>,
    {
        let mut outcome = LearnOutcome::default();

        for (literal, label) in rules {
            let literal = literal.as_ref();
            if sample.is_some_and(|s| !s.contains(literal)) {
                debug!(label = %label, chars = literal.chars().count(), "Literal absent from sample");
                self.stats.record(StatEvent::LearnedRuleSkipped);
                outcome.skipped.push(literal.to_string());
                continue;
            }
            let change = self.learner.register(literal, label)?;
            self.record_rule_change(change);
            outcome.apply(change);
        }

        if let (Some(sample), Some(recognizer)) = (sample, self.recognizer.as_ref()) {
            let chars = CharIndex::new(sample);
            let found = recognizer.recognize(sample).map_err(|e| {
                TokumeiError::Recognizer(format!("{} recognizer failed: {e:#}", recognizer.name()))
            })?;

            let mut learned = Vec::new();
            for raw in found {
                let Some(label) = Category::from_label(&raw.label) else {
                    continue;
                };
                let Ok(span) = Span::from_raw(&raw, label, sample, &chars) else {
                    continue;
                };
                if span.score < self.resolver.min_confidence() {
                    continue;
                }
                if let Some(literal) = span.slice(sample, &chars) {
                    if !literal.trim().is_empty() {
                        learned.push((literal.to_string(), label));
                    }
                }
            }

            // Recognizer guesses only fill gaps; explicit and earlier rules win
            for (literal, label) in learned {
                if self.learner.rule(&literal).is_some() {
                    debug!(label = %label, chars = literal.chars().count(), "Literal already learned");
                    continue;
                }
                let change = self.learner.register(&literal, label)?;
                self.record_rule_change(change);
                outcome.apply(change);
            }
        }

        info!(
            registered = outcome.registered,
            overwritten = outcome.overwritten,
            skipped = outcome.skipped.len(),
            "Learned rules updated"
        );
        Ok(outcome)
    }

    fn record_rule_change(&mut self, change: RuleChange) {
        match change {
            RuleChange::Registered => self.stats.record(StatEvent::LearnedRuleRegistered),
            RuleChange::Overwritten { previous } => {
                debug!(previous = %previous, "Learned rule overwritten");
                self.stats.record(StatEvent::LearnedRuleOverwritten);
            }
        }
    }

    /// Snapshot of the session counters
    pub fn statistics(&self) -> Statistics {
        self.stats.snapshot()
    }

    /// Token mappings of the session, without originals
    pub fn mappings(&self) -> Vec<MappingView> {
        self.vault.mappings()
    }

    /// Learned rules of the session
    pub fn learned_rules(&self) -> impl Iterator<Item = &LearnedRule> {
        self.learner.rules()
    }

    /// Forget every mapping, rule and counter and start a new session
    ///
    /// Text anonymized before the call can no longer be decoded.
    pub fn clear(&mut self) {
        self.vault.clear();
        self.learner.clear();
        self.stats.reset();
        self.documents = 0;
        let previous = std::mem::take(&mut self.session_id);
        info!(previous = %previous, session_id = %self.session_id, "Session cleared");
    }

    /// Identifier of the current session
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// The configuration the engine was built with
    pub fn config(&self) -> &AnonymizationConfig {
        &self.config
    }

    fn next_document_label(&mut self) -> String {
        self.documents += 1;
        format!("doc-{}", self.documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::detector::SpanListRecognizer;

    const SCENARIO: &str = "山田太郎さんに連絡してください。yamada@example.com";

    fn engine() -> AnonymizationEngine {
        AnonymizationEngine::without_recognizer(AnonymizationConfig::default()).unwrap()
    }

    fn scenario_spans() -> Vec<RawSpan> {
        vec![
            RawSpan::new(0, 4, "PERSON", 0.9),
            RawSpan::new(0, 2, "PERSON", 0.2),
            RawSpan::new(16, 34, "EMAIL", 0.95),
        ]
    }

    #[test]
    fn test_engine_creation() {
        let engine = AnonymizationEngine::new(AnonymizationConfig::default());
        assert!(engine.is_ok());
    }

    #[test]
    fn test_scenario_accepts_person_and_email() {
        let mut engine = engine();
        let outcome = engine
            .anonymize_document("scenario", SCENARIO, &scenario_spans())
            .unwrap();

        assert_eq!(outcome.accepted.len(), 2);
        assert_eq!(outcome.accepted[0].span.label, Category::Person);
        assert_eq!(outcome.accepted[1].span.label, Category::Email);
        assert_ne!(outcome.accepted[0].token, outcome.accepted[1].token);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].reason, RejectionReason::LowConfidence);

        let expected = format!(
            "{}さんに連絡してください。{}",
            outcome.accepted[0].token.marker(),
            outcome.accepted[1].token.marker()
        );
        assert_eq!(outcome.text, expected);
        assert_eq!(engine.decode(&outcome.text).unwrap(), SCENARIO);
    }

    #[test]
    fn test_same_original_reuses_token() {
        let mut engine = engine();
        let first = engine
            .anonymize_with_spans("山田です", &[RawSpan::new(0, 2, "PERSON", 0.9)])
            .unwrap();
        let second = engine
            .anonymize_with_spans("はい、山田", &[RawSpan::new(3, 5, "PERSON", 0.9)])
            .unwrap();

        assert_eq!(first[..first.len() - "です".len()], second["はい、".len()..]);
        let stats = engine.statistics();
        assert_eq!(stats.tokens_issued, 1);
        assert_eq!(stats.tokens_reused, 1);
    }

    #[test]
    fn test_invalid_and_unmapped_spans_are_skipped() {
        let mut engine = engine();
        let outcome = engine
            .anonymize_document(
                "doc",
                "東京へ行く",
                &[
                    RawSpan::new(0, 2, "LOC", 0.8),
                    RawSpan::new(3, 10, "PERSON", 0.9),
                    RawSpan::new(3, 5, "PERCENT", 0.9),
                    RawSpan::new(0, 2, "ORG", 0.9).with_text("大阪"),
                ],
            )
            .unwrap();

        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].span.label, Category::Location);
        assert_eq!(outcome.invalid, 3);

        let stats = engine.statistics();
        assert_eq!(stats.spans_invalid, 2);
        assert_eq!(stats.labels_unmapped, 1);
        assert_eq!(stats.spans_seen, 1);
    }

    #[test]
    fn test_learned_rule_becomes_candidate() {
        let mut engine = engine();
        let outcome = engine
            .learn([("Project-X", Category::Project)], None)
            .unwrap();
        assert_eq!(outcome.registered, 1);

        let result = engine
            .anonymize_detailed("Project-Xの進捗を報告します")
            .unwrap();
        assert_eq!(result.accepted.len(), 1);
        assert_eq!(result.accepted[0].span.label, Category::Project);
        assert!(result.text.starts_with(&result.accepted[0].token.marker()));
    }

    #[test]
    fn test_learn_with_sample_skips_absent_literals() {
        let mut engine = engine();
        let outcome = engine
            .learn(
                [("Project-X", Category::Project), ("鈴木", Category::Person)],
                Some("Project-Xの件"),
            )
            .unwrap();

        assert_eq!(outcome.registered, 1);
        assert_eq!(outcome.skipped, vec!["鈴木".to_string()]);
        assert_eq!(engine.statistics().learned_rules_skipped, 1);
    }

    #[test]
    fn test_learn_with_sample_picks_up_recognizer_spans() {
        let recognizer = SpanListRecognizer::new(vec![
            RawSpan::new(0, 4, "ORG", 0.8),
            RawSpan::new(5, 7, "PERSON", 0.1),
        ]);
        let mut engine = AnonymizationEngine::with_recognizer(
            AnonymizationConfig::default(),
            Arc::new(recognizer),
        )
        .unwrap();

        let outcome = engine
            .learn(Vec::<(String, Category)>::new(), Some("青空商事と田中"))
            .unwrap();
        assert_eq!(outcome.registered, 1);
        assert_eq!(
            engine.learned_rules().next().map(|r| r.literal.as_str()),
            Some("青空商事")
        );
    }

    #[test]
    fn test_learn_sample_keeps_explicit_label() {
        let recognizer = SpanListRecognizer::new(vec![RawSpan::new(0, 6, "TECH", 0.6)]);
        let mut engine = AnonymizationEngine::with_recognizer(
            AnonymizationConfig::default(),
            Arc::new(recognizer),
        )
        .unwrap();
        let sample = "Pythonで新規開発を行う";

        let outcome = engine
            .learn([("Python", Category::Project)], Some(sample))
            .unwrap();
        assert_eq!(outcome.registered, 1);
        assert_eq!(outcome.overwritten, 0);

        let again = engine
            .learn(Vec::<(String, Category)>::new(), Some(sample))
            .unwrap();
        assert_eq!(again, LearnOutcome::default());

        assert_eq!(engine.learner.rule("Python").map(|r| r.label), Some(Category::Project));
        assert_eq!(engine.statistics().learned_rules_overwritten, 0);

        let result = engine.anonymize_detailed(sample).unwrap();
        assert_eq!(result.accepted[0].span.label, Category::Project);
    }

    #[test]
    fn test_spaced_title_reuses_name_token() {
        let mut engine = engine();
        let outcome = engine
            .anonymize_document(
                "spaced",
                "山田 部長と山田",
                &[
                    RawSpan::new(0, 5, "PERSON", 0.9),
                    RawSpan::new(6, 8, "PERSON", 0.9),
                ],
            )
            .unwrap();

        assert_eq!(outcome.accepted[0].span.range(), 0..2);
        assert_eq!(outcome.accepted[0].token, outcome.accepted[1].token);
        assert_eq!(outcome.accepted[0].token.extension(), None);
        let marker = outcome.accepted[0].token.marker();
        assert_eq!(outcome.text, format!("{marker} 部長と{marker}"));
        assert_eq!(engine.statistics().tokens_issued, 1);
        assert_eq!(engine.decode(&outcome.text).unwrap(), "山田 部長と山田");
    }

    #[test]
    fn test_engine_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<AnonymizationEngine>();
    }

    #[test]
    fn test_independent_sessions_run_in_parallel() {
        let handles: Vec<_> = ["鈴木です", "佐藤です"]
            .into_iter()
            .map(|text| {
                let mut engine = engine();
                std::thread::spawn(move || {
                    let anonymized = engine
                        .anonymize_with_spans(text, &[RawSpan::new(0, 2, "PERSON", 0.9)])
                        .unwrap();
                    (engine.decode(&anonymized).unwrap(), engine.statistics().tokens_issued)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            results,
            vec![("鈴木です".to_string(), 1), ("佐藤です".to_string(), 1)]
        );
    }

    #[test]
    fn test_unknown_token_is_reported() {
        let engine = engine();
        let err = engine.resolve_token("0000ffff").unwrap_err();
        assert_eq!(
            err.as_anonymization(),
            Some(&AnonymizationError::UnknownToken("0000ffff".to_string()))
        );
    }

    #[test]
    fn test_strict_decode_counts_one_failure() {
        let mut engine = engine();
        let err = engine.decode("前 <<0000ffff>> 後").unwrap_err();
        assert!(matches!(
            err.as_anonymization(),
            Some(AnonymizationError::UnknownToken(_))
        ));
        let stats = engine.statistics();
        assert_eq!(stats.decode_failures, 1);
        assert_eq!(stats.decode_successes, 0);
    }

    #[test]
    fn test_best_effort_decode_keeps_unknown_markers() {
        let mut engine = engine();
        let anonymized = engine
            .anonymize_with_spans("山田です", &[RawSpan::new(0, 2, "PERSON", 0.9)])
            .unwrap();
        let text = format!("{anonymized} <<0000ffff>>");

        let decoded = engine
            .decode_with_policy(&text, DecodePolicy::BestEffort)
            .unwrap();
        assert_eq!(decoded.text, "山田です <<0000ffff>>");
        assert_eq!(decoded.unresolved, vec!["0000ffff".to_string()]);
    }

    #[test]
    fn test_title_suffix_stays_visible() {
        let mut engine = engine();
        let anonymized = engine
            .anonymize_with_spans("鈴木部長に確認", &[RawSpan::new(0, 4, "PERSON", 0.9)])
            .unwrap();
        assert!(anonymized.ends_with(">>部長に確認"));
        assert_eq!(engine.decode(&anonymized).unwrap(), "鈴木部長に確認");
    }

    #[test]
    fn test_clear_starts_new_session() {
        let mut engine = engine();
        let anonymized = engine
            .anonymize_with_spans("山田です", &[RawSpan::new(0, 2, "PERSON", 0.9)])
            .unwrap();
        let before = *engine.session_id();

        engine.clear();

        assert_ne!(engine.session_id(), &before);
        assert!(engine.mappings().is_empty());
        assert_eq!(engine.statistics(), Statistics::default());
        assert!(engine.decode(&anonymized).is_err());
    }

    #[test]
    fn test_recognizer_failure_surfaces() {
        struct Broken;

        impl Recognizer for Broken {
            fn recognize(&self, _text: &str) -> anyhow::Result<Vec<RawSpan>> {
                anyhow::bail!("model unavailable")
            }

            fn name(&self) -> &str {
                "broken"
            }
        }

        let mut engine =
            AnonymizationEngine::with_recognizer(AnonymizationConfig::default(), Arc::new(Broken))
                .unwrap();
        let err = engine.anonymize("テスト").unwrap_err();
        assert!(matches!(err, TokumeiError::Recognizer(_)));
        assert!(engine.mappings().is_empty());
    }
}
