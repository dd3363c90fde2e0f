//! Learned literal rules
//!
//! Callers can teach the session that a literal string always belongs to a
//! category. Each registered literal becomes a high-priority candidate on
//! every exact occurrence in later documents. Learning never touches tokens
//! that were already issued.
//!
//! All literals are matched in one pass with an Aho-Corasick automaton,
//! rebuilt lazily after the rule set changes.

use crate::anonymization::models::{Category, Span, SpanSource};
use crate::anonymization::text::CharIndex;
use crate::domain::{AnonymizationError, CoreResult};
use aho_corasick::{AhoCorasick, BuildError};
use serde::Serialize;
use std::collections::BTreeMap;

/// Default score given to learned candidates
pub const DEFAULT_LEARNED_RULE_SCORE: f64 = 1.0;

/// Association of a literal with a category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearnedRule {
    pub literal: String,
    pub label: Category,
    pub score: f64,
}

/// What registering a rule did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleChange {
    /// The literal was new
    Registered,
    /// The literal was known; its label and score were replaced
    Overwritten { previous: Category },
}

/// Automaton over every literal; pattern ids index `labels`
#[derive(Debug, Clone)]
struct LiteralMatcher {
    automaton: AhoCorasick,
    labels: Vec<Category>,
}

impl LiteralMatcher {
    fn build(rules: &BTreeMap<String, LearnedRule>) -> Result<Self, BuildError> {
        Ok(Self {
            automaton: AhoCorasick::new(rules.keys())?,
            labels: rules.values().map(|rule| rule.label).collect(),
        })
    }
}

/// Holds learned rules and produces their candidates
#[derive(Debug, Clone)]
pub struct PatternLearner {
    rules: BTreeMap<String, LearnedRule>,
    score: f64,
    matcher: Option<LiteralMatcher>,
}

impl PatternLearner {
    /// Creates an empty learner whose rules carry `score`
    pub fn new(score: f64) -> Self {
        Self {
            rules: BTreeMap::new(),
            score: score.clamp(0.0, 1.0),
            matcher: None,
        }
    }

    /// Registers `literal` as `label`; the last registration wins
    ///
    /// # Errors
    ///
    /// Returns `InvalidSpan` for an empty or whitespace-only literal, which
    /// would otherwise match everywhere.
    pub fn register(&mut self, literal: &str, label: Category) -> CoreResult<RuleChange> {
        if literal.trim().is_empty() {
            return Err(AnonymizationError::invalid_span(
                0,
                literal.chars().count(),
                literal.chars().count(),
                "learned literal is empty",
            ));
        }

        let rule = LearnedRule {
            literal: literal.to_string(),
            label,
            score: self.score,
        };
        self.matcher = None;
        Ok(match self.rules.insert(literal.to_string(), rule) {
            Some(previous) => RuleChange::Overwritten {
                previous: previous.label,
            },
            None => RuleChange::Registered,
        })
    }

    /// Candidate spans for every exact occurrence of every literal in `text`
    ///
    /// Occurrences may overlap, of one literal (`ああ` twice in `あああ`) or
    /// of different ones; the resolver settles them.
    ///
    /// # Errors
    ///
    /// Fails only if the literal set is too large to compile.
    pub fn candidates(&mut self, text: &str, chars: &CharIndex) -> Result<Vec<Span>, BuildError> {
        if self.rules.is_empty() {
            return Ok(Vec::new());
        }
        if self.matcher.is_none() {
            self.matcher = Some(LiteralMatcher::build(&self.rules)?);
        }
        let Some(matcher) = self.matcher.as_ref() else {
            return Ok(Vec::new());
        };

        let spans = matcher
            .automaton
            .find_overlapping_iter(text)
            .filter_map(|found| {
                let start = chars.char_offset(found.start())?;
                let end = chars.char_offset(found.end())?;
                let label = *matcher.labels.get(found.pattern().as_usize())?;
                Span::new(
                    start,
                    end,
                    label,
                    self.score,
                    SpanSource::Learned,
                    chars.char_len(),
                )
                .ok()
            })
            .collect();
        Ok(spans)
    }

    /// Rule registered for `literal`
    pub fn rule(&self, literal: &str) -> Option<&LearnedRule> {
        self.rules.get(literal)
    }

    /// All rules, ordered by literal
    pub fn rules(&self) -> impl Iterator<Item = &LearnedRule> {
        self.rules.values()
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule is registered
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Forgets every rule
    pub fn clear(&mut self) {
        self.rules.clear();
        self.matcher = None;
    }
}

impl Default for PatternLearner {
    fn default() -> Self {
        Self::new(DEFAULT_LEARNED_RULE_SCORE)
    }
}
