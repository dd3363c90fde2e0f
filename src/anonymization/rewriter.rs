//! Text rewriting: spans to markers and back
//!
//! Anonymization is a single left-to-right pass copying the text between
//! accepted spans verbatim and writing `<<token>>` in place of each span.
//! Decoding scans for well-formed markers and substitutes the originals held
//! by the vault.

use crate::anonymization::models::AcceptedSpan;
use crate::anonymization::text::CharIndex;
use crate::anonymization::vault::TokenVault;
use crate::domain::{AnonymizationError, CoreResult};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What decode does with a marker whose token is not in the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodePolicy {
    /// Abort with `UnknownToken`; no partial output
    #[default]
    Strict,
    /// Leave the marker in place and keep going
    BestEffort,
}

impl std::str::FromStr for DecodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "strict" => Ok(Self::Strict),
            "best_effort" => Ok(Self::BestEffort),
            _ => Err(format!(
                "Invalid decode policy '{s}'. Must be one of: strict, best_effort"
            )),
        }
    }
}

/// Result of a decode pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    /// Markers replaced by their original
    pub resolved: usize,
    /// Markers left in place (best-effort only)
    pub unresolved: Vec<String>,
}

/// Writes and reads token markers
#[derive(Debug, Clone)]
pub struct Rewriter {
    marker: Regex,
}

impl Rewriter {
    /// Creates a rewriter recognizing tokens of `token_width` hex characters
    pub fn new(token_width: usize) -> Result<Self, regex::Error> {
        let pattern = format!(r"<<([0-9a-f]{{{token_width}}}(?:-[0-9]+)?)>>");
        Ok(Self {
            marker: Regex::new(&pattern)?,
        })
    }

    /// Replaces every accepted span with its marker
    ///
    /// Spans must be in position order and pairwise disjoint.
    ///
    /// # Errors
    ///
    /// Returns [`AnonymizationError::OverlapInvariantViolation`] if they are
    /// not, and `InvalidSpan` if a span reaches past the end of `text`.
    pub fn anonymize(&self, text: &str, spans: &[AcceptedSpan]) -> CoreResult<String> {
        let chars = CharIndex::new(text);
        let mut output = String::with_capacity(text.len());
        let mut cursor_char = 0;
        let mut cursor_byte = 0;

        for accepted in spans {
            let span = &accepted.span;
            if span.start < cursor_char {
                return Err(AnonymizationError::OverlapInvariantViolation {
                    start: span.start,
                    end: span.end,
                    previous_end: cursor_char,
                });
            }
            let range = chars.byte_range(span.start, span.end).ok_or_else(|| {
                AnonymizationError::invalid_span(
                    span.start,
                    span.end,
                    chars.char_len(),
                    "span ends past the end of the text",
                )
            })?;

            output.push_str(&text[cursor_byte..range.start]);
            output.push_str(&accepted.token.marker());
            cursor_char = span.end;
            cursor_byte = range.end;
        }

        output.push_str(&text[cursor_byte..]);
        Ok(output)
    }

    /// Replaces markers with the originals held by `vault`
    ///
    /// # Errors
    ///
    /// Under [`DecodePolicy::Strict`], returns `UnknownToken` for the first
    /// marker the vault does not know.
    pub fn decode(
        &self,
        anonymized: &str,
        vault: &TokenVault,
        policy: DecodePolicy,
    ) -> CoreResult<Decoded> {
        let mut output = String::with_capacity(anonymized.len());
        let mut resolved = 0;
        let mut unresolved = Vec::new();
        let mut last = 0;

        for captures in self.marker.captures_iter(anonymized) {
            let (Some(whole), Some(token)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            output.push_str(&anonymized[last..whole.start()]);

            match (vault.resolve_token(token.as_str()), policy) {
                (Ok(original), _) => {
                    output.push_str(original);
                    resolved += 1;
                }
                (Err(err), DecodePolicy::Strict) => return Err(err),
                (Err(_), DecodePolicy::BestEffort) => {
                    output.push_str(whole.as_str());
                    unresolved.push(token.as_str().to_string());
                }
            }
            last = whole.end();
        }

        output.push_str(&anonymized[last..]);
        Ok(Decoded {
            text: output,
            resolved,
            unresolved,
        })
    }

    /// Whether `text` already contains something shaped like a marker
    pub fn contains_marker(&self, text: &str) -> bool {
        self.marker.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::{Category, Span, SpanSource};
    use crate::domain::Token;

    fn accepted(vault: &mut TokenVault, text: &str, start: usize, end: usize, label: Category) -> AcceptedSpan {
        let chars = CharIndex::new(text);
        let span = Span::new(start, end, label, 0.9, SpanSource::Recognizer, chars.char_len()).unwrap();
        let original = span.slice(text, &chars).unwrap();
        let token = vault.assign_token(original, label).unwrap().token;
        AcceptedSpan { span, token }
    }

    #[test]
    fn test_anonymize_replaces_spans_and_keeps_the_rest() {
        let mut vault = TokenVault::default();
        let text = "山田太郎さんは営業部です。";
        let spans = vec![
            accepted(&mut vault, text, 0, 4, Category::Person),
            accepted(&mut vault, text, 7, 10, Category::Department),
        ];

        let out = Rewriter::new(8).unwrap().anonymize(text, &spans).unwrap();

        assert_eq!(
            out,
            format!("{}さんは{}です。", spans[0].token.marker(), spans[1].token.marker())
        );
    }

    #[test]
    fn test_anonymize_rejects_overlap() {
        let mut vault = TokenVault::default();
        let text = "abcdefghij";
        let spans = vec![
            accepted(&mut vault, text, 0, 5, Category::Custom),
            accepted(&mut vault, text, 3, 7, Category::Custom),
        ];

        let err = Rewriter::new(8).unwrap().anonymize(text, &spans).unwrap_err();
        assert_eq!(
            err,
            AnonymizationError::OverlapInvariantViolation {
                start: 3,
                end: 7,
                previous_end: 5
            }
        );
    }

    #[test]
    fn test_anonymize_rejects_unsorted() {
        let mut vault = TokenVault::default();
        let text = "abcdefghij";
        let spans = vec![
            accepted(&mut vault, text, 6, 8, Category::Custom),
            accepted(&mut vault, text, 0, 2, Category::Custom),
        ];
        assert!(matches!(
            Rewriter::new(8).unwrap().anonymize(text, &spans),
            Err(AnonymizationError::OverlapInvariantViolation { .. })
        ));
    }

    #[test]
    fn test_adjacent_spans_are_fine() {
        let mut vault = TokenVault::default();
        let text = "東京大阪";
        let spans = vec![
            accepted(&mut vault, text, 0, 2, Category::Location),
            accepted(&mut vault, text, 2, 4, Category::Location),
        ];
        let out = Rewriter::new(8).unwrap().anonymize(text, &spans).unwrap();
        let decoded = Rewriter::new(8).unwrap().decode(&out, &vault, DecodePolicy::Strict).unwrap();
        assert_eq!(decoded.text, text);
        assert_eq!(decoded.resolved, 2);
    }

    #[test]
    fn test_decode_round_trip() {
        let mut vault = TokenVault::default();
        let text = "連絡先: yamada@example.com (03-1234-5678)";
        let spans = vec![
            accepted(&mut vault, text, 5, 23, Category::Email),
            accepted(&mut vault, text, 25, 37, Category::Phone),
        ];
        let rewriter = Rewriter::new(8).unwrap();
        let out = rewriter.anonymize(text, &spans).unwrap();

        assert!(!out.contains("yamada"));
        assert_eq!(out.matches("<<").count(), 2);
        assert_eq!(rewriter.decode(&out, &vault, DecodePolicy::Strict).unwrap().text, text);
    }

    #[test]
    fn test_strict_decode_fails_on_unknown_marker() {
        let vault = TokenVault::default();
        let err = Rewriter::new(8).unwrap()
            .decode("before <<0badc0de>> after", &vault, DecodePolicy::Strict)
            .unwrap_err();
        assert_eq!(err, AnonymizationError::UnknownToken("0badc0de".to_string()));
    }

    #[test]
    fn test_best_effort_decode_keeps_unknown_marker() {
        let mut vault = TokenVault::default();
        let known = vault.assign_token("佐藤", Category::Person).unwrap().token;
        let input = format!("{} と <<0badc0de>>", known.marker());

        let decoded = Rewriter::new(8).unwrap()
            .decode(&input, &vault, DecodePolicy::BestEffort)
            .unwrap();

        assert_eq!(decoded.text, "佐藤 と <<0badc0de>>");
        assert_eq!(decoded.resolved, 1);
        assert_eq!(decoded.unresolved, vec!["0badc0de".to_string()]);
    }

    #[test]
    fn test_malformed_markers_are_ignored() {
        let vault = TokenVault::default();
        let rewriter = Rewriter::new(8).unwrap();
        for text in ["<<ABCDEF01>>", "<<abc>>", "<< abcdef01 >>", "<abcdef01>"] {
            let decoded = rewriter.decode(text, &vault, DecodePolicy::Strict).unwrap();
            assert_eq!(decoded.text, text);
            assert_eq!(decoded.resolved, 0);
        }
    }

    #[test]
    fn test_extended_tokens_decode() {
        let mut vault = TokenVault::default();
        let a = vault.assign_token("Project-X", Category::Project).unwrap().token;
        let b = vault.assign_token("project-x", Category::Project).unwrap().token;
        assert_eq!(b, Token::new(format!("{}-1", a)).unwrap());

        let text = format!("{}/{}", a.marker(), b.marker());
        let decoded = Rewriter::new(8).unwrap().decode(&text, &vault, DecodePolicy::Strict).unwrap();
        assert_eq!(decoded.text, "Project-X/project-x");
    }

    #[test]
    fn test_decode_policy_parsing() {
        assert_eq!("strict".parse::<DecodePolicy>(), Ok(DecodePolicy::Strict));
        assert_eq!("best-effort".parse::<DecodePolicy>(), Ok(DecodePolicy::BestEffort));
        assert!("lenient".parse::<DecodePolicy>().is_err());
    }
}
