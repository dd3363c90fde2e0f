//! Replays spans produced outside the process
//!
//! External NER pipelines can dump their output as JSON, either one array
//! or one span object per line, and have it resolved and tokenized here.

use super::Recognizer;
use crate::anonymization::models::RawSpan;
use anyhow::{Context, Result};
use std::path::Path;

/// Recognizer returning a fixed list of spans for any text
#[derive(Debug, Clone, Default)]
pub struct SpanListRecognizer {
    spans: Vec<RawSpan>,
}

impl SpanListRecognizer {
    /// Wraps an in-memory span list
    pub fn new(spans: Vec<RawSpan>) -> Self {
        Self { spans }
    }

    /// Parses a JSON array of spans, or JSON Lines with one span per line
    pub fn from_json(content: &str) -> Result<Self> {
        let trimmed = content.trim_start();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        if trimmed.starts_with('[') {
            let spans: Vec<RawSpan> =
                serde_json::from_str(trimmed).context("Failed to parse span array")?;
            return Ok(Self::new(spans));
        }

        let mut spans = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let span: RawSpan = serde_json::from_str(line)
                .with_context(|| format!("Failed to parse span on line {}", line_no + 1))?;
            spans.push(span);
        }
        Ok(Self::new(spans))
    }

    /// Reads spans from a JSON or JSON Lines file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read span file: {}", path.as_ref().display()))?;
        Self::from_json(&content)
    }

    /// The wrapped spans
    pub fn spans(&self) -> &[RawSpan] {
        &self.spans
    }
}

impl Recognizer for SpanListRecognizer {
    fn recognize(&self, _text: &str) -> Result<Vec<RawSpan>> {
        Ok(self.spans.clone())
    }

    fn name(&self) -> &str {
        "span-list"
    }
}
