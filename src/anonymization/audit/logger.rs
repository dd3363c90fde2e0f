//! Audit logger for anonymization operations

use crate::anonymization::models::AcceptedSpan;
use crate::anonymization::text::CharIndex;
use crate::domain::SessionId;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One anonymized document, as handed to the audit logger
#[derive(Debug, Clone, Copy)]
pub struct DocumentRecord<'a> {
    pub session_id: &'a SessionId,
    /// Caller-supplied document label (file name, request id, ...)
    pub document: &'a str,
    /// The original text the spans point into
    pub text: &'a str,
    pub accepted: &'a [AcceptedSpan],
    pub rejected_count: usize,
    pub processing_time_ms: u64,
}

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    timestamp: String,
    session_id: String,
    document: String,
    accepted_count: usize,
    rejected_count: usize,
    processing_time_ms: u64,
    spans: Vec<AuditSpan>,
}

/// Audit span entry (with hashed original)
#[derive(Debug, Serialize)]
struct AuditSpan {
    category: String,
    start: usize,
    end: usize,
    confidence: f64,
    token: String,
    /// SHA-256 hash of original value (never log plaintext)
    value_hash: String,
}

/// Audit logger for anonymization operations
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create audit log directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
        })
    }

    /// Path entries are appended to
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Log one anonymized document
    pub fn log_document(&self, record: &DocumentRecord<'_>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let chars = CharIndex::new(record.text);
        let entry = AuditLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            session_id: record.session_id.to_string(),
            document: record.document.to_string(),
            accepted_count: record.accepted.len(),
            rejected_count: record.rejected_count,
            processing_time_ms: record.processing_time_ms,
            spans: record
                .accepted
                .iter()
                .map(|accepted| {
                    let original = accepted.span.slice(record.text, &chars).unwrap_or_default();
                    AuditSpan {
                        category: accepted.span.label.label().to_string(),
                        start: accepted.span.start,
                        end: accepted.span.end,
                        confidence: accepted.span.score,
                        token: accepted.token.to_string(),
                        value_hash: hash_value(original),
                    }
                })
                .collect(),
        };

        self.write_entry(&entry)
    }

    /// Write an audit entry to the log file
    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;

        if self.json_format {
            let json_line =
                serde_json::to_string(entry).context("Failed to serialize audit entry")?;
            writeln!(file, "{json_line}").context("Failed to write audit entry")?;
        } else {
            let tokens: Vec<&str> = entry.spans.iter().map(|s| s.token.as_str()).collect();
            writeln!(
                file,
                "[{}] Session: {} | Document: {} | Accepted: {} | Rejected: {} | Time: {}ms | Tokens: {}",
                entry.timestamp,
                entry.session_id,
                entry.document,
                entry.accepted_count,
                entry.rejected_count,
                entry.processing_time_ms,
                tokens.join(",")
            )
            .context("Failed to write audit entry")?;
        }

        Ok(())
    }
}

/// Hash an original value using SHA-256
fn hash_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anonymization::models::{Category, Span, SpanSource};
    use crate::domain::Token;
    use tempfile::tempdir;

    fn email_span() -> AcceptedSpan {
        AcceptedSpan {
            span: Span::new(3, 19, Category::Email, 0.95, SpanSource::Recognizer, 19).unwrap(),
            token: Token::new("a1b2c3d4").unwrap(),
        }
    }

    #[test]
    fn test_audit_logger_creation() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("nested").join("audit.log");

        let logger = AuditLogger::new(log_path, true, true).unwrap();
        assert!(logger.enabled);
        assert!(dir.path().join("nested").exists());
    }

    #[test]
    fn test_hash_value() {
        assert_eq!(hash_value("test@example.com"), hash_value("test@example.com"));
        assert_ne!(hash_value("test@example.com"), hash_value("other@example.com"));
        assert_eq!(hash_value("").len(), 64);
    }

    #[test]
    fn test_log_document_json() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.log");
        let logger = AuditLogger::new(log_path.clone(), true, true).unwrap();
        let session_id = SessionId::new();
        let accepted = vec![email_span()];

        logger
            .log_document(&DocumentRecord {
                session_id: &session_id,
                document: "memo.txt",
                text: "宛先:test@example.com",
                accepted: &accepted,
                rejected_count: 1,
                processing_time_ms: 2,
            })
            .unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        let entry: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(entry["document"], "memo.txt");
        assert_eq!(entry["session_id"], session_id.to_string());
        assert_eq!(entry["spans"][0]["category"], "EMAIL");
        assert_eq!(entry["spans"][0]["token"], "a1b2c3d4");
        assert_eq!(
            entry["spans"][0]["value_hash"],
            hash_value("test@example.com")
        );
        assert!(!content.contains("test@example.com"));
    }

    #[test]
    fn test_log_document_plain_text() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.log");
        let logger = AuditLogger::new(log_path.clone(), false, true).unwrap();
        let session_id = SessionId::new();
        let accepted = vec![email_span()];

        logger
            .log_document(&DocumentRecord {
                session_id: &session_id,
                document: "memo.txt",
                text: "宛先:test@example.com",
                accepted: &accepted,
                rejected_count: 0,
                processing_time_ms: 0,
            })
            .unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert!(content.contains("Document: memo.txt"));
        assert!(content.contains("Tokens: a1b2c3d4"));
        assert!(!content.contains("test@example.com"));
    }

    #[test]
    fn test_disabled_logger_writes_nothing() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("audit.log");
        let logger = AuditLogger::new(log_path.clone(), true, false).unwrap();
        let session_id = SessionId::new();

        logger
            .log_document(&DocumentRecord {
                session_id: &session_id,
                document: "memo.txt",
                text: "",
                accepted: &[],
                rejected_count: 0,
                processing_time_ms: 0,
            })
            .unwrap();

        assert!(!log_path.exists());
    }
}
