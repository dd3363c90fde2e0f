//! Anonymize command implementation
//!
//! This module implements the `anonymize` command. All inputs share one
//! session, so the same original gets the same token in every output.
//! Anonymized text goes to stdout (or `--output-dir`); progress and the
//! session report go to stderr.

use crate::anonymization::detector::SpanListRecognizer;
use crate::anonymization::models::{Category, RawSpan};
use crate::anonymization::{AnonymizationEngine, SessionReport};
use crate::config::load_config_or_default;
use crate::{log_document_anonymized, log_error_with_context, log_session_complete};
use anyhow::Context;
use clap::Args;
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Input name that reads from stdin
const STDIN_INPUT: &str = "-";

/// Arguments for the anonymize command
#[derive(Args, Debug)]
pub struct AnonymizeArgs {
    /// Text files to anonymize (`-` reads stdin)
    #[arg(required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Externally recognized spans (JSON array or JSON Lines) for a single input
    #[arg(long, value_name = "FILE")]
    pub spans: Option<PathBuf>,

    /// TOML table of `literal = "CATEGORY"` rules to learn before anonymizing
    #[arg(long, value_name = "FILE")]
    pub learn: Option<PathBuf>,

    /// Write `<name>` outputs into this directory instead of stdout
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Decode every output and check it restores the input exactly
    #[arg(long)]
    pub verify: bool,

    /// Write the JSON session report to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Override engine.min_confidence
    #[arg(long, value_name = "SCORE")]
    pub min_confidence: Option<f64>,
}

impl AnonymizeArgs {
    /// Execute the anonymize command
    ///
    /// Exit codes: 0 success, 2 configuration or argument error,
    /// 3 round-trip verification failure, 5 a document failed.
    pub fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let started = Instant::now();
        tracing::info!(inputs = self.inputs.len(), "Starting anonymize command");

        if self.spans.is_some() && self.inputs.len() != 1 {
            eprintln!("❌ --spans applies to exactly one input, got {}", self.inputs.len());
            return Ok(2);
        }

        let mut config = match load_config_or_default(config_path) {
            Ok(config) => config,
            Err(e) => {
                log_error_with_context!(&e, "Failed to load configuration");
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        if let Some(min_confidence) = self.min_confidence {
            tracing::info!(min_confidence, "Overriding min_confidence from CLI");
            config.anonymization.engine.min_confidence = min_confidence;
        }
        if let Err(e) = config.validate() {
            eprintln!("❌ Configuration validation failed: {e}");
            return Ok(2);
        }

        let mut engine = match AnonymizationEngine::new(config.anonymization) {
            Ok(engine) => engine,
            Err(e) => {
                log_error_with_context!(&e, "Failed to create anonymization engine");
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        if let Some(ref path) = self.learn {
            let rules = match load_rules(path) {
                Ok(rules) => rules,
                Err(e) => {
                    eprintln!("❌ Invalid rule file {}: {e:#}", path.display());
                    return Ok(2);
                }
            };
            let outcome = engine.learn(rules, None)?;
            eprintln!(
                "📚 Learned {} rule(s), replaced {}",
                outcome.registered, outcome.overwritten
            );
        }

        let external_spans: Vec<RawSpan> = match self.spans {
            Some(ref path) => SpanListRecognizer::from_file(path)?.spans().to_vec(),
            None => Vec::new(),
        };

        if let Some(ref dir) = self.output_dir {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        }

        let mut report = SessionReport::from_engine(&engine);
        let mut failed = 0usize;
        let mut verification_failures = 0usize;

        for input in &self.inputs {
            let document = document_label(input);
            let text = match read_input(input) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(document = %document, error = %e, "Failed to read input");
                    eprintln!("❌ {e:#}");
                    report.add_warning(format!("Failed to read {document}"));
                    failed += 1;
                    continue;
                }
            };

            let outcome = match engine.anonymize_document(&document, &text, &external_spans) {
                Ok(outcome) => outcome,
                Err(e) => {
                    log_error_with_context!(&e, "Failed to anonymize document");
                    eprintln!("❌ {document}: {e}");
                    report.add_warning(format!("Failed to anonymize {document}: {e}"));
                    failed += 1;
                    continue;
                }
            };

            if self.verify {
                match engine.decode(&outcome.text) {
                    Ok(decoded) if decoded == text => {}
                    Ok(_) => {
                        eprintln!("❌ {document}: decoded output differs from the input");
                        report.add_warning(format!("Round trip mismatch for {document}"));
                        verification_failures += 1;
                    }
                    Err(e) => {
                        eprintln!("❌ {document}: decode failed: {e}");
                        report.add_warning(format!("Round trip failed for {document}: {e}"));
                        verification_failures += 1;
                    }
                }
            }

            match self.output_dir {
                Some(ref dir) => {
                    let target = dir.join(&document);
                    fs::write(&target, &outcome.text)
                        .with_context(|| format!("Failed to write {}", target.display()))?;
                    eprintln!(
                        "✅ {document} → {} ({} span(s))",
                        target.display(),
                        outcome.accepted.len()
                    );
                }
                None => println!("{}", outcome.text),
            }

            log_document_anonymized!(
                &document,
                outcome.accepted.len(),
                std::time::Duration::from_millis(outcome.processing_time_ms)
            );
            report.add_document(&document, &text, &outcome);
        }

        report.refresh(&engine);
        eprint!("{}", report.format_console());

        if let Some(ref path) = self.report {
            report
                .write_to_file(path)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            eprintln!("📄 Report written to {}", path.display());
        }

        log_session_complete!(self.inputs.len(), failed, started.elapsed());

        if failed > 0 {
            Ok(5)
        } else if verification_failures > 0 {
            Ok(3)
        } else {
            Ok(0)
        }
    }
}

/// Reads a `literal = "CATEGORY"` table
fn load_rules(path: &Path) -> anyhow::Result<Vec<(String, Category)>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rule file {}", path.display()))?;
    let table: BTreeMap<String, String> =
        toml::from_str(&content).context("Failed to parse rule file")?;

    table
        .into_iter()
        .map(|(literal, label)| {
            let category = Category::from_label(&label)
                .with_context(|| format!("Unknown category '{label}' for a learned literal"))?;
            Ok((literal, category))
        })
        .collect()
}

fn read_input(input: &Path) -> anyhow::Result<String> {
    if input.as_os_str() == STDIN_INPUT {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn document_label(input: &Path) -> String {
    if input.as_os_str() == STDIN_INPUT {
        return "stdin".to_string();
    }
    input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}
