//! Anonymization configuration

use crate::anonymization::learner::DEFAULT_LEARNED_RULE_SCORE;
use crate::anonymization::resolver::DEFAULT_MIN_CONFIDENCE;
use crate::anonymization::rewriter::DecodePolicy;
use crate::anonymization::vault::{DEFAULT_MAX_COLLISION_RETRIES, DEFAULT_TOKEN_WIDTH};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Smallest accepted token width
pub const MIN_TOKEN_WIDTH: usize = 4;

/// Largest accepted token width (a full SHA-256 hex digest)
pub const MAX_TOKEN_WIDTH: usize = 64;

/// Session engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Candidates scoring below this are rejected before resolution
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Hex characters per token
    #[serde(default = "default_token_width")]
    pub token_width: usize,

    /// `-N` extensions tried after a digest collision
    #[serde(default = "default_max_collision_retries")]
    pub max_collision_retries: u32,

    /// Behavior of decode on markers the session never issued
    #[serde(default)]
    pub decode_policy: DecodePolicy,

    /// Score carried by learned rule candidates
    #[serde(default = "default_learned_rule_score")]
    pub learned_rule_score: f64,

    /// Keep honorifics and job titles outside PERSON spans
    #[serde(default = "default_true")]
    pub split_title_suffixes: bool,

    /// Keep 約, ¥, 万円, 程度 and similar outside MONEY tokens
    #[serde(default = "default_true")]
    pub split_money_affixes: bool,

    /// Keep 第 and 号 outside ID tokens
    #[serde(default = "default_true")]
    pub split_identifier_affixes: bool,

    /// Give each address unit of a LOCATION span its own token
    #[serde(default = "default_true")]
    pub split_addresses: bool,
}

fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}

fn default_token_width() -> usize {
    DEFAULT_TOKEN_WIDTH
}

fn default_max_collision_retries() -> u32 {
    DEFAULT_MAX_COLLISION_RETRIES
}

fn default_learned_rule_score() -> f64 {
    DEFAULT_LEARNED_RULE_SCORE
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            token_width: default_token_width(),
            max_collision_retries: default_max_collision_retries(),
            decode_policy: DecodePolicy::default(),
            learned_rule_score: default_learned_rule_score(),
            split_title_suffixes: true,
            split_money_affixes: true,
            split_identifier_affixes: true,
            split_addresses: true,
        }
    }
}

impl EngineConfig {
    /// Validate engine settings
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            anyhow::bail!(
                "engine.min_confidence must be between 0.0 and 1.0, got {}",
                self.min_confidence
            );
        }

        if !(MIN_TOKEN_WIDTH..=MAX_TOKEN_WIDTH).contains(&self.token_width) {
            anyhow::bail!(
                "engine.token_width must be between {MIN_TOKEN_WIDTH} and {MAX_TOKEN_WIDTH}, got {}",
                self.token_width
            );
        }

        if !(0.0..=1.0).contains(&self.learned_rule_score) {
            anyhow::bail!(
                "engine.learned_rule_score must be between 0.0 and 1.0, got {}",
                self.learned_rule_score
            );
        }

        if self.learned_rule_score < self.min_confidence {
            anyhow::bail!(
                "engine.learned_rule_score ({}) must not be below engine.min_confidence ({}), \
                 or learned rules would never be applied",
                self.learned_rule_score,
                self.min_confidence
            );
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("TOKUMEI_ENGINE_MIN_CONFIDENCE") {
            self.min_confidence = val
                .parse()
                .context("Invalid TOKUMEI_ENGINE_MIN_CONFIDENCE value")?;
        }

        if let Ok(val) = std::env::var("TOKUMEI_ENGINE_TOKEN_WIDTH") {
            self.token_width = val
                .parse()
                .context("Invalid TOKUMEI_ENGINE_TOKEN_WIDTH value")?;
        }

        if let Ok(val) = std::env::var("TOKUMEI_ENGINE_MAX_COLLISION_RETRIES") {
            self.max_collision_retries = val
                .parse()
                .context("Invalid TOKUMEI_ENGINE_MAX_COLLISION_RETRIES value")?;
        }

        if let Ok(val) = std::env::var("TOKUMEI_ENGINE_DECODE_POLICY") {
            self.decode_policy = val
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("Invalid TOKUMEI_ENGINE_DECODE_POLICY value")?;
        }

        if let Ok(val) = std::env::var("TOKUMEI_ENGINE_LEARNED_RULE_SCORE") {
            self.learned_rule_score = val
                .parse()
                .context("Invalid TOKUMEI_ENGINE_LEARNED_RULE_SCORE value")?;
        }

        if let Ok(val) = std::env::var("TOKUMEI_ENGINE_SPLIT_TITLE_SUFFIXES") {
            self.split_title_suffixes = val
                .parse()
                .context("Invalid TOKUMEI_ENGINE_SPLIT_TITLE_SUFFIXES value")?;
        }

        if let Ok(val) = std::env::var("TOKUMEI_ENGINE_SPLIT_MONEY_AFFIXES") {
            self.split_money_affixes = val
                .parse()
                .context("Invalid TOKUMEI_ENGINE_SPLIT_MONEY_AFFIXES value")?;
        }

        if let Ok(val) = std::env::var("TOKUMEI_ENGINE_SPLIT_IDENTIFIER_AFFIXES") {
            self.split_identifier_affixes = val
                .parse()
                .context("Invalid TOKUMEI_ENGINE_SPLIT_IDENTIFIER_AFFIXES value")?;
        }

        if let Ok(val) = std::env::var("TOKUMEI_ENGINE_SPLIT_ADDRESSES") {
            self.split_addresses = val
                .parse()
                .context("Invalid TOKUMEI_ENGINE_SPLIT_ADDRESSES value")?;
        }

        Ok(())
    }
}

/// Built-in recognizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// Run the regex pattern library on every document
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path to a pattern library TOML file; the embedded library otherwise
    #[serde(default)]
    pub pattern_library: Option<PathBuf>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pattern_library: None,
        }
    }
}

impl RecognizerConfig {
    /// Validate recognizer settings
    pub fn validate(&self) -> Result<()> {
        if let Some(ref path) = self.pattern_library {
            if !path.exists() {
                anyhow::bail!("Pattern library file not found: {}", path.display());
            }
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                anyhow::bail!("Pattern library must be a TOML file: {}", path.display());
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("TOKUMEI_RECOGNIZER_ENABLED") {
            self.enabled = val
                .parse()
                .context("Invalid TOKUMEI_RECOGNIZER_ENABLED value")?;
        }

        if let Ok(val) = std::env::var("TOKUMEI_RECOGNIZER_PATTERN_LIBRARY") {
            self.pattern_library = Some(PathBuf::from(val));
        }

        Ok(())
    }
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging
    #[serde(default)]
    pub enabled: bool,

    /// Audit log file path
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// Use JSON format for audit logs
    #[serde(default = "default_true")]
    pub json_format: bool,
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/tokumei.log")
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
            json_format: true,
        }
    }
}

impl AuditConfig {
    /// Validate audit configuration
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            anyhow::bail!("audit.log_path cannot be empty when audit logging is enabled");
        }
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("TOKUMEI_AUDIT_ENABLED") {
            self.enabled = val.parse().context("Invalid TOKUMEI_AUDIT_ENABLED value")?;
        }

        if let Ok(val) = std::env::var("TOKUMEI_AUDIT_LOG_PATH") {
            self.log_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("TOKUMEI_AUDIT_JSON_FORMAT") {
            self.json_format = val
                .parse()
                .context("Invalid TOKUMEI_AUDIT_JSON_FORMAT value")?;
        }

        Ok(())
    }
}

/// Everything an [`AnonymizationEngine`](crate::anonymization::AnonymizationEngine) needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub recognizer: RecognizerConfig,

    #[serde(default)]
    pub audit: AuditConfig,
}

impl AnonymizationConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.engine.validate().context("Invalid engine configuration")?;
        self.recognizer
            .validate()
            .context("Invalid recognizer configuration")?;
        self.audit.validate().context("Invalid audit configuration")?;
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.engine.apply_env_overrides()?;
        self.recognizer.apply_env_overrides()?;
        self.audit.apply_env_overrides()?;
        Ok(())
    }
}
