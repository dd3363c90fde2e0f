//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "tokumei.toml")]
    pub output: String,

    /// Include comments explaining every option
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Tokumei configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Validate configuration: tokumei validate-config");
                println!("  3. Anonymize a document: tokumei anonymize memo.txt --verify");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Tokumei Configuration File
# Reversible anonymization of Japanese business text

[engine]
min_confidence = 0.3
token_width = 8
max_collision_retries = 16
decode_policy = "strict"
learned_rule_score = 1.0
split_title_suffixes = true
split_money_affixes = true
split_identifier_affixes = true
split_addresses = true

[recognizer]
enabled = true

[audit]
enabled = false
log_path = "./audit/tokumei.log"
json_format = true

[logging]
level = "info"
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Tokumei Configuration File
# Reversible anonymization of Japanese business text
#
# Every section is optional. Any key can also be set through the
# environment as TOKUMEI_<SECTION>_<KEY>, e.g. TOKUMEI_ENGINE_MIN_CONFIDENCE.
# Values may reference environment variables with ${VAR}.

# ============================================================================
# Engine Settings
# ============================================================================
[engine]
# Candidates scoring below this are dropped before conflict resolution (0.0-1.0)
min_confidence = 0.3

# Hex characters per token (4-64). Markers look like <<1a2b3c4d>>
token_width = 8

# Number of -N extensions tried when two originals share a digest prefix
max_collision_retries = 16

# Decode behavior for markers this session never issued
# - strict: fail with an unknown token error
# - best_effort: leave the marker untouched
decode_policy = "strict"

# Score of learned literal rules (must be >= min_confidence)
learned_rule_score = 1.0

# Keep honorifics and job titles (さん, 様, 部長, ...) outside PERSON spans
split_title_suffixes = true

# Tokenize only the amount of MONEY spans: 約1,500万円程度 -> 約<<token>>万円程度
split_money_affixes = true

# Tokenize only the number of ID spans: 第12345号 -> 第<<token>>号
split_identifier_affixes = true

# Give each address unit its own token: 東京都港区 -> <<token>><<token>>
split_addresses = true

# ============================================================================
# Recognizer Settings
# ============================================================================
[recognizer]
# Run the built-in regex recognizer
enabled = true

# Optional: replace the built-in pattern library with your own TOML file
# pattern_library = "./patterns/ja_patterns.toml"

# ============================================================================
# Audit Log
# ============================================================================
[audit]
# Write one record per anonymized document. Originals are stored as SHA-256
# hashes, never as text
enabled = false

# Audit log file
log_path = "./audit/tokumei.log"

# JSON Lines (true) or plain text (false)
json_format = true

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Log level (trace, debug, info, warn, error). RUST_LOG takes precedence
level = "info"

# Enable JSON file logging in addition to the console
local_enabled = false

# Local log directory
local_path = "./logs"

# Log rotation (daily or hourly)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokumeiConfig;
    use tempfile::TempDir;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "tokumei.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "tokumei.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_configs_parse_and_validate() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config: TokumeiConfig = toml::from_str(&content).unwrap();
            config.validate().unwrap();
            assert_eq!(config.anonymization.engine.token_width, 8);
            assert!(config.anonymization.recognizer.enabled);
        }
    }

    #[test]
    fn test_generate_config_with_examples() {
        let config = InitArgs::generate_config_with_examples();
        assert!(config.contains("# Tokumei Configuration File"));
        assert!(config.contains("decode_policy"));
        assert!(config.contains("[audit]"));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokumei.toml");
        fs::write(&path, "# existing").unwrap();

        let mut args = InitArgs {
            output: path.to_string_lossy().into_owned(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "# existing");

        args.force = true;
        assert_eq!(args.execute().unwrap(), 0);
        assert!(fs::read_to_string(&path).unwrap().contains("[engine]"));
    }
}
