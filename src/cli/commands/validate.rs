//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Tokumei configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// Loading already validates, so a load failure and an invalid value
    /// both end here with exit code 2.
    pub fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        let engine = &config.anonymization.engine;
        let recognizer = &config.anonymization.recognizer;
        let audit = &config.anonymization.audit;

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Min Confidence: {}", engine.min_confidence);
        println!("  Token Width: {}", engine.token_width);
        println!("  Collision Retries: {}", engine.max_collision_retries);
        println!("  Decode Policy: {:?}", engine.decode_policy);
        println!("  Learned Rule Score: {}", engine.learned_rule_score);
        println!("  Split Title Suffixes: {}", engine.split_title_suffixes);
        println!("  Split Money Affixes: {}", engine.split_money_affixes);
        println!("  Split Identifier Affixes: {}", engine.split_identifier_affixes);
        println!("  Split Addresses: {}", engine.split_addresses);
        match (recognizer.enabled, &recognizer.pattern_library) {
            (false, _) => println!("  Recognizer: disabled"),
            (true, Some(path)) => println!("  Recognizer: {}", path.display()),
            (true, None) => println!("  Recognizer: built-in patterns"),
        }
        if audit.enabled {
            println!("  Audit Log: {}", audit.log_path.display());
        } else {
            println!("  Audit Log: disabled");
        }
        println!("  Log Level: {}", config.logging.level);
        println!();
        Ok(0)
    }
}
