//! Integration tests for configuration loading and validation
//!
//! Tests that modify environment variables hold `ENV_MUTEX`.

use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tokumei::anonymization::DecodePolicy;
use tokumei::config::{load_config, load_config_or_default};

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("TOKUMEI_ENGINE_MIN_CONFIDENCE");
    std::env::remove_var("TOKUMEI_ENGINE_DECODE_POLICY");
    std::env::remove_var("TOKUMEI_ENGINE_SPLIT_ADDRESSES");
    std::env::remove_var("TOKUMEI_AUDIT_ENABLED");
    std::env::remove_var("TOKUMEI_LOGGING_LEVEL");
    std::env::remove_var("TEST_TOKUMEI_AUDIT_DIR");
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[engine]
min_confidence = 0.4
token_width = 12
max_collision_retries = 8
decode_policy = "best_effort"
learned_rule_score = 0.9
split_title_suffixes = false
split_addresses = false

[recognizer]
enabled = false

[audit]
enabled = true
log_path = "/tmp/tokumei-audit/tokumei.log"
json_format = false

[logging]
level = "debug"
local_enabled = false
local_path = "/tmp/tokumei-logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();
    let engine = &config.anonymization.engine;
    assert_eq!(engine.min_confidence, 0.4);
    assert_eq!(engine.token_width, 12);
    assert_eq!(engine.max_collision_retries, 8);
    assert_eq!(engine.decode_policy, DecodePolicy::BestEffort);
    assert_eq!(engine.learned_rule_score, 0.9);
    assert!(!engine.split_title_suffixes);
    assert!(!engine.split_addresses);
    assert!(engine.split_money_affixes);
    assert!(!config.anonymization.recognizer.enabled);
    assert!(config.anonymization.audit.enabled);
    assert!(!config.anonymization.audit.json_format);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_empty_config_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("");
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.anonymization.engine.min_confidence, 0.3);
    assert_eq!(config.anonymization.engine.token_width, 8);
    assert_eq!(config.anonymization.engine.decode_policy, DecodePolicy::Strict);
    assert!(config.anonymization.recognizer.enabled);
    assert!(!config.anonymization.audit.enabled);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_env_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    std::env::set_var("TOKUMEI_ENGINE_MIN_CONFIDENCE", "0.6");
    std::env::set_var("TOKUMEI_ENGINE_DECODE_POLICY", "best_effort");
    std::env::set_var("TOKUMEI_LOGGING_LEVEL", "warn");
    std::env::set_var("TOKUMEI_ENGINE_SPLIT_ADDRESSES", "false");

    let file = write_config("[engine]\nmin_confidence = 0.4\n");
    let result = load_config(file.path());
    cleanup_env_vars();

    let config = result.unwrap();
    assert_eq!(config.anonymization.engine.min_confidence, 0.6);
    assert_eq!(
        config.anonymization.engine.decode_policy,
        DecodePolicy::BestEffort
    );
    assert_eq!(config.logging.level, "warn");
    assert!(!config.anonymization.engine.split_addresses);
}

#[test]
fn test_invalid_env_override_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    std::env::set_var("TOKUMEI_ENGINE_MIN_CONFIDENCE", "high");
    let result = load_config_or_default("/nonexistent/tokumei.toml");
    cleanup_env_vars();

    assert!(result.is_err());
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    std::env::set_var("TEST_TOKUMEI_AUDIT_DIR", "/var/audit");
    let file = write_config("[audit]\nlog_path = \"${TEST_TOKUMEI_AUDIT_DIR}/tokumei.log\"\n");
    let result = load_config(file.path());
    cleanup_env_vars();

    let config = result.unwrap();
    assert_eq!(
        config.anonymization.audit.log_path,
        std::path::PathBuf::from("/var/audit/tokumei.log")
    );
}

#[test]
fn test_missing_substitution_variable_fails() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("[audit]\nlog_path = \"${TEST_TOKUMEI_AUDIT_DIR}/tokumei.log\"\n");
    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_invalid_values_fail_validation() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    for content in [
        "[engine]\nmin_confidence = 1.5\n",
        "[engine]\ntoken_width = 2\n",
        "[engine]\ntoken_width = 65\n",
        "[engine]\nmin_confidence = 0.8\nlearned_rule_score = 0.5\n",
        "[engine]\ndecode_policy = \"lenient\"\n",
        "[recognizer]\npattern_library = \"/nonexistent/patterns.toml\"\n",
        "[logging]\nlevel = \"verbose\"\n",
        "[logging]\nlocal_rotation = \"weekly\"\n",
    ] {
        let file = write_config(content);
        assert!(load_config(file.path()).is_err(), "accepted: {content}");
    }
}

#[test]
fn test_custom_pattern_library() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let dir = tempfile::TempDir::new().unwrap();
    let library = dir.path().join("patterns.toml");
    std::fs::write(
        &library,
        r#"
[patterns.ticket]
patterns = ["TCK-[0-9]{4}"]
confidence = 0.9
category = "ID"
"#,
    )
    .unwrap();

    let file = write_config(&format!(
        "[recognizer]\npattern_library = \"{}\"\n",
        library.display()
    ));
    let config = load_config(file.path()).unwrap();

    let mut engine =
        tokumei::anonymization::AnonymizationEngine::new(config.anonymization).unwrap();
    let anonymized = engine.anonymize("TCK-1234 を確認").unwrap();
    assert!(!anonymized.contains("TCK-1234"));
    assert_eq!(engine.decode(&anonymized).unwrap(), "TCK-1234 を確認");
}

#[test]
fn test_missing_file() {
    assert!(load_config("/nonexistent/tokumei.toml").is_err());
}
