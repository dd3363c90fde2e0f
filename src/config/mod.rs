//! Configuration management for Tokumei.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! Tokumei uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `TOKUMEI_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tokumei::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("tokumei.toml")?;
//!
//! println!("Min confidence: {}", config.anonymization.engine.min_confidence);
//! println!("Log level: {}", config.logging.level);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [engine]
//! min_confidence = 0.3
//! token_width = 8
//! decode_policy = "strict"
//!
//! [recognizer]
//! pattern_library = "${TOKUMEI_PATTERNS}"
//!
//! [audit]
//! enabled = true
//! log_path = "./audit/tokumei.log"
//!
//! [logging]
//! level = "info"
//! ```

pub mod loader;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, load_config_or_default};
pub use schema::{LoggingConfig, TokumeiConfig};
