//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Tokumei using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Tokumei - reversible anonymization of Japanese business text
#[derive(Parser, Debug)]
#[command(name = "tokumei")]
#[command(version, about, long_about = None)]
#[command(author = "Tokumei Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "tokumei.toml", env = "TOKUMEI_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TOKUMEI_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Anonymize text files within one session
    Anonymize(commands::anonymize::AnonymizeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
