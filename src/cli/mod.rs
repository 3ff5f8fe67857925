//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Keepsake using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Keepsake - renders personalized-book responses into PDF documents
#[derive(Parser, Debug)]
#[command(name = "keepsake")]
#[command(version, about, long_about = None)]
#[command(author = "Keepsake Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "keepsake.toml", env = "KEEPSAKE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "KEEPSAKE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export the responses of a book (or a single response) to PDF
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
