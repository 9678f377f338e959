//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for sheetfill using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// sheetfill - fill spreadsheet templates from structured records
#[derive(Parser, Debug)]
#[command(name = "sheetfill")]
#[command(version, about, long_about = None)]
#[command(author = "sheetfill Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sheetfill.toml", env = "SHEETFILL_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SHEETFILL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Substitute placeholders and materialize record rows in a document
    Generate(commands::generate::GenerateArgs),

    /// Substitute placeholders only
    Substitute(commands::substitute::SubstituteArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show the resolved template configuration for a document type
    ShowTemplate(commands::show_template::ShowTemplateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
