//! CLI command definitions and dispatch.

pub mod trash;

use clap::{Parser, Subcommand};

use nubedrive_core::config::AppConfig;
use nubedrive_core::error::AppError;

use crate::output::OutputFormat;

/// NubeDrive — personal cloud storage
#[derive(Debug, Parser)]
#[command(name = "nubedrive", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment overlay (config/<env>.toml)
    #[arg(short, long, default_value = "default")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Trash management
    Trash(trash::TrashArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Trash(args) => trash::execute(args, &self.env, self.format).await,
        }
    }
}

/// Helper: load configuration for the selected environment
pub fn load_config(env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(env)
}
