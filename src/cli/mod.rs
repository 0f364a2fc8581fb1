//! CLI module for the user registry
//!
//! Provides subcommands for working with user data files:
//! - `validate`: check candidate records without storing anything
//! - `import`: load roles, document types, users and orders into storage

pub mod import;
pub mod validate;

use std::path::Path;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// User Registry - validate and import user records
#[derive(Parser)]
#[command(name = "user-registry")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a JSON candidate or array of candidates
    Validate(validate::ValidateArgs),

    /// Import roles, document types, users and orders from a JSON file
    Import(import::ImportArgs),
}

/// Load `.env` and configuration, then install logging
fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    logging::init_logging(&config.logging);

    Ok(config)
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;

    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid JSON in {}: {}", path.display(), e))
}
