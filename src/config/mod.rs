// Configuration module for scale-recorder
//
// Provides:
// - YAML configuration file loading
// - Environment variable substitution
// - Configuration validation
// - Default values

pub mod types;
mod loader;

pub use types::*;
pub use loader::ConfigLoader;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RecorderConfig> {
    ConfigLoader::load(path).context("Failed to load configuration")
}

/// Load configuration with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<RecorderConfig> {
    let mut config = load_config(path)?;
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Allow environment variables to override config values
pub fn apply_env_overrides(config: &mut RecorderConfig) -> Result<()> {
    if let Ok(port) = std::env::var("SCALE_PORT") {
        config.serial.port = port;
    }

    if let Ok(baud_rate) = std::env::var("SCALE_BAUD_RATE") {
        config.serial.baud_rate = baud_rate
            .parse()
            .with_context(|| format!("SCALE_BAUD_RATE '{}' is not a number", baud_rate))?;
    }

    if let Ok(ledger_path) = std::env::var("LEDGER_PATH") {
        match config.ledger.as_csv_mut() {
            Some(csv) => csv.path = ledger_path,
            None => config.ledger.csv = Some(CsvLedgerConfig { path: ledger_path }),
        }
    }

    Ok(())
}
