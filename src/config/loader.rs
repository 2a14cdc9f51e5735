// Configuration loader with environment variable substitution

use super::types::*;
use anyhow::{bail, Context, Result};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Read a YAML file, expand `${VAR}` placeholders and validate the result
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RecorderConfig> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let expanded = Self::substitute_env_vars(&raw);
        let config: RecorderConfig = serde_yaml::from_str(&expanded)
            .with_context(|| format!("Failed to parse YAML configuration {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Expand `${VAR}` and `${VAR:-default}` from the process environment.
    ///
    /// `${SCALE_PORT:-/dev/ttyUSB0}` becomes `/dev/ttyUSB0` when SCALE_PORT
    /// is unset. A placeholder with no default and no variable is left as is.
    fn substitute_env_vars(content: &str) -> String {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let re = PLACEHOLDER.get_or_init(|| {
            Regex::new(r"\$\{([^}:]+)(?::-([^}]+))?\}").expect("placeholder pattern is valid")
        });

        re.replace_all(content, |caps: &regex::Captures| {
            let name = &caps[1];
            std::env::var(name).unwrap_or_else(|_| match caps.get(2) {
                Some(default) => default.as_str().to_string(),
                None => caps[0].to_string(),
            })
        })
        .into_owned()
    }

    /// Validate configuration
    pub fn validate(config: &RecorderConfig) -> Result<()> {
        if config.serial.port.trim().is_empty() {
            bail!("serial.port cannot be empty");
        }

        if config.serial.baud_rate == 0 {
            bail!("serial.baud_rate must be > 0");
        }

        if config.serial.read_timeout_ms == 0 {
            bail!("serial.read_timeout_ms must be > 0");
        }

        match config.ledger.backend.as_str() {
            "csv" => {
                match config.ledger.as_csv() {
                    Some(csv) if !csv.path.trim().is_empty() => {}
                    Some(_) => bail!("ledger.csv.path cannot be empty"),
                    None => bail!("csv ledger selected but ledger.csv config missing"),
                }
            }
            "memory" => {}
            unknown => bail!("Unknown ledger backend: '{}'. Supported: csv, memory", unknown),
        }

        if config.station.product_type.trim().is_empty() {
            bail!("station.product_type cannot be empty");
        }

        match config.printer.backend.as_str() {
            "tcp" => {
                if config.printer.tcp.is_none() {
                    bail!("tcp printer selected but printer.tcp config missing");
                }
            }
            "device" => {
                if config.printer.device.is_none() {
                    bail!("device printer selected but printer.device config missing");
                }
            }
            "log" => {}
            unknown => bail!("Unknown printer backend: '{}'. Supported: tcp, device, log", unknown),
        }

        if config.printer.width_dots == 0 || config.printer.length_dots == 0 {
            bail!("printer.width_dots and printer.length_dots must be > 0");
        }

        match config.report.format.as_str() {
            "csv" | "json" => {}
            unknown => bail!("Unknown report format: '{}'. Supported: csv, json", unknown),
        }

        Ok(())
    }
}
