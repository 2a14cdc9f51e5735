// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Configuration types for scale-recorder

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecorderConfig {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub station: StationSettings,
    #[serde(default)]
    pub printer: PrinterConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial line the scale is attached to
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerialConfig {
    #[serde(default = "default_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Upper bound on a single blocking line read
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u64,

    /// Pause after closing the port before it may be opened again
    #[serde(default = "default_reopen_delay")]
    pub reopen_delay_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout(),
            reopen_delay_ms: default_reopen_delay(),
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn reopen_delay(&self) -> Duration {
        Duration::from_millis(self.reopen_delay_ms)
    }
}

/// Ledger configuration with backend selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    /// Backend type: "csv" or "memory"
    #[serde(default = "default_ledger_backend")]
    pub backend: String,

    #[serde(default)]
    pub csv: Option<CsvLedgerConfig>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: default_ledger_backend(),
            csv: Some(CsvLedgerConfig::default()),
        }
    }
}

impl LedgerConfig {
    pub fn as_csv(&self) -> Option<&CsvLedgerConfig> {
        self.csv.as_ref()
    }

    pub fn as_csv_mut(&mut self) -> Option<&mut CsvLedgerConfig> {
        self.csv.as_mut()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CsvLedgerConfig {
    pub path: String,
}

impl Default for CsvLedgerConfig {
    fn default() -> Self {
        Self {
            path: "weighing_data.csv".to_string(),
        }
    }
}

/// Station behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StationSettings {
    /// Product label stamped on ingested readings
    #[serde(default = "default_product_type")]
    pub product_type: String,

    /// Return to the menu once the batch that was open at start is full.
    /// When false, ingestion rolls over into the next batch and keeps going.
    #[serde(default = "default_true")]
    pub stop_when_batch_full: bool,
}

impl Default for StationSettings {
    fn default() -> Self {
        Self {
            product_type: default_product_type(),
            stop_when_batch_full: true,
        }
    }
}

/// Label printer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrinterConfig {
    /// Printer type: "tcp", "device" or "log"
    #[serde(default = "default_printer_backend")]
    pub backend: String,

    #[serde(default)]
    pub tcp: Option<TcpPrinterConfig>,

    #[serde(default)]
    pub device: Option<DevicePrinterConfig>,

    #[serde(default = "default_width_dots")]
    pub width_dots: u32,

    #[serde(default = "default_length_dots")]
    pub length_dots: u32,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            backend: default_printer_backend(),
            tcp: None,
            device: None,
            width_dots: default_width_dots(),
            length_dots: default_length_dots(),
        }
    }
}

/// Network label printer accepting raw ZPL (usually port 9100)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TcpPrinterConfig {
    pub address: String,
    #[serde(default = "default_printer_timeout")]
    pub timeout_ms: u64,
}

/// Locally attached printer exposed as a raw device or spool file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DevicePrinterConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_format")]
    pub format: String, // "csv", "json"

    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: default_report_format(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"

    #[serde(default = "default_log_format")]
    pub format: String, // "text", "json"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 9600 }
fn default_read_timeout() -> u64 { 1000 }
fn default_reopen_delay() -> u64 { 2000 }
fn default_ledger_backend() -> String { "csv".to_string() }
fn default_product_type() -> String { crate::record::DEFAULT_PRODUCT_TYPE.to_string() }
fn default_true() -> bool { true }
fn default_printer_backend() -> String { "log".to_string() }
fn default_printer_timeout() -> u64 { 5000 }
fn default_width_dots() -> u32 { 800 }
fn default_length_dots() -> u32 { 600 }
fn default_report_format() -> String { "csv".to_string() }
fn default_output_dir() -> String { ".".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "text".to_string() }
