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

// Report export
//
// A report is a snapshot of the whole ledger written to a timestamped file
// in the configured output directory. Unlike label printing, a failed
// export is reported back to the operator.

use anyhow::bail;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::info;

use crate::config::ReportConfig;
use crate::error::SinkError;
use crate::ledger::LEDGER_HEADER;
use crate::record::{capture_time, WeighRecord};

#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Write `records` (in ledger order) and return the artifact path
    async fn export(&self, records: &[WeighRecord]) -> Result<PathBuf, SinkError>;

    fn format(&self) -> &str;
}

/// `report_YYYY-MM-DD_HH-MM-SS.<extension>`
pub fn report_filename(at: NaiveDateTime, extension: &str) -> String {
    format!("report_{}.{}", at.format("%Y-%m-%d_%H-%M-%S"), extension)
}

async fn write_report(
    output_dir: &Path,
    extension: &str,
    body: Vec<u8>,
) -> Result<PathBuf, SinkError> {
    let path = output_dir.join(report_filename(capture_time(), extension));
    let report_error = |reason: String| SinkError::Report {
        path: path.clone(),
        reason,
    };

    fs::create_dir_all(output_dir)
        .await
        .map_err(|e| report_error(e.to_string()))?;
    fs::write(&path, body)
        .await
        .map_err(|e| report_error(e.to_string()))?;

    info!("Report saved to {}", path.display());
    Ok(path)
}

/// Tabular report with the ledger columns
pub struct CsvReport {
    output_dir: PathBuf,
}

impl CsvReport {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn encode(records: &[WeighRecord]) -> Result<Vec<u8>, csv::Error> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(LEDGER_HEADER)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.into_inner().map_err(|e| e.into_error().into())
    }
}

#[async_trait]
impl ReportSink for CsvReport {
    async fn export(&self, records: &[WeighRecord]) -> Result<PathBuf, SinkError> {
        let body = Self::encode(records).map_err(|e| SinkError::Report {
            path: self.output_dir.clone(),
            reason: e.to_string(),
        })?;
        write_report(&self.output_dir, "csv", body).await
    }

    fn format(&self) -> &str {
        "csv"
    }
}

/// Report as a JSON array of ledger rows
pub struct JsonReport {
    output_dir: PathBuf,
}

impl JsonReport {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl ReportSink for JsonReport {
    async fn export(&self, records: &[WeighRecord]) -> Result<PathBuf, SinkError> {
        let body = serde_json::to_vec_pretty(records).map_err(|e| SinkError::Report {
            path: self.output_dir.clone(),
            reason: e.to_string(),
        })?;
        write_report(&self.output_dir, "json", body).await
    }

    fn format(&self) -> &str {
        "json"
    }
}

/// Create report sink from configuration
pub fn create_report_sink(config: &ReportConfig) -> anyhow::Result<Arc<dyn ReportSink>> {
    match config.format.as_str() {
        "csv" => Ok(Arc::new(CsvReport::new(&config.output_dir))),
        "json" => Ok(Arc::new(JsonReport::new(&config.output_dir))),
        unknown => bail!("Unknown report format: '{}'. Supported: csv, json", unknown),
    }
}
