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

// CSV file ledger implementation

use super::store::RecordStore;
use crate::config::CsvLedgerConfig;
use crate::error::{Result, StationError};
use crate::record::WeighRecord;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Column names of the persisted ledger, in field order
pub const LEDGER_HEADER: [&str; 5] = [
    "BagID",
    "GrossWeight",
    "DateAndTime",
    "BatchNumb",
    "ProductType",
];

/// Ledger stored as a comma-separated file with a header row
///
/// Appends go straight to the end of the file. Full rewrites stream into a
/// hidden sibling temp file which is synced and then renamed over the
/// ledger, so readers only ever see the old or the new image.
pub struct CsvLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvLedger {
    pub fn new(config: CsvLedgerConfig) -> Self {
        Self::at(PathBuf::from(config.path))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Using CSV ledger at: {}", path.display());
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Staging file used by `replace_all`
    pub fn temp_path(&self) -> PathBuf {
        let filename = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ledger.csv".to_string());
        self.path.with_file_name(format!(".{}.tmp", filename))
    }

    fn io_error(&self, source: io::Error) -> StationError {
        StationError::store_io(self.location(), source)
    }

    async fn ensure_parent_directory(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating ledger directory: {}", parent.display());
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }
        Ok(())
    }

    /// What has to precede a new row at the end of the ledger
    async fn tail(&self) -> Result<Tail> {
        let len = match fs::metadata(&self.path).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Tail::Missing),
            Err(e) => return Err(self.io_error(e)),
        };
        if len == 0 {
            return Ok(Tail::Empty);
        }

        let mut file = fs::File::open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.seek(io::SeekFrom::End(-1))
            .await
            .map_err(|e| self.io_error(e))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)
            .await
            .map_err(|e| self.io_error(e))?;

        if last[0] == b'\n' {
            Ok(Tail::Terminated)
        } else {
            Ok(Tail::Unterminated)
        }
    }

    /// Make a rename or file creation in the ledger directory durable
    async fn sync_directory(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        sync_dir(dir).await.map_err(|e| self.io_error(e))
    }

    async fn write_temp(&self, temp_path: &Path, records: &[WeighRecord]) -> Result<()> {
        let mut file = fs::File::create(temp_path)
            .await
            .map_err(|e| self.io_error(e))?;

        file.write_all(&encode_header().map_err(|e| self.io_error(e))?)
            .await
            .map_err(|e| self.io_error(e))?;

        for record in records {
            let row = encode_row(record).map_err(|e| self.io_error(e))?;
            file.write_all(&row).await.map_err(|e| self.io_error(e))?;
        }

        file.flush().await.map_err(|e| self.io_error(e))?;
        file.sync_all().await.map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

/// State of the ledger file's last line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tail {
    Missing,
    Empty,
    Terminated,
    /// Torn or hand-edited last row without a line terminator
    Unterminated,
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir).await?.sync_all().await
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

fn encode_header() -> io::Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(LEDGER_HEADER)?;
    writer.into_inner().map_err(|e| e.into_error())
}

/// Encode one record as a CSV line, rejecting rows that break the ledger invariants
fn encode_row(record: &WeighRecord) -> io::Result<Vec<u8>> {
    record
        .validate()
        .map_err(|reason| io::Error::new(io::ErrorKind::InvalidInput, reason))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.serialize(record)?;
    writer.into_inner().map_err(|e| e.into_error())
}

/// Decode a full ledger image. Row numbers in errors count data rows from 1.
pub(crate) fn decode_ledger(bytes: &[u8], location: &str) -> Result<Vec<WeighRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<WeighRecord>().enumerate() {
        let row_number = idx + 1;
        let record =
            row.map_err(|e| StationError::store_format(location, row_number, e.to_string()))?;
        record
            .validate()
            .map_err(|reason| StationError::store_format(location, row_number, reason))?;
        records.push(record);
    }
    Ok(records)
}

#[async_trait]
impl RecordStore for CsvLedger {
    async fn initialize(&self) -> Result<()> {
        self.ensure_parent_directory().await?;
        if matches!(self.tail().await?, Tail::Missing | Tail::Empty) {
            info!("Creating ledger with header: {}", self.path.display());
            self.replace_all(&[]).await?;
        } else {
            info!("Ledger already exists: {}", self.path.display());
        }
        Ok(())
    }

    async fn append(&self, record: &WeighRecord) -> Result<()> {
        let row = encode_row(record).map_err(|e| self.io_error(e))?;

        let _guard = self.write_lock.lock().await;
        let tail = self.tail().await?;
        let mut bytes = Vec::with_capacity(row.len() + 64);
        match tail {
            Tail::Missing | Tail::Empty => {
                self.ensure_parent_directory().await?;
                bytes.extend(encode_header().map_err(|e| self.io_error(e))?);
            }
            Tail::Unterminated => {
                warn!(
                    "Ledger {} does not end with a line break; terminating last row",
                    self.path.display()
                );
                bytes.push(b'\n');
            }
            Tail::Terminated => {}
        }
        bytes.extend(row);

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(&bytes).await.map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;
        file.sync_data().await.map_err(|e| self.io_error(e))?;
        if tail == Tail::Missing {
            self.sync_directory().await?;
        }

        debug!(
            "Appended bag {} (batch {}) to {}",
            record.bag_id,
            record.batch_number,
            self.path.display()
        );
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<WeighRecord>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        decode_ledger(&bytes, &self.location())
    }

    async fn replace_all(&self, records: &[WeighRecord]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let temp_path = self.temp_path();

        if let Err(e) = self.write_temp(&temp_path, records).await {
            if fs::remove_file(&temp_path).await.is_ok() {
                warn!("Discarded partial ledger image: {}", temp_path.display());
            }
            return Err(e);
        }

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        self.sync_directory().await?;

        debug!(
            "Rewrote ledger {} with {} records",
            self.path.display(),
            records.len()
        );
        Ok(())
    }

    fn backend_type(&self) -> &str {
        "csv"
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
