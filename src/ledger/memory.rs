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

// In-memory ledger, used for dry runs and tests

use super::store::RecordStore;
use crate::error::{Result, StationError};
use crate::record::WeighRecord;
use async_trait::async_trait;
use std::io;
use tokio::sync::RwLock;

/// Volatile ledger held in process memory
#[derive(Default)]
pub struct MemoryLedger {
    records: RwLock<Vec<WeighRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<WeighRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    fn check(&self, record: &WeighRecord) -> Result<()> {
        record.validate().map_err(|reason| {
            StationError::store_io(
                self.location(),
                io::Error::new(io::ErrorKind::InvalidInput, reason),
            )
        })
    }
}

#[async_trait]
impl RecordStore for MemoryLedger {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn append(&self, record: &WeighRecord) -> Result<()> {
        self.check(record)?;
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<WeighRecord>> {
        Ok(self.records.read().await.clone())
    }

    async fn replace_all(&self, records: &[WeighRecord]) -> Result<()> {
        for record in records {
            self.check(record)?;
        }
        *self.records.write().await = records.to_vec();
        Ok(())
    }

    fn backend_type(&self) -> &str {
        "memory"
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
