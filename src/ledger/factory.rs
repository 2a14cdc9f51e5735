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

// Ledger factory for creating record stores from configuration

use super::csv_file::CsvLedger;
use super::memory::MemoryLedger;
use super::store::RecordStore;
use crate::config::LedgerConfig;
use anyhow::{bail, Result};
use std::sync::Arc;

pub struct LedgerFactory;

impl LedgerFactory {
    /// Create record store from configuration
    pub fn create(config: &LedgerConfig) -> Result<Arc<dyn RecordStore>> {
        match config.backend.as_str() {
            "csv" => {
                let csv_config = config
                    .as_csv()
                    .ok_or_else(|| anyhow::anyhow!("CSV ledger config missing"))?;

                Ok(Arc::new(CsvLedger::new(csv_config.clone())))
            }

            "memory" => Ok(Arc::new(MemoryLedger::new())),

            unknown => bail!(
                "Unknown ledger backend: '{}'. Supported: csv, memory",
                unknown
            ),
        }
    }
}
