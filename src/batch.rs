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

// Batch tracking
//
// Batch state is never persisted on its own. It is derived from the ledger
// on every call, so it cannot drift from what was actually recorded.

use std::sync::Arc;

use crate::error::{Result, StationError};
use crate::ledger::RecordStore;
use crate::record::WeighRecord;

/// Maximum number of bags grouped under one batch number
pub const BATCH_CAPACITY: usize = 22;

/// Batch to ingest into next, and how many records it already holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPosition {
    pub batch: u32,
    pub filled: usize,
}

impl BatchPosition {
    pub fn remaining(&self) -> usize {
        BATCH_CAPACITY.saturating_sub(self.filled)
    }
}

/// Number of records carrying batch number `batch`
pub fn count_in(records: &[WeighRecord], batch: u32) -> usize {
    records.iter().filter(|r| r.batch_number == batch).count()
}

/// Batch the next reading belongs to.
///
/// Empty ledger starts at 1. Otherwise the batch of the last appended record
/// is reused until it holds `BATCH_CAPACITY` records. `None` when the last
/// batch is full and already carries the largest batch number.
pub fn next_batch(records: &[WeighRecord]) -> Option<u32> {
    match records.last() {
        None => Some(1),
        Some(last) if count_in(records, last.batch_number) >= BATCH_CAPACITY => {
            last.batch_number.checked_add(1)
        }
        Some(last) => Some(last.batch_number),
    }
}

pub fn position(records: &[WeighRecord]) -> Option<BatchPosition> {
    let batch = next_batch(records)?;
    Some(BatchPosition {
        batch,
        filled: count_in(records, batch),
    })
}

/// Ledger-backed view of the batch state
pub struct BatchTracker {
    store: Arc<dyn RecordStore>,
}

impl BatchTracker {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn current_batch(&self) -> Result<u32> {
        Ok(self.position().await?.batch)
    }

    pub async fn count_in_batch(&self, batch: u32) -> Result<usize> {
        let records = self.store.load_all().await?;
        Ok(count_in(&records, batch))
    }

    /// Current batch and its fill level from a single ledger scan
    pub async fn position(&self) -> Result<BatchPosition> {
        let records = self.store.load_all().await?;
        position(&records).ok_or_else(|| {
            StationError::store_format(
                self.store.location(),
                records.len(),
                "batch number overflows past the last full batch",
            )
        })
    }
}
