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

// Record store trait for the weighing ledger

use async_trait::async_trait;

use crate::error::Result;
use crate::record::{BagId, WeighRecord};

/// Durable, ordered ledger of weighing records
///
/// Implementations must make every successful mutating call durable before
/// returning, and `replace_all` must swap the full ledger atomically.
///
/// `load_all` followed by `replace_all` is not a transaction. Callers run one
/// operation at a time; a store that admits concurrent writers has to offer
/// the read-modify-write as a single locked call instead.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Prepare the backing medium (create the ledger if missing)
    async fn initialize(&self) -> Result<()>;

    /// Append one record at the end of the ledger
    async fn append(&self, record: &WeighRecord) -> Result<()>;

    /// All records in creation order
    async fn load_all(&self) -> Result<Vec<WeighRecord>>;

    /// First record carrying `bag_id`, in storage order
    ///
    /// Bag ids are not guaranteed unique, so a collision resolves to the
    /// earliest entry.
    async fn find_by_id(&self, bag_id: &BagId) -> Result<Option<WeighRecord>> {
        let records = self.load_all().await?;
        Ok(records.into_iter().find(|r| &r.bag_id == bag_id))
    }

    /// Atomically overwrite the whole ledger with `records`
    async fn replace_all(&self, records: &[WeighRecord]) -> Result<()>;

    /// Get backend type identifier
    fn backend_type(&self) -> &str;

    /// Human-readable location used in diagnostics
    fn location(&self) -> String;
}
