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

// Point lookups against the ledger

use std::sync::Arc;

use crate::error::Result;
use crate::ledger::RecordStore;
use crate::record::{BagId, WeighRecord};

pub struct QueryService {
    store: Arc<dyn RecordStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// First record carrying `bag_id`, or `None`. Read-only.
    pub async fn get_details(&self, bag_id: &BagId) -> Result<Option<WeighRecord>> {
        self.store.find_by_id(bag_id).await
    }

    /// All records of one batch, in ledger order
    pub async fn batch_records(&self, batch: u32) -> Result<Vec<WeighRecord>> {
        let records = self.store.load_all().await?;
        Ok(records
            .into_iter()
            .filter(|r| r.batch_number == batch)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::record::capture_time;

    #[tokio::test]
    async fn test_lookups() {
        let ts = capture_time();
        let store = Arc::new(MemoryLedger::with_records(vec![
            WeighRecord::new(BagId::parse("1").unwrap(), 1.0, ts, 1, "Product"),
            WeighRecord::new(BagId::parse("2").unwrap(), 2.0, ts, 2, "Product"),
            WeighRecord::new(BagId::parse("3").unwrap(), 3.0, ts, 2, "Product"),
        ]));
        let query = QueryService::new(store);

        let found = query.get_details(&BagId::parse("2").unwrap()).await.unwrap();
        assert_eq!(found.map(|r| r.gross_weight), Some(2.0));
        assert!(query
            .get_details(&BagId::parse("4").unwrap())
            .await
            .unwrap()
            .is_none());
        assert_eq!(query.batch_records(2).await.unwrap().len(), 2);
    }
}
