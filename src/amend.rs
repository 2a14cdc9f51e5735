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

// Amendment (reweigh) of an existing bag
//
// Used when a bag was mislabeled or broke: the operator names the bag, the
// next valid reading from the scale replaces its weight and timestamp, and
// the whole ledger is written back.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::ledger::RecordStore;
use crate::parser::{classify_line, LineKind};
use crate::record::{capture_time, BagId, WeighRecord};
use crate::transport::{LineRead, LineSource};

#[derive(Debug, Clone, PartialEq)]
pub enum ReweighOutcome {
    Updated {
        previous: WeighRecord,
        current: WeighRecord,
    },
    /// A reading arrived but no record carries the bag id. The ledger was
    /// still rewritten, unchanged.
    NotFound { bag_id: BagId, weight: f64 },
    /// The operator gave up before a reading arrived
    Cancelled,
}

pub struct Reweigher {
    store: Arc<dyn RecordStore>,
}

impl Reweigher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Wait for one valid "Gross" reading on `source` and apply it to `bag_id`.
    /// The source is closed before returning.
    pub async fn reweigh<S: LineSource>(
        &self,
        mut source: S,
        bag_id: &BagId,
        cancel: &CancellationToken,
    ) -> Result<ReweighOutcome> {
        let outcome = self.reweigh_from(&mut source, bag_id, cancel).await;
        source.close().await;
        outcome
    }

    async fn reweigh_from<S: LineSource>(
        &self,
        source: &mut S,
        bag_id: &BagId,
        cancel: &CancellationToken,
    ) -> Result<ReweighOutcome> {
        info!("Waiting for a new reading for bag {}", bag_id);

        let weight = loop {
            if cancel.is_cancelled() {
                info!("Reweigh of bag {} cancelled", bag_id);
                return Ok(ReweighOutcome::Cancelled);
            }
            let line = match source.read_line().await? {
                LineRead::Line(line) => line,
                LineRead::Timeout => continue,
            };
            match classify_line(&line) {
                LineKind::Weight(weight) => break weight,
                LineKind::Rejected(e) => warn!("Skipping reading: {}", e),
                LineKind::Sentinel | LineKind::Chatter => debug!("Ignoring line {:?}", line),
            }
        };

        self.apply(bag_id, weight).await
    }

    /// Relocate `weight` onto the first record carrying `bag_id` and persist
    /// the full ledger. Every other record is written back untouched.
    pub async fn apply(&self, bag_id: &BagId, weight: f64) -> Result<ReweighOutcome> {
        let mut records = self.store.load_all().await?;

        let previous = records
            .iter_mut()
            .find(|r| &r.bag_id == bag_id)
            .map(|record| {
                let previous = record.clone();
                record.gross_weight = weight;
                record.timestamp = capture_time();
                (previous, record.clone())
            });

        self.store.replace_all(&records).await?;

        match previous {
            Some((previous, current)) => {
                info!(
                    "Bag ID {} reweighed successfully: New weight {} kg at {}",
                    bag_id, current.gross_weight, current.timestamp
                );
                Ok(ReweighOutcome::Updated { previous, current })
            }
            None => {
                warn!("No record with bag id {}; ledger left unchanged", bag_id);
                Ok(ReweighOutcome::NotFound {
                    bag_id: bag_id.clone(),
                    weight,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::record::parse_timestamp;

    fn ledger() -> Vec<WeighRecord> {
        let ts = parse_timestamp("2024-02-02 08:00:00").unwrap();
        vec![
            WeighRecord::new(BagId::parse("123456").unwrap(), 10.0, ts, 1, "Product"),
            WeighRecord::new(BagId::parse("654321").unwrap(), 11.0, ts, 1, "Product"),
        ]
    }

    #[tokio::test]
    async fn test_apply_updates_only_target() {
        let store = Arc::new(MemoryLedger::with_records(ledger()));
        let reweigher = Reweigher::new(store.clone());

        let outcome = reweigher
            .apply(&BagId::parse("654321").unwrap(), 12.5)
            .await
            .unwrap();

        match outcome {
            ReweighOutcome::Updated { previous, current } => {
                assert_eq!(previous.gross_weight, 11.0);
                assert_eq!(current.gross_weight, 12.5);
                assert_eq!(current.batch_number, previous.batch_number);
                assert_ne!(current.timestamp, previous.timestamp);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let records = store.load_all().await.unwrap();
        assert_eq!(records[0], ledger()[0]);
        assert_eq!(records[1].gross_weight, 12.5);
    }

    #[tokio::test]
    async fn test_apply_unknown_id_is_reported() {
        let store = Arc::new(MemoryLedger::with_records(ledger()));
        let reweigher = Reweigher::new(store.clone());

        let outcome = reweigher
            .apply(&BagId::parse("999999").unwrap(), 3.0)
            .await
            .unwrap();

        assert!(matches!(outcome, ReweighOutcome::NotFound { weight, .. } if weight == 3.0));
        assert_eq!(store.load_all().await.unwrap(), ledger());
    }
}
