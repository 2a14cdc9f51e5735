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

// Ingestion loop
//
// Reads the scale line by line, stamps every accepted reading with a fresh
// bag id and the current batch, appends it to the ledger and forwards it to
// the label printer.
//
// Per line:
//   WAITING_FOR_LINE -> PARSED_ACCEPT  (append, print label, back to waiting)
//                    -> PARSED_REJECT  (log, back to waiting)
//                    -> SENTINEL       (terminate)
//                    -> ERROR          (terminate with the transport/store error)

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::batch::{BatchPosition, BatchTracker, BATCH_CAPACITY};
use crate::config::StationSettings;
use crate::error::{Result, StationError};
use crate::label::LabelSink;
use crate::ledger::RecordStore;
use crate::parser::{classify_line, LineKind};
use crate::record::{capture_time, BagId, WeighRecord};
use crate::transport::{LineRead, LineSource};

#[derive(Debug, Clone)]
pub struct IngestSettings {
    pub product_type: String,
    pub stop_when_batch_full: bool,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self::from(&StationSettings::default())
    }
}

impl From<&StationSettings> for IngestSettings {
    fn from(settings: &StationSettings) -> Self {
        Self {
            product_type: settings.product_type.clone(),
            stop_when_batch_full: settings.stop_when_batch_full,
        }
    }
}

/// Why a run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The batch open at start reached `BATCH_CAPACITY`
    BatchFull,
    /// The exit sentinel arrived on the line
    Sentinel,
    /// The cancellation token fired
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub run_id: Uuid,
    /// Batch and fill level when the run started
    pub start: BatchPosition,
    /// Where the next reading would go
    pub next: BatchPosition,
    /// Records appended during this run, in order
    pub recorded: Vec<WeighRecord>,
    /// "Gross" lines without a usable number
    pub rejected: usize,
    pub label_failures: usize,
    pub stop: StopReason,
}

pub struct Ingestor {
    store: Arc<dyn RecordStore>,
    labels: Arc<dyn LabelSink>,
    settings: IngestSettings,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn RecordStore>,
        labels: Arc<dyn LabelSink>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            store,
            labels,
            settings,
        }
    }

    /// Consume `source` until the batch fills, the sentinel arrives, `cancel`
    /// fires or the transport fails. The source is closed before returning
    /// on every one of those paths.
    pub async fn run<S: LineSource>(
        &self,
        mut source: S,
        cancel: &CancellationToken,
    ) -> Result<IngestSummary> {
        let run_id = Uuid::new_v4();
        let span = info_span!("ingest", %run_id, port = %source.name());

        async move {
            let outcome = self.consume(&mut source, cancel, run_id).await;
            source.close().await;
            if let Err(e) = &outcome {
                warn!("Ingestion aborted: {}", e);
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn consume<S: LineSource>(
        &self,
        source: &mut S,
        cancel: &CancellationToken,
        run_id: Uuid,
    ) -> Result<IngestSummary> {
        // Derived once from the ledger, then tracked locally for the run
        let start = BatchTracker::new(self.store.clone()).position().await?;
        let mut batch = start.batch;
        let mut filled = start.filled;
        let mut recorded = Vec::new();
        let mut rejected = 0;
        let mut label_failures = 0;

        info!(
            "Ingesting into batch {} ({}/{} filled). Send '0' to return to the menu",
            batch, filled, BATCH_CAPACITY
        );

        let stop = loop {
            if cancel.is_cancelled() {
                info!("Ingestion cancelled by operator");
                break StopReason::Cancelled;
            }

            let line = match source.read_line().await? {
                LineRead::Line(line) => line,
                LineRead::Timeout => continue,
            };

            match classify_line(&line) {
                LineKind::Chatter => debug!("Ignoring line {:?}", line),
                LineKind::Sentinel => {
                    info!("Exit requested on the line");
                    break StopReason::Sentinel;
                }
                LineKind::Rejected(e) => {
                    warn!("Skipping reading: {}", e);
                    rejected += 1;
                }
                LineKind::Weight(weight) => {
                    let record = WeighRecord::new(
                        BagId::random(),
                        weight,
                        capture_time(),
                        batch,
                        self.settings.product_type.clone(),
                    );
                    self.store.append(&record).await?;
                    filled += 1;

                    info!(
                        "Batch: {}  Weight: {}  BagID: {}  Date and time: {}  Entries in current batch: {}",
                        record.batch_number, record.gross_weight, record.bag_id, record.timestamp, filled
                    );

                    if let Err(e) = self.labels.print_label(weight, &record.bag_id).await {
                        warn!("Label for bag {} not printed: {}", record.bag_id, e);
                        label_failures += 1;
                    }
                    recorded.push(record);

                    if filled >= BATCH_CAPACITY {
                        info!("Batch {} complete", batch);
                        batch = match batch.checked_add(1) {
                            Some(next) => next,
                            None => return Err(self.batch_overflow().await),
                        };
                        filled = 0;
                        if self.settings.stop_when_batch_full {
                            break StopReason::BatchFull;
                        }
                    }
                }
            }
        };

        Ok(IngestSummary {
            run_id,
            start,
            next: BatchPosition { batch, filled },
            recorded,
            rejected,
            label_failures,
            stop,
        })
    }

    /// Error for a full batch that already carries the largest batch number
    async fn batch_overflow(&self) -> StationError {
        match self.store.load_all().await {
            Ok(records) => StationError::store_format(
                self.store.location(),
                records.len(),
                "batch number overflows past the last full batch",
            ),
            Err(e) => e,
        }
    }
}
