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

// Weighing station
//
// Wires the ledger, label printer and report writer built from
// configuration, and opens a fresh serial transport for every operation
// that reads from the scale. Only one operation runs at a time.

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::amend::{ReweighOutcome, Reweigher};
use crate::batch::{BatchPosition, BatchTracker};
use crate::config::RecorderConfig;
use crate::error::Result;
use crate::ingest::{IngestSettings, IngestSummary, Ingestor};
use crate::label::{LabelPrinterFactory, LabelSink};
use crate::ledger::{LedgerFactory, RecordStore};
use crate::query::QueryService;
use crate::record::{BagId, WeighRecord};
use crate::report::{create_report_sink, ReportSink};
use crate::transport::{open_serial, LineSource, SerialTransport};

pub struct Station {
    config: RecorderConfig,
    store: Arc<dyn RecordStore>,
    labels: Arc<dyn LabelSink>,
    reports: Arc<dyn ReportSink>,
}

impl Station {
    pub fn new(
        config: RecorderConfig,
        store: Arc<dyn RecordStore>,
        labels: Arc<dyn LabelSink>,
        reports: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            config,
            store,
            labels,
            reports,
        }
    }

    /// Build every collaborator from configuration and prepare the ledger
    pub async fn from_config(config: RecorderConfig) -> anyhow::Result<Self> {
        let store = LedgerFactory::create(&config.ledger)?;
        store
            .initialize()
            .await
            .context("Failed to initialize ledger")?;
        info!(
            "Ledger backend initialized: {} ({})",
            store.backend_type(),
            store.location()
        );

        let labels = LabelPrinterFactory::create(&config.printer)?;
        info!("Label printer: {}", labels.sink_type());

        let reports = create_report_sink(&config.report)?;
        info!(
            "Reports: {} in {}",
            reports.format(),
            config.report.output_dir
        );

        Ok(Self::new(config, store, labels, reports))
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    /// Pause observed after a port is closed before it is reused
    pub fn reopen_delay(&self) -> Duration {
        self.config.serial.reopen_delay()
    }

    pub fn open_transport(&self) -> Result<SerialTransport> {
        Ok(open_serial(&self.config.serial)?)
    }

    pub fn ingestor(&self) -> Ingestor {
        Ingestor::new(
            self.store.clone(),
            self.labels.clone(),
            IngestSettings::from(&self.config.station),
        )
    }

    pub fn reweigher(&self) -> Reweigher {
        Reweigher::new(self.store.clone())
    }

    pub fn query(&self) -> QueryService {
        QueryService::new(self.store.clone())
    }

    /// Ingest from the configured serial port
    pub async fn ingest(&self, cancel: &CancellationToken) -> Result<IngestSummary> {
        let transport = self.open_transport()?;
        self.ingest_from(transport, cancel).await
    }

    pub async fn ingest_from<S: LineSource>(
        &self,
        source: S,
        cancel: &CancellationToken,
    ) -> Result<IngestSummary> {
        self.ingestor().run(source, cancel).await
    }

    /// Reweigh a bag using the next reading from the configured serial port
    pub async fn reweigh(
        &self,
        bag_id: &BagId,
        cancel: &CancellationToken,
    ) -> Result<ReweighOutcome> {
        let transport = self.open_transport()?;
        self.reweigh_from(transport, bag_id, cancel).await
    }

    pub async fn reweigh_from<S: LineSource>(
        &self,
        source: S,
        bag_id: &BagId,
        cancel: &CancellationToken,
    ) -> Result<ReweighOutcome> {
        self.reweigher().reweigh(source, bag_id, cancel).await
    }

    pub async fn details(&self, bag_id: &BagId) -> Result<Option<WeighRecord>> {
        self.query().get_details(bag_id).await
    }

    pub async fn batch_position(&self) -> Result<BatchPosition> {
        BatchTracker::new(self.store.clone()).position().await
    }

    /// Export a snapshot of the full ledger
    pub async fn export_report(&self) -> Result<PathBuf> {
        let records = self.store.load_all().await?;
        info!("Exporting {} records", records.len());
        Ok(self.reports.export(&records).await?)
    }
}
