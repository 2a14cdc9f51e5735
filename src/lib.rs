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

// Scale Recorder
//
// Records readings from a serial-attached scale into a durable ledger:
// - Parses "Gross" lines from a line-oriented serial stream
// - Stamps each reading with a random bag id and a batch of up to 22 bags
// - Appends to a CSV ledger and prints a ZPL label per bag
// - Reweighs mislabeled bags by rewriting the ledger atomically
// - Looks up bags by id and exports the ledger as a report

pub mod amend;
pub mod batch;
pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod ingest;
pub mod label;
pub mod ledger;
pub mod parser;
pub mod query;
pub mod record;
pub mod report;
pub mod station;
pub mod transport;

// Re-export main types
pub use amend::{ReweighOutcome, Reweigher};
pub use batch::{BatchPosition, BatchTracker, BATCH_CAPACITY};
pub use command::OperatorCommand;
pub use config::{load_config, load_config_with_env, RecorderConfig};
pub use console::Console;
pub use error::{ParseError, Result, SinkError, StationError, TransportError};
pub use ingest::{IngestSettings, IngestSummary, Ingestor, StopReason};
pub use label::{LabelPrinterFactory, LabelSink};
pub use ledger::{CsvLedger, LedgerFactory, MemoryLedger, RecordStore};
pub use parser::{classify_line, extract_weight, LineKind};
pub use query::QueryService;
pub use record::{BagId, WeighRecord};
pub use report::{create_report_sink, ReportSink};
pub use station::Station;
pub use transport::{open_serial, LineRead, LineSource, LineTransport, SerialTransport};

pub use tokio_util::sync::CancellationToken;
