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

// Label sink module
//
// Every accepted reading is forwarded to a label printer as a ZPL II
// document carrying the weight and the bag id. Printing is best effort:
// a failed label never undoes the ledger entry.

pub mod factory;
pub mod printer;
pub mod zpl;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::record::BagId;

pub use factory::LabelPrinterFactory;
pub use printer::{DeviceLabelPrinter, LogLabelPrinter, TcpLabelPrinter};
pub use zpl::LabelLayout;

#[async_trait]
pub trait LabelSink: Send + Sync {
    async fn print_label(&self, weight: f64, bag_id: &BagId) -> Result<(), SinkError>;

    /// Get printer type identifier
    fn sink_type(&self) -> &str;
}
