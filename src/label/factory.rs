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

// Label printer factory

use super::printer::{DeviceLabelPrinter, LogLabelPrinter, TcpLabelPrinter};
use super::zpl::LabelLayout;
use super::LabelSink;
use crate::config::PrinterConfig;
use anyhow::{bail, Result};
use std::sync::Arc;

pub struct LabelPrinterFactory;

impl LabelPrinterFactory {
    /// Create label printer from configuration
    pub fn create(config: &PrinterConfig) -> Result<Arc<dyn LabelSink>> {
        let layout = LabelLayout::from(config);

        match config.backend.as_str() {
            "tcp" => {
                let tcp = config
                    .tcp
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("TCP printer config missing"))?;
                Ok(Arc::new(TcpLabelPrinter::new(tcp, layout)))
            }

            "device" => {
                let device = config
                    .device
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("Device printer config missing"))?;
                Ok(Arc::new(DeviceLabelPrinter::new(device, layout)))
            }

            "log" => Ok(Arc::new(LogLabelPrinter::new(layout))),

            unknown => bail!(
                "Unknown printer backend: '{}'. Supported: tcp, device, log",
                unknown
            ),
        }
    }
}
