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

// Label printer implementations

use super::zpl::LabelLayout;
use super::LabelSink;
use crate::config::{DevicePrinterConfig, TcpPrinterConfig};
use crate::error::SinkError;
use crate::record::BagId;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Network printer accepting raw ZPL on a TCP socket
pub struct TcpLabelPrinter {
    address: String,
    timeout: Duration,
    layout: LabelLayout,
}

impl TcpLabelPrinter {
    pub fn new(config: TcpPrinterConfig, layout: LabelLayout) -> Self {
        info!("Using network label printer at {}", config.address);
        Self {
            address: config.address,
            timeout: Duration::from_millis(config.timeout_ms),
            layout,
        }
    }

    async fn send(&self, payload: &[u8]) -> std::io::Result<()> {
        let mut stream = TcpStream::connect(&self.address).await?;
        stream.write_all(payload).await?;
        stream.flush().await?;
        stream.shutdown().await
    }
}

#[async_trait]
impl LabelSink for TcpLabelPrinter {
    async fn print_label(&self, weight: f64, bag_id: &BagId) -> Result<(), SinkError> {
        let zpl = self.layout.render(weight, bag_id);

        match tokio::time::timeout(self.timeout, self.send(zpl.as_bytes())).await {
            Ok(Ok(())) => {
                debug!("Label for bag {} sent to {}", bag_id, self.address);
                Ok(())
            }
            Ok(Err(source)) => Err(SinkError::Label {
                target: self.address.clone(),
                source,
            }),
            Err(_) => Err(SinkError::LabelTimeout {
                target: self.address.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    fn sink_type(&self) -> &str {
        "tcp"
    }
}

/// Printer exposed as a raw device node (e.g. /dev/usb/lp0) or a spool file
pub struct DeviceLabelPrinter {
    path: PathBuf,
    layout: LabelLayout,
}

impl DeviceLabelPrinter {
    pub fn new(config: DevicePrinterConfig, layout: LabelLayout) -> Self {
        info!("Using label printer device {}", config.path);
        Self {
            path: PathBuf::from(config.path),
            layout,
        }
    }
}

#[async_trait]
impl LabelSink for DeviceLabelPrinter {
    async fn print_label(&self, weight: f64, bag_id: &BagId) -> Result<(), SinkError> {
        let zpl = self.layout.render(weight, bag_id);
        let label_error = |source: std::io::Error| SinkError::Label {
            target: self.path.display().to_string(),
            source,
        };

        let mut device = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(label_error)?;
        device
            .write_all(zpl.as_bytes())
            .await
            .map_err(label_error)?;
        device.flush().await.map_err(label_error)?;

        debug!("Label for bag {} written to {}", bag_id, self.path.display());
        Ok(())
    }

    fn sink_type(&self) -> &str {
        "device"
    }
}

/// Printer stand-in that only logs the rendered label
pub struct LogLabelPrinter {
    layout: LabelLayout,
}

impl LogLabelPrinter {
    pub fn new(layout: LabelLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl LabelSink for LogLabelPrinter {
    async fn print_label(&self, weight: f64, bag_id: &BagId) -> Result<(), SinkError> {
        let zpl = self.layout.render(weight, bag_id);
        info!("Label for bag {} ({} kg)", bag_id, weight);
        debug!("{}", zpl);
        Ok(())
    }

    fn sink_type(&self) -> &str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_device_printer_appends_labels() {
        let temp_dir = TempDir::new().unwrap();
        let spool = temp_dir.path().join("labels.zpl");
        let printer = DeviceLabelPrinter::new(
            DevicePrinterConfig {
                path: spool.to_string_lossy().to_string(),
            },
            LabelLayout::default(),
        );

        printer
            .print_label(10.5, &BagId::parse("111111").unwrap())
            .await
            .unwrap();
        printer
            .print_label(11.5, &BagId::parse("222222").unwrap())
            .await
            .unwrap();

        let content = std::fs::read_to_string(&spool).unwrap();
        assert_eq!(content.matches("^XA").count(), 2);
        assert!(content.contains("^FDBagID: 222222^FS"));
    }

    #[tokio::test]
    async fn test_device_printer_missing_directory_fails() {
        let printer = DeviceLabelPrinter::new(
            DevicePrinterConfig {
                path: "/nonexistent-dir/printer/lp0".to_string(),
            },
            LabelLayout::default(),
        );

        let result = printer.print_label(1.0, &BagId::parse("1").unwrap()).await;
        assert!(matches!(result, Err(SinkError::Label { .. })));
    }

    #[tokio::test]
    async fn test_tcp_printer_sends_zpl() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = String::new();
            socket.read_to_string(&mut received).await.unwrap();
            received
        });

        let printer = TcpLabelPrinter::new(
            TcpPrinterConfig {
                address,
                timeout_ms: 2000,
            },
            LabelLayout::default(),
        );
        printer
            .print_label(20.25, &BagId::parse("654321").unwrap())
            .await
            .unwrap();

        let received = server.await.unwrap();
        assert!(received.contains("^FDWeight: 20.25^FS"));
        assert!(received.contains("^FDBagID: 654321^FS"));
    }

    #[tokio::test]
    async fn test_tcp_printer_unreachable() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let printer = TcpLabelPrinter::new(
            TcpPrinterConfig {
                address,
                timeout_ms: 500,
            },
            LabelLayout::default(),
        );
        assert!(printer
            .print_label(1.0, &BagId::parse("1").unwrap())
            .await
            .is_err());
    }
}
