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

// Line-oriented transport
//
// The scale talks over a serial line and emits newline-terminated text.
// A transport is owned exclusively by the operation that opened it and is
// closed on every exit path: explicitly through `close`, and implicitly by
// drop if the operation unwinds early.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::error::TransportError;

/// Outcome of one bounded read
#[derive(Debug, Clone, PartialEq)]
pub enum LineRead {
    Line(String),
    /// Nothing complete arrived within the read timeout
    Timeout,
}

#[async_trait]
pub trait LineSource: Send {
    /// Read the next line without its terminator.
    ///
    /// End of stream is reported as `TransportError::Closed`.
    async fn read_line(&mut self) -> Result<LineRead, TransportError>;

    /// Release the underlying stream. Further reads fail with `Closed`.
    async fn close(&mut self);

    fn name(&self) -> &str;
}

/// Newline framing over any async byte stream
pub struct LineTransport<R> {
    name: String,
    reader: Option<BufReader<R>>,
    pending: Vec<u8>,
    read_timeout: Duration,
}

/// Transport over an opened serial port
pub type SerialTransport = LineTransport<SerialStream>;

impl<R: AsyncRead + Unpin + Send> LineTransport<R> {
    pub fn new(name: impl Into<String>, inner: R, read_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            reader: Some(BufReader::new(inner)),
            pending: Vec::new(),
            read_timeout,
        }
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn take_line(&mut self) -> String {
        let bytes = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&bytes)
            .trim_end_matches(|c: char| c == '\r' || c == '\n')
            .to_string()
    }
}

/// Open the configured serial port for exclusive use
pub fn open_serial(config: &SerialConfig) -> Result<SerialTransport, TransportError> {
    let stream = tokio_serial::new(config.port.as_str(), config.baud_rate)
        .open_native_async()
        .map_err(|e| TransportError::Open {
            port: config.port.clone(),
            baud_rate: config.baud_rate,
            source: e.into(),
        })?;

    info!(
        "Opened serial port {} at {} baud",
        config.port, config.baud_rate
    );
    Ok(LineTransport::new(
        config.port.clone(),
        stream,
        config.read_timeout(),
    ))
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> LineSource for LineTransport<R> {
    async fn read_line(&mut self) -> Result<LineRead, TransportError> {
        let reader = self.reader.as_mut().ok_or_else(|| TransportError::Closed {
            port: self.name.clone(),
        })?;

        // Partial bytes stay in `pending` across timeouts
        let read = tokio::time::timeout(
            self.read_timeout,
            reader.read_until(b'\n', &mut self.pending),
        )
        .await;

        match read {
            Err(_) => Ok(LineRead::Timeout),
            Ok(Ok(0)) if self.pending.is_empty() => Err(TransportError::Closed {
                port: self.name.clone(),
            }),
            Ok(Ok(_)) => {
                let line = self.take_line();
                debug!("{} <- {:?}", self.name, line);
                Ok(LineRead::Line(line))
            }
            Ok(Err(source)) => Err(TransportError::Read {
                port: self.name.clone(),
                source,
            }),
        }
    }

    async fn close(&mut self) {
        if self.reader.take().is_some() {
            self.pending.clear();
            info!("Closed {}", self.name);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
