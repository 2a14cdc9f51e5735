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

// Error taxonomy shared by the ledger, transport and sink layers

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StationError>;

/// Failures of the line-oriented transport (serial port or test stream)
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open {port} at {baud_rate} baud: {source}")]
    Open {
        port: String,
        baud_rate: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("read from {port} failed: {source}")]
    Read {
        port: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{port} closed the stream")]
    Closed { port: String },
}

/// A sensor line that carried no usable weight
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("no number found in line '{0}'")]
    NoNumber(String),

    #[error("weight '{0}' is not a finite non-negative number")]
    InvalidWeight(String),
}

/// Label printer or report writer failures
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("label printer {target} failed: {source}")]
    Label {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("label printer {target} timed out after {timeout_ms} ms")]
    LabelTimeout { target: String, timeout_ms: u64 },

    #[error("report export to {path} failed: {reason}")]
    Report { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum StationError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("ledger I/O error at {location}: {source}")]
    StoreIo {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ledger row {row} in {location}: {reason}")]
    StoreFormat {
        location: String,
        row: usize,
        reason: String,
    },

    #[error("sink failure: {0}")]
    Sink(#[from] SinkError),

    #[error("invalid bag id '{0}': expected digits only")]
    InvalidBagId(String),
}

impl StationError {
    pub(crate) fn store_io(location: impl Into<String>, source: std::io::Error) -> Self {
        StationError::StoreIo {
            location: location.into(),
            source,
        }
    }

    pub(crate) fn store_format(
        location: impl Into<String>,
        row: usize,
        reason: impl Into<String>,
    ) -> Self {
        StationError::StoreFormat {
            location: location.into(),
            row,
            reason: reason.into(),
        }
    }

    /// Whether the failure aborts the running operation (store and transport)
    /// as opposed to being recoverable in place (parse and label sink).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StationError::Parse(_) | StationError::Sink(_))
    }
}
