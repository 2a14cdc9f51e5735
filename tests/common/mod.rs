// Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use scale_recorder::error::{SinkError, TransportError};
use scale_recorder::record::parse_timestamp;
use scale_recorder::{BagId, LabelSink, LineRead, LineSource, WeighRecord};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// One scripted transport event
pub enum Step {
    Line(String),
    Timeout,
    Fail,
}

/// Transport that replays a fixed script and records whether it was closed
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    closed: Arc<AtomicBool>,
    open: bool,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> (Self, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        let source = Self {
            steps: steps.into(),
            closed: closed.clone(),
            open: true,
        };
        (source, closed)
    }

    pub fn lines<S: AsRef<str>>(lines: &[S]) -> (Self, Arc<AtomicBool>) {
        Self::new(
            lines
                .iter()
                .map(|l| Step::Line(l.as_ref().to_string()))
                .collect(),
        )
    }
}

#[async_trait]
impl LineSource for ScriptedSource {
    async fn read_line(&mut self) -> Result<LineRead, TransportError> {
        if !self.open {
            return Err(TransportError::Closed {
                port: "scripted".to_string(),
            });
        }
        match self.steps.pop_front() {
            Some(Step::Line(line)) => Ok(LineRead::Line(line)),
            Some(Step::Timeout) => Ok(LineRead::Timeout),
            Some(Step::Fail) => Err(TransportError::Read {
                port: "scripted".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "cable pulled"),
            }),
            None => Err(TransportError::Closed {
                port: "scripted".to_string(),
            }),
        }
    }

    async fn close(&mut self) {
        self.open = false;
        self.closed.store(true, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Label sink that counts calls and can be told to fail
pub struct RecordingPrinter {
    pub printed: AtomicUsize,
    pub fail: bool,
}

impl RecordingPrinter {
    pub fn working() -> Arc<Self> {
        Arc::new(Self {
            printed: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            printed: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn count(&self) -> usize {
        self.printed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LabelSink for RecordingPrinter {
    async fn print_label(&self, _weight: f64, _bag_id: &BagId) -> Result<(), SinkError> {
        self.printed.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SinkError::Label {
                target: "recording".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotConnected, "printer offline"),
            });
        }
        Ok(())
    }

    fn sink_type(&self) -> &str {
        "recording"
    }
}

pub fn gross_lines(weights: &[f64]) -> Vec<String> {
    weights.iter().map(|w| format!("Gross {}", w)).collect()
}

pub fn record(bag_id: &str, weight: f64, batch: u32) -> WeighRecord {
    WeighRecord::new(
        BagId::parse(bag_id).unwrap(),
        weight,
        parse_timestamp("2024-04-10 07:45:12.345678").unwrap(),
        batch,
        "Product",
    )
}
