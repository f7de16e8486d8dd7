//! Shared fakes for the integration tests.

#![allow(dead_code)]

use couchdb_stats_agent::{MetricSink, SinkError, Snapshot, StatsSource, TransportError};
use serde_json::Value;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Sink that remembers every report in order.
#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<(String, f64)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<(String, f64)> {
        self.reports.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.reports().into_iter().map(|(name, _)| name).collect()
    }

    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.reports()
            .into_iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn clear(&self) {
        self.reports.lock().unwrap().clear();
    }
}

impl MetricSink for RecordingSink {
    fn report(&self, name: &str, value: f64) -> Result<(), SinkError> {
        self.reports.lock().unwrap().push((name.to_string(), value));
        Ok(())
    }
}

/// Sink whose writes always fail.
pub struct BrokenSink;

impl MetricSink for BrokenSink {
    fn report(&self, _name: &str, _value: f64) -> Result<(), SinkError> {
        Err(SinkError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "meter went away")))
    }
}

/// Source that fails until call number `succeed_on` (1-based), then returns
/// `body`. `None` fails forever.
pub struct FlakySource {
    calls: AtomicU32,
    succeed_on: Option<u32>,
    body: Value,
}

impl FlakySource {
    pub fn failing() -> Self {
        Self {
            calls: AtomicU32::new(0),
            succeed_on: None,
            body: Value::Null,
        }
    }

    pub fn succeeding_on(call: u32, body: Value) -> Self {
        Self {
            calls: AtomicU32::new(0),
            succeed_on: Some(call),
            body,
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StatsSource for FlakySource {
    async fn fetch(&self) -> Result<Snapshot, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.succeed_on {
            Some(n) if call >= n => Snapshot::from_value(self.body.clone()),
            _ => Err(TransportError::NotAnObject),
        }
    }

    fn describe(&self) -> String {
        "flaky-test-source".to_string()
    }
}

/// Source that plays back a fixed list of documents, repeating the last.
pub struct SequenceSource {
    calls: AtomicU32,
    bodies: Vec<Value>,
}

impl SequenceSource {
    pub fn new(bodies: Vec<Value>) -> Self {
        Self {
            calls: AtomicU32::new(0),
            bodies,
        }
    }
}

impl StatsSource for SequenceSource {
    async fn fetch(&self) -> Result<Snapshot, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        let idx = call.min(self.bodies.len().saturating_sub(1));
        Snapshot::from_value(self.bodies[idx].clone())
    }

    fn describe(&self) -> String {
        "sequence-test-source".to_string()
    }
}

/// In-memory log writer for asserting on emitted log lines.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock().unwrap()).into_owned()
    }

    pub fn lines_containing(&self, needle: &str) -> usize {
        self.contents().lines().filter(|l| l.contains(needle)).count()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
