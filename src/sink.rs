//! The reporting side: where extracted values go.
//!
//! The meter reads one `NAME VALUE` line per metric from the agent's stdout
//! and treats an empty line as a keepalive. [`BoundarySink`] writes that
//! format and can mirror every reported value to an audit log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SinkError;

/// Receives reported values.
pub trait MetricSink {
    fn report(&self, name: &str, value: f64) -> Result<(), SinkError>;
}

impl<T: MetricSink + ?Sized> MetricSink for Arc<T> {
    fn report(&self, name: &str, value: f64) -> Result<(), SinkError> {
        (**self).report(name, value)
    }
}

/// Formats one metric line, without the trailing newline.
pub fn format_metric_line(name: &str, value: f64) -> String {
    format!("{} {}", name, value)
}

/// Append-only record of every reported value.
pub struct MetricAuditLog {
    file: Mutex<File>,
}

impl MetricAuditLog {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        info!("Logging reported metrics to: {}", path.display());
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    pub fn record(&self, name: &str, value: f64) -> Result<(), SinkError> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut file = self.file.lock().map_err(|_| SinkError::Poisoned)?;
        writeln!(file, "{} {}", timestamp, format_metric_line(name, value))?;
        Ok(())
    }
}

/// Line-oriented sink for a Boundary-style meter.
pub struct BoundarySink<W: Write> {
    out: Mutex<W>,
    audit: Option<MetricAuditLog>,
}

impl BoundarySink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> BoundarySink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            audit: None,
        }
    }

    pub fn with_audit_log(mut self, audit: MetricAuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Tells the meter the plugin is alive.
    pub fn keepalive(&self) -> Result<(), SinkError> {
        let mut out = self.out.lock().map_err(|_| SinkError::Poisoned)?;
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }

    /// Consumes the sink and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.out.into_inner().map_err(|_| SinkError::Poisoned)
    }
}

impl<W: Write> MetricSink for BoundarySink<W> {
    fn report(&self, name: &str, value: f64) -> Result<(), SinkError> {
        {
            let mut out = self.out.lock().map_err(|_| SinkError::Poisoned)?;
            writeln!(out, "{}", format_metric_line(name, value))?;
            out.flush()?;
        }

        if let Some(audit) = &self.audit {
            // Audit failures never fail the report.
            if let Err(e) = audit.record(name, value) {
                warn!("Failed to write metric audit log: {}", e);
            }
        }
        Ok(())
    }
}

/// Spawns a task that emits a keepalive every `interval` until aborted.
pub fn spawn_keepalive<W>(sink: Arc<BoundarySink<W>>, interval: Duration) -> JoinHandle<()>
where
    W: Write + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match sink.keepalive() {
                Ok(()) => debug!("Keepalive sent"),
                Err(e) => warn!("Failed to send keepalive: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_metric_line() {
        assert_eq!(format_metric_line("COUCHDB_HTTPD_200", 42.0), "COUCHDB_HTTPD_200 42");
        assert_eq!(format_metric_line("COUCHDB_REQUEST_TIME", 0.25), "COUCHDB_REQUEST_TIME 0.25");
    }

    #[test]
    fn test_report_and_keepalive_lines() {
        let sink = BoundarySink::new(Vec::new());
        sink.report("A", 1.0).unwrap();
        sink.keepalive().unwrap();
        sink.report("B", 2.5).unwrap();

        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(out, "A 1\n\nB 2.5\n");
    }

    #[test]
    fn test_audit_log_mirrors_reports() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.log");

        let sink = BoundarySink::new(Vec::new())
            .with_audit_log(MetricAuditLog::open(&path).unwrap());
        sink.report("COUCHDB_REQUESTS", 7.0).unwrap();
        sink.keepalive().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" COUCHDB_REQUESTS 7"), "got: {}", lines[0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keepalive_task_writes_empty_lines() {
        let sink = Arc::new(BoundarySink::new(Vec::new()));
        let handle = spawn_keepalive(sink.clone(), Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(35)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        let sink = Arc::try_unwrap(sink).ok().expect("keepalive task released the sink");
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert!(out.len() >= 3, "got {:?}", out);
        assert!(out.chars().all(|c| c == '\n'), "got {:?}", out);
    }
}
