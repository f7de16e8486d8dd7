//! Extraction of catalog metrics from a snapshot.
//!
//! For each catalog entry, in order: look the value up, skip it when there is
//! no data, turn counters into deltas, and hand the result to the sink.

use tracing::{debug, error};

use crate::accumulator::Accumulator;
use crate::catalog::{self, MetricDefinition};
use crate::sink::MetricSink;
use crate::snapshot::Snapshot;

/// Outcome of processing one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub reported: u64,
    pub skipped: u64,
    pub sink_errors: u64,
}

/// Owns the accumulator state and the reporting collaborator.
pub struct Reporter<K> {
    prefix: String,
    catalog: &'static [MetricDefinition],
    accumulator: Accumulator,
    sink: K,
}

impl<K: MetricSink> Reporter<K> {
    pub fn new(prefix: impl Into<String>, sink: K) -> Self {
        Self {
            prefix: prefix.into(),
            catalog: catalog::list_metrics(),
            accumulator: Accumulator::new(),
            sink,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Full reported name for a catalog entry.
    pub fn metric_name(&self, metric: &MetricDefinition) -> String {
        format!("{}{}", self.prefix, metric.reported_name)
    }

    /// Reports every catalog metric present in `snapshot`.
    ///
    /// Missing or empty metrics are skipped. Sink failures are logged and
    /// counted; they never abort the cycle.
    pub fn process_snapshot(&mut self, snapshot: &Snapshot) -> CycleSummary {
        let mut summary = CycleSummary::default();

        for metric in self.catalog {
            let Some(raw) = snapshot.reportable_value(metric.category, metric.field) else {
                summary.skipped += 1;
                continue;
            };

            let value = if metric.is_counter() {
                self.accumulator.accumulate(metric.key(), raw)
            } else {
                raw
            };

            let name = self.metric_name(metric);
            match self.sink.report(&name, value) {
                Ok(()) => summary.reported += 1,
                Err(e) => {
                    error!("Failed to report {}: {}", name, e);
                    summary.sink_errors += 1;
                }
            }
        }

        debug!(
            "Processed snapshot: {} reported, {} skipped, {} sink errors",
            summary.reported, summary.skipped, summary.sink_errors
        );
        summary
    }
}
