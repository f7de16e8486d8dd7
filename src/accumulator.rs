//! Counter accumulation.
//!
//! CouchDB publishes request and status-code counts as running totals. The
//! meter wants per-interval values, so each counter reading is turned into
//! the difference from the previous reading of the same metric.

use ahash::AHashMap as HashMap;
use tracing::debug;

/// Identity of a metric inside a snapshot: `(category, field)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricKey {
    pub category: &'static str,
    pub field: &'static str,
}

impl MetricKey {
    pub const fn new(category: &'static str, field: &'static str) -> Self {
        Self { category, field }
    }
}

/// Last raw value seen per counter.
///
/// Entries are created on first observation and live for the lifetime of
/// the accumulator.
#[derive(Debug, Default)]
pub struct Accumulator {
    previous: HashMap<MetricKey, f64>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a raw counter reading into the delta since the last reading.
    ///
    /// The first reading of a key returns 0. A reading lower than the stored
    /// one means the server restarted and reset its counters; it is handled
    /// like a first reading, so the new value becomes the baseline and 0 is
    /// returned.
    pub fn accumulate(&mut self, key: MetricKey, raw: f64) -> f64 {
        match self.previous.insert(key, raw) {
            None => 0.0,
            Some(prev) if raw < prev => {
                debug!(
                    "Counter {}.{} went backwards ({} -> {}), treating as reset",
                    key.category, key.field, prev, raw
                );
                0.0
            }
            Some(prev) => raw - prev,
        }
    }

    /// Last raw value stored for `key`, if any.
    pub fn last_value(&self, key: &MetricKey) -> Option<f64> {
        self.previous.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}
