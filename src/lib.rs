//! CouchDB Stats Agent Library
//!
//! This library polls a CouchDB server's `/_stats` endpoint, extracts a fixed
//! catalog of metrics, converts counters into per-interval deltas, and writes
//! the results to a Boundary-style meter.
//!
//! # Features
//!
//! - **Metric Catalog**: 31 HTTP, request-method and database metrics
//! - **Counter Accumulation**: Running totals are reported as deltas
//! - **Tolerant Extraction**: Disabled or idle metrics are skipped, not errors
//! - **Retry Policy**: Bounded or unbounded retry, fatal on exhaustion
//!
//! # Usage
//!
//! ```rust
//! use couchdb_stats_agent::{BoundarySink, Reporter, Snapshot};
//! use serde_json::json;
//!
//! let snapshot = Snapshot::from_value(json!({
//!     "couchdb": { "open_databases": { "current": 12 } }
//! }))
//! .unwrap();
//!
//! let mut reporter = Reporter::new("", BoundarySink::new(Vec::new()));
//! let summary = reporter.process_snapshot(&snapshot);
//! assert_eq!(summary.reported, 1);
//! ```

pub mod accumulator;
pub mod catalog;
pub mod error;
pub mod fetcher;
pub mod poll_stats;
pub mod poller;
pub mod reporter;
pub mod sink;
pub mod snapshot;

// Re-export main types for convenience
pub use accumulator::{Accumulator, MetricKey};
pub use catalog::{list_metrics, MetricDefinition, MetricKind};
pub use error::{FetchError, SinkError, TransportError};
pub use fetcher::{HttpStatsSource, RetryPolicy, StatsFetcher, StatsSource};
pub use poll_stats::PollStats;
pub use poller::{PollState, PollingLoop};
pub use reporter::{CycleSummary, Reporter};
pub use sink::{BoundarySink, MetricAuditLog, MetricSink};
pub use snapshot::{Snapshot, StatRecord};
