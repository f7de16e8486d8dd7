//! The polling loop: fetch, process, sleep, forever.
//!
//! Cycles are strictly sequential. The loop only ends when the fetcher gives
//! up ([`FetchError::RetriesExhausted`]) or when the future is dropped, which
//! interrupts whichever wait is in progress.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::FetchError;
use crate::fetcher::{StatsFetcher, StatsSource};
use crate::poll_stats::PollStats;
use crate::reporter::{CycleSummary, Reporter};
use crate::sink::MetricSink;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Cycles between info-level statistics summaries.
const SUMMARY_EVERY_CYCLES: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    Processing,
    Sleeping,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PollState::Idle => "idle",
            PollState::Fetching => "fetching",
            PollState::Processing => "processing",
            PollState::Sleeping => "sleeping",
        };
        f.write_str(s)
    }
}

pub struct PollingLoop<S, K> {
    fetcher: StatsFetcher<S>,
    reporter: Reporter<K>,
    interval: Duration,
    stats: Arc<PollStats>,
    state: PollState,
}

impl<S: StatsSource, K: MetricSink> PollingLoop<S, K> {
    pub fn new(
        fetcher: StatsFetcher<S>,
        reporter: Reporter<K>,
        interval: Duration,
        stats: Arc<PollStats>,
    ) -> Self {
        Self {
            fetcher,
            reporter,
            interval,
            stats,
            state: PollState::Idle,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn reporter(&self) -> &Reporter<K> {
        &self.reporter
    }

    pub fn stats(&self) -> &Arc<PollStats> {
        &self.stats
    }

    fn transition(&mut self, next: PollState) {
        debug!("Poll state {} -> {}", self.state, next);
        self.state = next;
    }

    /// Fetches one snapshot (with retry) and reports it.
    pub async fn run_cycle(&mut self) -> Result<CycleSummary, FetchError> {
        self.transition(PollState::Fetching);
        let snapshot = self.fetcher.fetch_snapshot_with_retry().await?;

        self.transition(PollState::Processing);
        let start = Instant::now();
        let summary = self.reporter.process_snapshot(&snapshot);
        self.stats.record_cycle(
            summary.reported,
            summary.skipped,
            summary.sink_errors,
            start.elapsed().as_secs_f64() * 1000.0,
        );

        Ok(summary)
    }

    /// Runs cycles until the retry budget is exhausted. The fetcher has
    /// already logged the failure; the caller owns the final error.
    pub async fn run(mut self) -> Result<(), FetchError> {
        info!(
            "Polling {} every {}ms",
            self.fetcher.source().describe(),
            self.interval.as_millis()
        );

        loop {
            self.run_cycle().await?;

            let cycles = self.stats.cycle_count();
            if cycles % SUMMARY_EVERY_CYCLES == 0 {
                info!("Poll statistics after {} cycles:\n{}", cycles, self.stats.render_summary());
            }

            self.transition(PollState::Sleeping);
            tokio::time::sleep(self.interval).await;
        }
    }
}
