//! Retrieval of stats snapshots with retry.
//!
//! [`StatsSource`] is the transport seam: [`HttpStatsSource`] talks to the
//! CouchDB `/_stats` endpoint, tests plug in fakes. [`StatsFetcher`] wraps a
//! source with the retry policy and bookkeeping.

use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, instrument};

use crate::error::{FetchError, TransportError};
use crate::poll_stats::PollStats;
use crate::snapshot::Snapshot;

pub const DEFAULT_STATS_URL: &str = "http://127.0.0.1:5984/_stats";
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can produce one snapshot per call.
pub trait StatsSource {
    fn fetch(&self) -> impl Future<Output = Result<Snapshot, TransportError>> + Send;

    /// Human readable location, used in log lines.
    fn describe(&self) -> String;
}

/// Fetches `/_stats` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStatsSource {
    client: reqwest::Client,
    url: String,
}

impl HttpStatsSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("couchdb-stats-agent/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl StatsSource for HttpStatsSource {
    async fn fetch(&self) -> Result<Snapshot, TransportError> {
        let request_error = |source| TransportError::Request {
            url: self.url.clone(),
            source,
        };

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: self.url.clone(),
                status,
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        Snapshot::from_slice(&body)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// How often, and how patiently, a failed fetch is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries forever.
    pub max_attempts: Option<NonZeroU32>,
    pub delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts == 0` means unbounded.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: NonZeroU32::new(max_attempts),
            delay,
        }
    }

    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            delay,
        }
    }

    /// True once `attempts` failed attempts use up the budget.
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max.get())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(DEFAULT_RETRY_DELAY)
    }
}

/// A stats source combined with its retry policy.
pub struct StatsFetcher<S> {
    source: S,
    policy: RetryPolicy,
    stats: Arc<PollStats>,
}

impl<S: StatsSource> StatsFetcher<S> {
    pub fn new(source: S, policy: RetryPolicy, stats: Arc<PollStats>) -> Self {
        Self {
            source,
            policy,
            stats,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// One attempt, no retry.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot, TransportError> {
        self.stats.record_fetch_attempt();
        let start = Instant::now();
        let result = self.source.fetch().await;
        self.stats
            .record_fetch_duration_ms(start.elapsed().as_secs_f64() * 1000.0);
        if result.is_err() {
            self.stats.record_fetch_failure();
        }
        result
    }

    /// Fetches until a snapshot arrives or the retry budget runs out.
    ///
    /// Every failed attempt is logged. With a bounded policy the last
    /// failure is returned inside [`FetchError::RetriesExhausted`] without
    /// waiting another delay.
    #[instrument(skip(self), fields(source = %self.source.describe()))]
    pub async fn fetch_snapshot_with_retry(&self) -> Result<Snapshot, FetchError> {
        let mut attempts: u32 = 0;
        loop {
            match self.fetch_snapshot().await {
                Ok(snapshot) => {
                    if attempts > 0 {
                        debug!("Stats retrieved after {} failed attempts", attempts);
                    }
                    return Ok(snapshot);
                }
                Err(e) => {
                    attempts = attempts.saturating_add(1);
                    error!("Error retrieving data: {}", e);

                    if self.policy.is_exhausted(attempts) {
                        error!("Max retries exceeded retrieving data");
                        return Err(FetchError::RetriesExhausted { attempts, last: e });
                    }

                    tokio::time::sleep(self.policy.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_means_unbounded() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert!(policy.max_attempts.is_none());
        assert!(!policy.is_exhausted(u32::MAX));
    }

    #[test]
    fn test_bounded_policy() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        assert!(!policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert!(policy.max_attempts.is_none());
        assert_eq!(policy.delay, Duration::from_secs(5));
    }

    #[test]
    fn test_http_source_keeps_url() {
        let source = HttpStatsSource::new(DEFAULT_STATS_URL, DEFAULT_REQUEST_TIMEOUT).unwrap();
        assert_eq!(source.url(), DEFAULT_STATS_URL);
        assert_eq!(source.describe(), DEFAULT_STATS_URL);
    }
}
