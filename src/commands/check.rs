//! Check command implementation.
//!
//! Fetches stats from the configured endpoint and prints the lines the agent
//! would report, without retrying.

use std::sync::Arc;
use std::time::{Duration, Instant};

use couchdb_stats_agent::{
    BoundarySink, HttpStatsSource, PollStats, Reporter, RetryPolicy, StatsFetcher,
};

use crate::config::Config;

/// Fetcher for check mode: one attempt per iteration, no retry delay.
fn check_fetcher(
    config: &Config,
    stats: Arc<PollStats>,
) -> anyhow::Result<StatsFetcher<HttpStatsSource>> {
    let source = HttpStatsSource::new(config.stats_url(), config.request_timeout())?;
    Ok(StatsFetcher::new(source, RetryPolicy::new(1, Duration::ZERO), stats))
}

/// Polls `iterations` times, one poll interval apart.
pub async fn command_check(iterations: usize, config: &Config) -> anyhow::Result<()> {
    println!("🧪 CouchDB Stats Agent - Check Mode");
    println!("===================================");
    println!("   🔗 Endpoint: {}", config.stats_url());

    let stats = Arc::new(PollStats::new());
    let fetcher = check_fetcher(config, stats.clone())?;
    let mut reporter = Reporter::new(config.metric_prefix(), BoundarySink::stdout());

    let iterations = iterations.max(1);
    let mut failures = 0usize;
    for iteration in 1..=iterations {
        println!("\n🔄 Iteration {}/{}:", iteration, iterations);

        let start = Instant::now();
        match fetcher.fetch_snapshot_with_retry().await {
            Ok(snapshot) => {
                println!(
                    "   📁 {} categories in {:.2}ms",
                    snapshot.category_count(),
                    start.elapsed().as_secs_f64() * 1000.0
                );
                let summary = reporter.process_snapshot(&snapshot);
                stats.record_cycle(
                    summary.reported,
                    summary.skipped,
                    summary.sink_errors,
                    start.elapsed().as_secs_f64() * 1000.0,
                );
                println!(
                    "   📊 Reported: {}  Skipped: {}",
                    summary.reported, summary.skipped
                );
            }
            Err(e) => {
                failures += 1;
                println!("   ❌ {}", e);
            }
        }

        if iteration < iterations {
            tokio::time::sleep(config.poll_interval()).await;
        }
    }

    println!("\n{}", stats.render_summary());

    if failures == iterations {
        anyhow::bail!("Could not retrieve stats from {}", config.stats_url());
    }
    println!("✅ Check completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_fetcher_makes_single_attempt() {
        let fetcher = check_fetcher(&Config::default(), Arc::new(PollStats::new())).unwrap();
        assert!(fetcher.policy().is_exhausted(1));
        assert_eq!(fetcher.policy().delay, Duration::ZERO);
    }
}
