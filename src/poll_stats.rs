//! Self-monitoring statistics for the polling loop.
//!
//! Tracks fetch attempts, failures and per-cycle timings so the agent can
//! log a periodic summary and the `check` command can print one.

use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock as StdRwLock};
use std::time::Instant;

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// Returns `(current, average, max, min, count)`.
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Counters and timings for the fetch/process/sleep loop.
pub struct PollStats {
    pub cycles: AtomicU64,
    pub fetch_attempts: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub metrics_reported: AtomicU64,
    pub metrics_skipped: AtomicU64,
    pub sink_errors: AtomicU64,

    pub fetch_duration_ms: Stat,
    pub process_duration_ms: Stat,
    pub reported_per_cycle: Stat,

    pub start_time: Instant,
    pub last_cycle_time: StdRwLock<Option<Instant>>,
}

impl Default for PollStats {
    fn default() -> Self {
        Self {
            cycles: AtomicU64::new(0),
            fetch_attempts: AtomicU64::new(0),
            fetch_failures: AtomicU64::new(0),
            metrics_reported: AtomicU64::new(0),
            metrics_skipped: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
            fetch_duration_ms: Stat::default(),
            process_duration_ms: Stat::default(),
            reported_per_cycle: Stat::default(),
            start_time: Instant::now(),
            last_cycle_time: StdRwLock::new(None),
        }
    }
}

impl PollStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_fetch_attempt(&self) {
        self.fetch_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_duration_ms(&self, duration_ms: f64) {
        self.fetch_duration_ms.add_sample(duration_ms);
    }

    /// Records the outcome of one processed snapshot.
    pub fn record_cycle(&self, reported: u64, skipped: u64, sink_errors: u64, duration_ms: f64) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.metrics_reported.fetch_add(reported, Ordering::Relaxed);
        self.metrics_skipped.fetch_add(skipped, Ordering::Relaxed);
        self.sink_errors.fetch_add(sink_errors, Ordering::Relaxed);
        self.reported_per_cycle.add_sample(reported as f64);
        self.process_duration_ms.add_sample(duration_ms);

        if let Ok(mut guard) = self.last_cycle_time.write() {
            *guard = Some(Instant::now());
        }
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn get_fetch_success_rate(&self) -> f64 {
        let attempts = self.fetch_attempts.load(Ordering::Relaxed);
        let failures = self.fetch_failures.load(Ordering::Relaxed);
        if attempts == 0 {
            100.0
        } else {
            (attempts.saturating_sub(failures) as f64 / attempts as f64) * 100.0
        }
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Seconds since the last processed cycle, or `None` before the first.
    pub fn seconds_since_last_cycle(&self) -> Option<f64> {
        let guard = self.last_cycle_time.read().ok()?;
        guard.map(|t| t.elapsed().as_secs_f64())
    }

    pub fn render_summary(&self) -> String {
        let (fd_cur, fd_avg, fd_max, fd_min, _) = self.fetch_duration_ms.snapshot();
        let (pd_cur, pd_avg, pd_max, pd_min, _) = self.process_duration_ms.snapshot();
        let (rc_cur, rc_avg, rc_max, rc_min, _) = self.reported_per_cycle.snapshot();

        let left_col = 24usize;
        let col_w = 10usize;

        let mut out = String::new();

        writeln!(out, "POLL STATISTICS").ok();
        writeln!(out, "===============").ok();
        writeln!(
            out,
            "cycles: {}  fetch attempts: {}  fetch failures: {}  success rate: {:.1}%",
            self.cycles.load(Ordering::Relaxed),
            self.fetch_attempts.load(Ordering::Relaxed),
            self.fetch_failures.load(Ordering::Relaxed),
            self.get_fetch_success_rate()
        )
        .ok();
        writeln!(
            out,
            "metrics reported: {}  skipped: {}  sink errors: {}  uptime: {}s",
            self.metrics_reported.load(Ordering::Relaxed),
            self.metrics_skipped.load(Ordering::Relaxed),
            self.sink_errors.load(Ordering::Relaxed),
            self.get_uptime_seconds()
        )
        .ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();

        for (label, cur, avg, max, min) in [
            ("fetch_duration (ms)", fd_cur, fd_avg, fd_max, fd_min),
            ("process_duration (ms)", pd_cur, pd_avg, pd_max, pd_min),
            ("reported_per_cycle", rc_cur, rc_avg, rc_max, rc_min),
        ] {
            writeln!(
                out,
                "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
                label,
                format!("{:.2}", cur),
                format!("{:.2}", avg),
                format!("{:.2}", max),
                format!("{:.2}", min),
                left = left_col,
                col = col_w
            )
            .ok();
        }

        out
    }
}
