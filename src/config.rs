//! Configuration management for couchdb-stats-agent.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use anyhow::{bail, Context};
use couchdb_stats_agent::fetcher::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_DELAY, DEFAULT_STATS_URL};
use couchdb_stats_agent::poller::DEFAULT_POLL_INTERVAL;
use couchdb_stats_agent::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::cli::{Args, ConfigFormat};

pub const DEFAULT_KEEPALIVE_SECS: u64 = 30;
pub const DEFAULT_LOG_LEVEL: &str = "error";

/// Locations tried, in order, when no `--config` is given.
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./param.json",
    "/etc/couchdb-stats-agent/config.yaml",
    "/etc/couchdb-stats-agent/config.json",
    "./couchdb-stats-agent.yaml",
];

/// Agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Source
    pub stats_url: Option<String>,
    pub request_timeout_secs: Option<u64>,

    // Polling
    #[serde(alias = "pollInterval")]
    pub poll_interval_ms: Option<u64>,
    /// Fetch attempts before giving up; 0 retries forever
    pub retry_count: Option<u32>,
    pub retry_delay_secs: Option<u64>,

    // Reporting
    pub metric_prefix: Option<String>,
    pub keepalive_interval_secs: Option<u64>,
    pub report_log_file: Option<PathBuf>,

    // Logging
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stats_url: Some(DEFAULT_STATS_URL.to_string()),
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT.as_secs()),
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL.as_millis() as u64),
            retry_count: Some(0),
            retry_delay_secs: Some(DEFAULT_RETRY_DELAY.as_secs()),
            metric_prefix: Some(String::new()),
            keepalive_interval_secs: Some(DEFAULT_KEEPALIVE_SECS),
            report_log_file: None,
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
            log_file: None,
        }
    }
}

impl Config {
    pub fn stats_url(&self) -> &str {
        self.stats_url.as_deref().unwrap_or(DEFAULT_STATS_URL)
    }

    pub fn metric_prefix(&self) -> &str {
        self.metric_prefix.as_deref().unwrap_or("")
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = self
            .retry_delay_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RETRY_DELAY);
        RetryPolicy::new(self.retry_count.unwrap_or(0), delay)
    }

    /// `None` disables the keepalive task.
    pub fn keepalive_interval(&self) -> Option<Duration> {
        match self.keepalive_interval_secs.unwrap_or(DEFAULT_KEEPALIVE_SECS) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> anyhow::Result<()> {
    let url = cfg.stats_url();
    if url.trim().is_empty() {
        bail!("stats_url must not be empty");
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("Invalid stats_url '{}', expected an http:// or https:// URL", url);
    }

    if cfg.poll_interval_ms == Some(0) {
        bail!("poll_interval_ms must be greater than 0");
    }

    if cfg.request_timeout_secs == Some(0) {
        bail!("request_timeout_secs must be greater than 0");
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if parse_level_name(level).is_none() {
            bail!(
                "Invalid log_level '{}', expected one of off, error, warn, info, debug, trace",
                level
            );
        }
    }

    Ok(())
}

/// Parses a config-file level name. Unknown names yield `None`; `off`
/// yields `Some(None)`.
pub fn parse_level_name(name: &str) -> Option<Option<tracing::Level>> {
    match name.to_ascii_lowercase().as_str() {
        "off" => Some(None),
        "error" => Some(Some(tracing::Level::ERROR)),
        "warn" | "warning" => Some(Some(tracing::Level::WARN)),
        "info" => Some(Some(tracing::Level::INFO)),
        "debug" => Some(Some(tracing::Level::DEBUG)),
        "trace" => Some(Some(tracing::Level::TRACE)),
        _ => None,
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(url) = &args.stats_url {
        config.stats_url = Some(url.clone());
    }
    if let Some(prefix) = &args.prefix {
        config.metric_prefix = Some(prefix.clone());
    }
    if let Some(ms) = args.poll_interval_ms {
        config.poll_interval_ms = Some(ms);
    }
    if let Some(count) = args.retry_count {
        config.retry_count = Some(count);
    }

    Ok(config)
}

/// Loads the config file at `path`, or the first default location that
/// exists. Missing files yield the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        },
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let file_config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON config {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML config {}", path.display()))?,
        // Default to YAML
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML config {}", path.display()))?,
    };
    info!("Loaded configuration from: {}", path.display());

    Ok(merge_with_defaults(file_config))
}

/// Fills every field the file left out with its default.
fn merge_with_defaults(file: Config) -> Config {
    let d = Config::default();
    Config {
        stats_url: file.stats_url.or(d.stats_url),
        request_timeout_secs: file.request_timeout_secs.or(d.request_timeout_secs),
        poll_interval_ms: file.poll_interval_ms.or(d.poll_interval_ms),
        retry_count: file.retry_count.or(d.retry_count),
        retry_delay_secs: file.retry_delay_secs.or(d.retry_delay_secs),
        metric_prefix: file.metric_prefix.or(d.metric_prefix),
        keepalive_interval_secs: file.keepalive_interval_secs.or(d.keepalive_interval_secs),
        report_log_file: file.report_log_file.or(d.report_log_file),
        log_level: file.log_level.or(d.log_level),
        log_file: file.log_file.or(d.log_file),
    }
}

/// Renders configuration in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> anyhow::Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}
