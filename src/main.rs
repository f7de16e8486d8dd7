//! couchdb-stats-agent - version 0.1.0
//!
//! Long-running CouchDB statistics agent with tracing logging.
//! This is the main entry point that resolves configuration, starts the
//! keepalive task and runs the polling loop until a signal or a fatal fetch
//! failure.

mod cli;
mod commands;
mod config;

use anyhow::Context;
use clap::Parser;
use couchdb_stats_agent::sink::spawn_keepalive;
use couchdb_stats_agent::{
    BoundarySink, HttpStatsSource, MetricAuditLog, PollStats, PollingLoop, Reporter, StatsFetcher,
};
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use tokio::signal;
use tracing::{error, info, Level};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_metrics};
use config::{
    parse_level_name, resolve_config, show_config, validate_effective_config, Config,
    DEFAULT_LOG_LEVEL,
};

/// Effective log level: `--log-level` > `-v` > config file > error.
/// `None` turns logging off.
fn resolve_log_level(config: &Config, args: &Args) -> Option<Level> {
    if let Some(level) = args.log_level {
        return match level {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        };
    }

    if args.verbose {
        return Some(Level::INFO);
    }

    let name = config.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL);
    parse_level_name(name).unwrap_or(Some(Level::ERROR))
}

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr or `log_file`; stdout belongs to the meter.
fn setup_logging(config: &Config, args: &Args) -> anyhow::Result<()> {
    let Some(log_level) = resolve_log_level(config, args) else {
        return Ok(());
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let subscriber = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set tracing subscriber")?;
        }
        None => {
            let subscriber = builder.with_writer(std::io::stderr).finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set tracing subscriber")?;
        }
    }

    info!("Logging initialized with level: {}", log_level);
    Ok(())
}

/// Helper function to load and validate configuration.
fn load_validated_config(args: &Args) -> anyhow::Result<Config> {
    let config = resolve_config(args)?;
    validate_effective_config(&config).context("Configuration invalid")?;
    Ok(config)
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Sets up the sink, keepalive and polling loop, then runs until a signal
/// or a fatal fetch failure.
async fn run_agent(config: &Config) -> anyhow::Result<()> {
    let stats = Arc::new(PollStats::new());

    let mut sink = BoundarySink::stdout();
    if let Some(path) = &config.report_log_file {
        let audit = MetricAuditLog::open(path)
            .with_context(|| format!("Failed to open report log {}", path.display()))?;
        sink = sink.with_audit_log(audit);
    }
    let sink = Arc::new(sink);

    let keepalive = config
        .keepalive_interval()
        .map(|interval| spawn_keepalive(sink.clone(), interval));

    let source = HttpStatsSource::new(config.stats_url(), config.request_timeout())?;
    let fetcher = StatsFetcher::new(source, config.retry_policy(), stats.clone());
    let reporter = Reporter::new(config.metric_prefix(), sink);
    let polling = PollingLoop::new(fetcher, reporter, config.poll_interval(), stats);

    let result = tokio::select! {
        result = polling.run() => result.map_err(anyhow::Error::from),
        _ = shutdown_signal() => Ok(()),
    };

    if let Some(handle) = keepalive {
        handle.abort();
    }

    result
}

/// Main application entry point.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        return match command {
            Commands::Config {
                output,
                format,
                commented,
            } => command_config(output.clone(), *format, *commented),

            Commands::Metrics { category } => {
                let config = resolve_config(&args)?;
                command_metrics(category.clone(), config.metric_prefix())
            }

            Commands::Check { iterations } => {
                let config = load_validated_config(&args)?;
                setup_logging(&config, &args)?;
                command_check(*iterations, &config).await
            }
        };
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config, &args)?;

    info!(
        "Starting couchdb-stats-agent {} (built {}, git {})",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_BUILD_TIMESTAMP"),
        env!("VERGEN_GIT_SHA")
    );

    match run_agent(&config).await {
        Ok(()) => {
            info!("couchdb-stats-agent stopped gracefully");
            Ok(())
        }
        Err(e) => {
            error!("Fatal: {:#}", e);
            Err(e)
        }
    }
}
