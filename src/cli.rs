//! CLI arguments and subcommands for couchdb-stats-agent.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "couchdb-stats-agent",
    about = "Polls CouchDB /_stats and reports metrics to a Boundary-style meter",
    long_about = "Polls CouchDB /_stats and reports metrics to a Boundary-style meter.\n\n\
                  Reads the CouchDB statistics endpoint at a fixed interval, converts request \
                  and status-code counters into per-interval deltas, and writes one \
                  `NAME VALUE` line per metric to stdout.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose (info-level) logging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Log level (overrides --verbose and the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// CouchDB stats endpoint URL
    #[arg(long)]
    pub stats_url: Option<String>,

    /// Prefix prepended to every reported metric name
    #[arg(long)]
    pub prefix: Option<String>,

    /// Poll interval in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Fetch attempts before giving up (0 = retry forever)
    #[arg(long)]
    pub retry_count: Option<u32>,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch stats and print what would be reported
    Check {
        /// Number of polls (counters need two to show a delta)
        #[arg(short = 'n', long, default_value_t = 2)]
        iterations: usize,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// List the metrics the agent reports
    Metrics {
        /// Filter by stats category
        #[arg(long)]
        category: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_flag() {
        let args = Args::try_parse_from(["couchdb-stats-agent", "-v"]).unwrap();
        assert!(args.verbose);
        assert!(args.command.is_none());
        assert!(args.log_level.is_none());
    }

    #[test]
    fn test_overrides_and_subcommand() {
        let args = Args::try_parse_from([
            "couchdb-stats-agent",
            "--stats-url",
            "http://db:5984/_stats",
            "--retry-count",
            "3",
            "check",
            "-n",
            "4",
        ])
        .unwrap();
        assert_eq!(args.stats_url.as_deref(), Some("http://db:5984/_stats"));
        assert_eq!(args.retry_count, Some(3));
        assert!(matches!(args.command, Some(Commands::Check { iterations: 4 })));
    }
}
