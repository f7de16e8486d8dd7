//! CLI command implementations for couchdb-stats-agent.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Fetch stats once or more and print the reported values
//! - `config`: Configuration file generation
//! - `metrics`: Catalog listing

pub mod check;
pub mod config;
pub mod metrics;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use metrics::command_metrics;
