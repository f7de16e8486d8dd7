//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("couchdb-stats-agent.yaml"));

    let mut content = render_config(&config, format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# CouchDB Stats Agent Configuration
# =================================
#
# Source
# ------
# stats_url: "http://127.0.0.1:5984/_stats"  # CouchDB statistics endpoint
# request_timeout_secs: 10     # HTTP timeout per fetch
#
# Polling
# -------
# poll_interval_ms: 5000       # Sleep between cycles (alias: pollInterval)
# retry_count: 0               # Fetch attempts before exiting (0 = forever)
# retry_delay_secs: 5          # Wait between failed fetch attempts
#
# Reporting
# ---------
# metric_prefix: ""            # Prepended to every metric name
# keepalive_interval_secs: 30  # Keepalive period (0 = disabled)
# report_log_file: null        # Append every reported value to this file
#
# Logging
# -------
# log_level: "error"           # off, error, warn, info, debug, trace
# log_file: null               # Log file path (null = stderr)
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_commented_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.yaml");
        command_config(Some(path.clone()), ConfigFormat::Yaml, true).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# CouchDB Stats Agent Configuration"));
        let parsed: Config = serde_yaml::from_str(&content).unwrap();
        assert_eq!(parsed.stats_url, Config::default().stats_url);
    }
}
