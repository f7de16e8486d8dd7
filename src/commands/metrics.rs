//! Metrics command implementation.
//!
//! Lists the catalog of reported metrics.

use couchdb_stats_agent::catalog::{list_metrics, MetricKind};

/// Lists catalog entries, optionally limited to one stats category.
pub fn command_metrics(category: Option<String>, prefix: &str) -> anyhow::Result<()> {
    println!("📊 CouchDB Stats Agent - Reported Metrics");
    println!("=========================================");

    let mut current_category = "";
    let mut shown = 0usize;

    for metric in list_metrics() {
        if let Some(filter) = &category {
            if metric.category != filter {
                continue;
            }
        }

        if metric.category != current_category {
            current_category = metric.category;
            println!("\n🏷️  Category: {}", current_category);
            println!("{}", "─".repeat(50));
        }

        let kind = match metric.kind {
            MetricKind::Counter => "counter (delta)",
            MetricKind::Gauge => "gauge",
        };
        println!(
            "   ├─ {:<28} {}{:<36} {}",
            metric.field, prefix, metric.reported_name, kind
        );
        shown += 1;
    }

    println!("\n📋 Total: {} of {} metrics", shown, list_metrics().len());
    Ok(())
}
