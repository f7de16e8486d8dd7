//! Static catalog of the CouchDB metrics the agent reports.
//!
//! The order of [`METRICS`] is the order in which values are emitted each
//! cycle.

use crate::accumulator::MetricKey;

/// How a raw value is turned into a reported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Running total; reported as the delta since the previous poll.
    Counter,
    /// Instantaneous value; reported as read.
    Gauge,
}

/// One entry of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDefinition {
    /// Top-level key in the `/_stats` document.
    pub category: &'static str,
    /// Field name inside `category`.
    pub field: &'static str,
    /// Name the value is reported under, before the configured prefix.
    pub reported_name: &'static str,
    pub kind: MetricKind,
}

impl MetricDefinition {
    const fn counter(
        category: &'static str,
        field: &'static str,
        reported_name: &'static str,
    ) -> Self {
        Self {
            category,
            field,
            reported_name,
            kind: MetricKind::Counter,
        }
    }

    const fn gauge(
        category: &'static str,
        field: &'static str,
        reported_name: &'static str,
    ) -> Self {
        Self {
            category,
            field,
            reported_name,
            kind: MetricKind::Gauge,
        }
    }

    pub fn is_counter(&self) -> bool {
        self.kind == MetricKind::Counter
    }

    pub fn key(&self) -> MetricKey {
        MetricKey::new(self.category, self.field)
    }
}

/// All reported metrics, in emission order.
pub static METRICS: &[MetricDefinition] = &[
    // ========== HTTP Status Codes ==========
    MetricDefinition::counter("httpd_status_codes", "201", "COUCHDB_HTTPD_201"),
    MetricDefinition::counter("httpd_status_codes", "200", "COUCHDB_HTTPD_200"),
    MetricDefinition::counter("httpd_status_codes", "202", "COUCHDB_HTTPD_202"),
    MetricDefinition::counter("httpd_status_codes", "401", "COUCHDB_HTTPD_401"),
    MetricDefinition::counter("httpd_status_codes", "301", "COUCHDB_HTTPD_301"),
    MetricDefinition::counter("httpd_status_codes", "304", "COUCHDB_HTTPD_304"),
    MetricDefinition::counter("httpd_status_codes", "405", "COUCHDB_HTTPD_405"),
    MetricDefinition::counter("httpd_status_codes", "404", "COUCHDB_HTTPD_404"),
    MetricDefinition::counter("httpd_status_codes", "403", "COUCHDB_HTTPD_403"),
    MetricDefinition::counter("httpd_status_codes", "500", "COUCHDB_HTTPD_500"),
    MetricDefinition::counter("httpd_status_codes", "412", "COUCHDB_HTTPD_412"),
    MetricDefinition::counter("httpd_status_codes", "400", "COUCHDB_HTTPD_400"),
    MetricDefinition::counter("httpd_status_codes", "409", "COUCHDB_HTTPD_409"),
    // ========== HTTPD ==========
    MetricDefinition::counter("httpd", "bulk_requests", "COUCHDB_HTTPD_BULK_REQUESTS"),
    MetricDefinition::counter(
        "httpd",
        "clients_requesting_changes",
        "COUCHDB_CLIENTS_REQUESTING_CHANGES",
    ),
    MetricDefinition::counter("httpd", "view_reads", "COUCHDB_VIEW_READS"),
    MetricDefinition::counter("httpd", "requests", "COUCHDB_REQUESTS"),
    MetricDefinition::counter(
        "httpd",
        "temporary_view_reads",
        "COUCHDB_TEMPORARY_VIEW_READS",
    ),
    // ========== CouchDB Core ==========
    MetricDefinition::gauge("couchdb", "open_os_files", "COUCHDB_OPEN_OS_FILES"),
    MetricDefinition::counter("couchdb", "auth_cache_hits", "COUCHDB_AUTH_CACHE_HITS"),
    MetricDefinition::counter("couchdb", "database_reads", "COUCHDB_DATABASE_READS"),
    MetricDefinition::gauge("couchdb", "open_databases", "COUCHDB_OPEN_DATABASES"),
    MetricDefinition::counter("couchdb", "auth_cache_misses", "COUCHDB_AUTH_CACHE_MISSES"),
    MetricDefinition::counter("couchdb", "database_writes", "COUCHDB_DATABASE_WRITES"),
    MetricDefinition::gauge("couchdb", "request_time", "COUCHDB_REQUEST_TIME"),
    // ========== HTTP Request Methods ==========
    MetricDefinition::counter("httpd_request_methods", "HEAD", "COUCHDB_REQUEST_HEAD"),
    MetricDefinition::counter("httpd_request_methods", "GET", "COUCHDB_REQUEST_GET"),
    MetricDefinition::counter("httpd_request_methods", "PUT", "COUCHDB_REQUEST_PUT"),
    MetricDefinition::counter("httpd_request_methods", "POST", "COUCHDB_REQUEST_POST"),
    MetricDefinition::counter("httpd_request_methods", "COPY", "COUCHDB_REQUEST_COPY"),
    MetricDefinition::counter("httpd_request_methods", "DELETE", "COUCHDB_REQUEST_DELETE"),
];

/// Returns the catalog in emission order.
pub fn list_metrics() -> &'static [MetricDefinition] {
    METRICS
}

/// Looks up a catalog entry by its snapshot location.
pub fn find(category: &str, field: &str) -> Option<&'static MetricDefinition> {
    METRICS
        .iter()
        .find(|m| m.category == category && m.field == field)
}
