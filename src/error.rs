//! Error types for the stats agent.
//!
//! Only fetching can fail in a way that matters to the polling loop:
//! [`TransportError`] is transient and retried, [`FetchError`] is fatal.
//! Sink write failures are reported through [`SinkError`] and never leave
//! the reporter.

/// Transient failure while retrieving one stats snapshot.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed stats document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Stats document is not a JSON object")]
    NotAnObject,
}

/// Unrecoverable fetch failure; terminates the polling loop.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Max retries exceeded retrieving data ({attempts} attempts): {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: TransportError,
    },
}

/// Failure writing a metric or keepalive line.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to write metric line: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sink lock poisoned")]
    Poisoned,
}
