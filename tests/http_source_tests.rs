//! Integration tests for the HTTP stats source.
//!
//! A small axum server stands in for CouchDB's `/_stats` endpoint.

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use couchdb_stats_agent::{
    BoundarySink, HttpStatsSource, PollStats, PollingLoop, Reporter, RetryPolicy, StatsFetcher,
    StatsSource, TransportError,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn source(addr: SocketAddr, timeout: Duration) -> HttpStatsSource {
    HttpStatsSource::new(format!("http://{}/_stats", addr), timeout).unwrap()
}

#[tokio::test]
async fn test_fetch_couchdb_document() {
    let router = Router::new().route(
        "/_stats",
        get(|| async {
            Json(json!({
                "couchdb": {
                    "open_databases": {
                        "description": "number of open databases",
                        "current": 7, "sum": 7, "mean": 0.0,
                        "stddev": 0.1, "min": 0, "max": 2
                    }
                },
                "httpd_status_codes": {
                    "200": {"description": "number of HTTP 200 OK responses", "current": 512}
                }
            }))
        }),
    );
    let addr = serve(router).await;

    let snapshot = source(addr, Duration::from_secs(5)).fetch().await.unwrap();
    assert_eq!(snapshot.category_count(), 2);
    assert_eq!(snapshot.reportable_value("couchdb", "open_databases"), Some(7.0));
    assert_eq!(snapshot.reportable_value("httpd_status_codes", "200"), Some(512.0));
}

#[tokio::test]
async fn test_server_error_status() {
    let router = Router::new().route(
        "/_stats",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = serve(router).await;

    let err = source(addr, Duration::from_secs(5)).fetch().await.unwrap_err();
    match err {
        TransportError::Status { status, .. } => assert_eq!(status.as_u16(), 500),
        other => panic!("expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body() {
    let router = Router::new().route("/_stats", get(|| async { "<html>maintenance</html>" }));
    let addr = serve(router).await;

    let err = source(addr, Duration::from_secs(5)).fetch().await.unwrap_err();
    assert!(matches!(err, TransportError::Malformed(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_endpoint() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = source(addr, Duration::from_secs(5)).fetch().await.unwrap_err();
    assert!(matches!(err, TransportError::Request { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let router = Router::new().route(
        "/_stats",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({}))
        }),
    );
    let addr = serve(router).await;

    let err = source(addr, Duration::from_millis(200)).fetch().await.unwrap_err();
    assert!(matches!(err, TransportError::Request { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_end_to_end_metric_lines() {
    let hits = Arc::new(AtomicU64::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/_stats",
        get(move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                Json(json!({
                    "httpd": {"requests": {"current": 100 + n * 10}},
                    "couchdb": {"open_os_files": {"current": 11}}
                }))
            }
        }),
    );
    let addr = serve(router).await;

    let stats = Arc::new(PollStats::new());
    let sink = Arc::new(BoundarySink::new(Vec::new()));
    let fetcher = StatsFetcher::new(
        source(addr, Duration::from_secs(5)),
        RetryPolicy::new(1, Duration::ZERO),
        stats.clone(),
    );
    let mut polling = PollingLoop::new(
        fetcher,
        Reporter::new("TEST_", sink.clone()),
        Duration::from_millis(1),
        stats,
    );

    polling.run_cycle().await.unwrap();
    polling.run_cycle().await.unwrap();
    drop(polling);

    let sink = Arc::try_unwrap(sink).ok().expect("loop dropped its sink handle");
    let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    assert_eq!(
        out,
        "TEST_COUCHDB_REQUESTS 0\nTEST_COUCHDB_OPEN_OS_FILES 11\n\
         TEST_COUCHDB_REQUESTS 10\nTEST_COUCHDB_OPEN_OS_FILES 11\n"
    );
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
