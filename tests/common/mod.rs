//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use tokio::net::TcpListener;

use strataforge_errors::config::AppConfig;
use strataforge_errors::lifecycle::startup::build_responder;
use strataforge_errors::observability::MemorySink;
use strataforge_errors::{HttpServer, Shutdown};

/// Directory holding the bundled error page templates.
#[allow(dead_code)]
pub fn templates_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
}

/// Build a server whose error log is captured in memory.
pub fn build_server(config: AppConfig) -> (HttpServer, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let responder = build_responder(&config, sink.clone()).unwrap();
    (HttpServer::new(config, responder), sink)
}

/// Router with static fallback pages and a capturing sink.
#[allow(dead_code)]
pub fn test_router() -> (Router, Arc<MemorySink>) {
    let (server, sink) = build_server(AppConfig::default());
    (server.router(), sink)
}

#[allow(dead_code)]
pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Start a live server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(config: AppConfig) -> (SocketAddr, Shutdown, Arc<MemorySink>) {
    let (server, sink) = build_server(config);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown, sink)
}
