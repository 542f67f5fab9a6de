//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the diagnostic handlers
//! - Wire up middleware (error pages, timeout, tracing, request ID)
//! - Bind server to listener and serve until shutdown

use std::net::SocketAddr;
use std::time::Duration;

use axum::{extract::Query, middleware, routing::get, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::pages::{error_page_middleware, AppFailure, ErrorResponder};

/// HTTP server for the application's error surface.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig, responder: ErrorResponder) -> Self {
        let router = Self::build_router(&config, responder);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The last layer added runs first: the request ID is set before the
    /// error-page middleware snapshots the request.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, responder: ErrorResponder) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/forbidden", get(forbidden))
            .route("/unauthorized", get(unauthorized))
            .route("/notfound", get(not_found))
            .route("/error", get(internal_error))
            .fallback(fallback)
            .layer(middleware::from_fn_with_state(responder, error_page_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// A clone of the fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a message arrives on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[derive(Debug, Deserialize)]
struct ErrorParams {
    cause: Option<String>,
}

async fn health() -> &'static str {
    "ok"
}

async fn forbidden() -> Result<(), AppFailure> {
    Err(AppFailure::forbidden())
}

async fn unauthorized() -> Result<(), AppFailure> {
    Err(AppFailure::unauthorized())
}

async fn not_found() -> Result<(), AppFailure> {
    Err(AppFailure::not_found())
}

async fn internal_error(Query(params): Query<ErrorParams>) -> Result<(), AppFailure> {
    let cause = params.cause.unwrap_or_else(|| "unhandled failure".to_string());
    Err(AppFailure::internal_msg(cause))
}

async fn fallback() -> AppFailure {
    AppFailure::not_found()
}
