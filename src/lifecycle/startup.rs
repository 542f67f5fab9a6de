//! Startup orchestration.
//!
//! # Responsibilities
//! - Load error page templates from the configured directory
//! - Assemble the error logger and responder
//! - Bind the listener
//!
//! # Design Decisions
//! - Fail fast: a configured but unreadable template directory is fatal
//! - No template directory configured is valid (static fallback pages)

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::observability::error_log::ErrorLogger;
use crate::observability::sink::LogSink;
use crate::pages::ErrorResponder;
use crate::templates::{TemplateLoadError, TemplateStore};

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to load templates: {0}")]
    Templates(#[from] TemplateLoadError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Build the responder described by `config`, logging to `sink`.
pub fn build_responder(config: &AppConfig, sink: Arc<dyn LogSink>) -> Result<ErrorResponder, StartupError> {
    let logger = Arc::new(ErrorLogger::new(sink));
    let responder = ErrorResponder::new(logger);

    match &config.templates.directory {
        Some(dir) => {
            let store = TemplateStore::load_dir(dir, &config.templates.extension)?;
            Ok(responder.with_renderer(Arc::new(store)))
        }
        None => {
            tracing::info!("No template directory configured, using static error pages");
            Ok(responder)
        }
    }
}

/// Build the server and bind its listener.
pub async fn prepare(config: AppConfig, sink: Arc<dyn LogSink>) -> Result<(HttpServer, TcpListener), StartupError> {
    let responder = build_responder(&config, sink)?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    Ok((HttpServer::new(config, responder), listener))
}
