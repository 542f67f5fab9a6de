//! StrataForge error page server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request ID ─▶ trace ─▶ timeout ─▶ error pages ─▶ handler
//!                                                          │
//!                                         AppFailure / bare 4xx-5xx
//!                                                          ▼
//!                                                   ErrorResponder
//!                                                   ├─ status code (set first)
//!                                                   ├─ ErrorLogger ─▶ LogSink
//!                                                   └─ TemplateRenderer / fallback
//!     Client Response ◀──────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use strataforge_errors::config::{load_config, AppConfig};
use strataforge_errors::lifecycle::{signals, startup, Shutdown};
use strataforge_errors::observability::{logging, metrics, TracingSink};

#[derive(Parser)]
#[command(name = "strataforge-errors")]
#[command(about = "Serve StrataForge error pages", long_about = None)]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("strataforge-errors v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        templates = ?config.templates.directory,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (server, listener) = startup::prepare(config, Arc::new(TracingSink::new())).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
