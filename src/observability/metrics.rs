//! Metrics collection and exposition.
//!
//! # Metrics
//! - `error_responses_total` (counter): error pages served, by classification and status
//! - `error_page_render_fallbacks_total` (counter): static fallback bodies, by reason
//! - `error_log_dropped_total` (counter): records the log sink refused
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, so tests need no setup
//! - The Prometheus exporter is opt-in from config

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::pages::classification::Classification;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_error_response(classification: Classification) {
    metrics::counter!(
        "error_responses_total",
        "classification" => classification.as_str(),
        "status" => classification.status().as_u16().to_string()
    )
    .increment(1);
}

pub fn record_render_fallback(reason: &'static str) {
    metrics::counter!("error_page_render_fallbacks_total", "reason" => reason).increment(1);
}

pub fn record_log_dropped() {
    metrics::counter!("error_log_dropped_total").increment(1);
}
