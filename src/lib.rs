//! StrataForge error pages.
//!
//! Turns failed requests into consistent HTTP error responses and
//! request-stamped structured log records.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pages;
pub mod templates;

pub use config::AppConfig;
pub use http::{HttpServer, RequestContext, X_REQUEST_ID};
pub use lifecycle::Shutdown;
pub use observability::{ErrorLogger, LogSink};
pub use pages::{AppFailure, Classification, ErrorResponder};
