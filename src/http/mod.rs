//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, RequestContext snapshot)
//!     → handlers
//!     → pages::middleware (failures become error pages)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{RequestContext, X_REQUEST_ID};
pub use server::HttpServer;
