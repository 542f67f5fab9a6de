//! Error page subsystem.
//!
//! # Data Flow
//! ```text
//! handler returns Err(AppFailure)        other layer returns bare 404/500
//!     → failure.rs (status + extension)       │
//!     → middleware.rs ◀───────────────────────┘
//!     → responder.rs
//!         → classification.rs (status, template, severity)
//!         → ErrorLogger (one classified record)
//!         → TemplateRenderer or static fallback
//!     → client
//! ```

pub mod classification;
pub mod failure;
pub mod middleware;
pub mod responder;

pub use classification::Classification;
pub use failure::AppFailure;
pub use middleware::error_page_middleware;
pub use responder::{ErrorResponder, FailureDetail};
