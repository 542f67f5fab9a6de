//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Error pages produce:
//!     → error_log.rs (request-stamped records)
//!     → sink.rs (tracing / discard / memory)
//!     → metrics.rs (counters)
//!
//! Process setup:
//!     → logging.rs (global tracing subscriber)
//! ```
//!
//! # Design Decisions
//! - The error logger receives its sink by injection; there is no global
//!   logger handle
//! - Request ID flows through every error record
//! - Metrics are cheap (atomic increments)

pub mod error_log;
pub mod logging;
pub mod metrics;
pub mod sink;

pub use error_log::ErrorLogger;
pub use sink::{DiscardSink, LogFields, LogLevel, LogRecord, LogSink, MemorySink, SinkError, TracingSink};
