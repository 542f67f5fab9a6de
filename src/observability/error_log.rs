//! Request-aware error logger.
//!
//! Wraps a [`LogSink`] and stamps every record with the request's method,
//! path, remote address and request ID. Logging is best effort: a sink that
//! errors or panics costs one dropped record, never the request.

use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::http::request::RequestContext;
use crate::observability::metrics;
use crate::observability::sink::{DiscardSink, LogFields, LogLevel, LogRecord, LogSink};
use crate::pages::classification::Classification;

/// Structured error logger shared by all request tasks.
#[derive(Clone)]
pub struct ErrorLogger {
    sink: Arc<dyn LogSink>,
    dropped: Arc<AtomicU64>,
}

impl ErrorLogger {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Logger that drops everything.
    pub fn discard() -> Self {
        Self::new(Arc::new(DiscardSink))
    }

    /// Write one error-level entry for `ctx`.
    pub fn log(&self, ctx: &RequestContext, message: &str, cause: Option<&dyn Error>) {
        self.log_event(LogLevel::Error, ctx, message, cause, LogFields::new());
    }

    /// Like [`log`](Self::log), with extra fields merged over the defaults.
    pub fn log_with_fields<I, K>(
        &self,
        ctx: &RequestContext,
        message: &str,
        cause: Option<&dyn Error>,
        fields: I,
    ) where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let extra = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.log_event(LogLevel::Error, ctx, message, cause, extra);
    }

    /// Entry tagged with a classification, at the classification's severity.
    pub fn log_classified(
        &self,
        ctx: &RequestContext,
        classification: Classification,
        message: &str,
        cause: Option<&dyn Error>,
        fields: LogFields,
    ) {
        let mut extra = LogFields::new();
        extra.insert("classification".into(), Value::from(classification.as_str()));
        extra.insert("status".into(), Value::from(classification.status().as_u16()));
        extra.extend(fields);
        self.log_event(classification.severity(), ctx, message, cause, extra);
    }

    pub fn log_event(
        &self,
        level: LogLevel,
        ctx: &RequestContext,
        message: &str,
        cause: Option<&dyn Error>,
        extra: LogFields,
    ) {
        let mut fields = ctx.log_fields();
        fields.insert(
            "cause".into(),
            cause.map_or(Value::Null, |err| Value::String(cause_chain(err))),
        );
        fields.extend(extra);

        self.write(LogRecord {
            level,
            message: message.to_string(),
            fields,
        });
    }

    /// Number of records the sink failed to accept.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn write(&self, record: LogRecord) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.sink.log(&record)));
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::record_log_dropped();
                tracing::debug!(error = %e, "Error log sink rejected record");
            }
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                metrics::record_log_dropped();
                tracing::debug!("Error log sink panicked");
            }
        }
    }
}

impl std::fmt::Debug for ErrorLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorLogger")
            .field("dropped", &self.dropped())
            .finish_non_exhaustive()
    }
}

/// Render an error and its `source()` chain as `outer: inner: root`.
pub fn cause_chain(err: &dyn Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}
