//! Structured log sinks.
//!
//! # Responsibilities
//! - Define the record shape handed to a sink ([`LogRecord`])
//! - Define the sink capability ([`LogSink`])
//! - Provide the production sink (`tracing`), a discard sink, and an
//!   in-memory capture sink
//!
//! # Design Decisions
//! - Sinks are injected, never looked up from a global
//! - Field keys are dynamic, so the field map travels as one JSON value
//!   when forwarded to `tracing`

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;
use tracing::Dispatch;

/// Target used for every event emitted by [`TracingSink`].
pub const LOG_TARGET: &str = "strataforge::errors";

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named structured fields attached to a record.
pub type LogFields = BTreeMap<String, Value>;

/// One structured log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub message: String,
    pub fields: LogFields,
}

impl LogRecord {
    /// Look up a field by key.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Look up a string-valued field by key.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

/// Error returned by a sink that could not accept a record.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("log sink unavailable: {0}")]
    Unavailable(String),

    #[error("failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Destination for structured log records.
///
/// Implementations must be safe to call from many request tasks at once;
/// callers add no locking of their own.
pub trait LogSink: Send + Sync {
    fn log(&self, record: &LogRecord) -> Result<(), SinkError>;
}

/// Forwards records to `tracing`.
///
/// Without a bound dispatcher, events go to whatever subscriber is current
/// for the calling thread.
#[derive(Clone, Default)]
pub struct TracingSink {
    dispatch: Option<Dispatch>,
}

impl TracingSink {
    pub fn new() -> Self {
        Self { dispatch: None }
    }

    /// Route every event through `dispatch` instead of the current default.
    pub fn with_dispatch(dispatch: Dispatch) -> Self {
        Self {
            dispatch: Some(dispatch),
        }
    }
}

impl fmt::Debug for TracingSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingSink")
            .field("bound_dispatch", &self.dispatch.is_some())
            .finish()
    }
}

impl LogSink for TracingSink {
    fn log(&self, record: &LogRecord) -> Result<(), SinkError> {
        let fields = serde_json::to_string(&record.fields)?;
        match &self.dispatch {
            Some(dispatch) => {
                tracing::dispatcher::with_default(dispatch, || emit(record, &fields))
            }
            None => emit(record, &fields),
        }
        Ok(())
    }
}

fn emit(record: &LogRecord, fields: &str) {
    let message = record.message.as_str();
    match record.level {
        LogLevel::Error => tracing::error!(target: LOG_TARGET, fields = %fields, "{}", message),
        LogLevel::Warn => tracing::warn!(target: LOG_TARGET, fields = %fields, "{}", message),
        LogLevel::Info => tracing::info!(target: LOG_TARGET, fields = %fields, "{}", message),
        LogLevel::Debug => tracing::debug!(target: LOG_TARGET, fields = %fields, "{}", message),
    }
}

/// Accepts and drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl LogSink for DiscardSink {
    fn log(&self, _record: &LogRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured records, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Remove and return the captured records.
    pub fn take(&self) -> Vec<LogRecord> {
        match self.records.lock() {
            Ok(mut records) => std::mem::take(&mut *records),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn log(&self, record: &LogRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .map_err(|_| SinkError::Unavailable("memory sink lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}
