//! Failure classification table.
//!
//! Each [`Classification`] maps to exactly one row: status code, template
//! name, log severity, page title and the default message shown to the
//! client. Everything downstream reads the row; nothing matches on the
//! variant to pick a status.

use std::fmt;

use axum::http::StatusCode;
use serde::Serialize;

use crate::observability::sink::LogLevel;

/// Category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Forbidden,
    Unauthorized,
    NotFound,
    InternalError,
}

/// Row of the classification table.
#[derive(Debug)]
pub struct ClassificationSpec {
    pub status: StatusCode,
    pub template: &'static str,
    pub severity: LogLevel,
    pub title: &'static str,
    pub message: &'static str,
    /// Message written to the error log.
    pub log_message: &'static str,
}

static FORBIDDEN: ClassificationSpec = ClassificationSpec {
    status: StatusCode::FORBIDDEN,
    template: "forbidden",
    severity: LogLevel::Warn,
    title: "Forbidden",
    message: "You do not have permission to access this page.",
    log_message: "request forbidden",
};

static UNAUTHORIZED: ClassificationSpec = ClassificationSpec {
    status: StatusCode::UNAUTHORIZED,
    template: "unauthorized",
    severity: LogLevel::Warn,
    title: "Unauthorized",
    message: "You need to sign in to access this page.",
    log_message: "request unauthorized",
};

static NOT_FOUND: ClassificationSpec = ClassificationSpec {
    status: StatusCode::NOT_FOUND,
    template: "not_found",
    severity: LogLevel::Info,
    title: "Page Not Found",
    message: "The page you are looking for does not exist.",
    log_message: "resource not found",
};

static INTERNAL_ERROR: ClassificationSpec = ClassificationSpec {
    status: StatusCode::INTERNAL_SERVER_ERROR,
    template: "internal_error",
    severity: LogLevel::Error,
    title: "Internal Server Error",
    message: "Something went wrong on our side. Please try again later.",
    log_message: "internal server error",
};

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::Forbidden,
        Classification::Unauthorized,
        Classification::NotFound,
        Classification::InternalError,
    ];

    pub fn spec(self) -> &'static ClassificationSpec {
        match self {
            Classification::Forbidden => &FORBIDDEN,
            Classification::Unauthorized => &UNAUTHORIZED,
            Classification::NotFound => &NOT_FOUND,
            Classification::InternalError => &INTERNAL_ERROR,
        }
    }

    pub fn status(self) -> StatusCode {
        self.spec().status
    }

    pub fn template_name(self) -> &'static str {
        self.spec().template
    }

    pub fn severity(self) -> LogLevel {
        self.spec().severity
    }

    /// Reverse lookup, used to dress up bare error responses.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.status() == status)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Forbidden => "forbidden",
            Classification::Unauthorized => "unauthorized",
            Classification::NotFound => "not_found",
            Classification::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
