//! Handler-facing failure type.
//!
//! Handlers return `Result<_, AppFailure>`. Turning an `AppFailure` into a
//! response only sets the status and parks the failure in the response
//! extensions; [`error_page_middleware`](crate::pages::middleware::error_page_middleware)
//! picks it up and builds the real page with the request's context.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};

use crate::pages::classification::Classification;
use crate::pages::responder::FailureDetail;

/// Shared, cloneable error cause.
pub type SharedCause = Arc<dyn Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct CauseMessage(String);

/// A classified request failure.
#[derive(Debug, Clone)]
pub struct AppFailure {
    classification: Classification,
    public_message: Option<String>,
    cause: Option<SharedCause>,
}

impl AppFailure {
    pub fn new(classification: Classification) -> Self {
        Self {
            classification,
            public_message: None,
            cause: None,
        }
    }

    pub fn forbidden() -> Self {
        Self::new(Classification::Forbidden)
    }

    pub fn unauthorized() -> Self {
        Self::new(Classification::Unauthorized)
    }

    pub fn not_found() -> Self {
        Self::new(Classification::NotFound)
    }

    /// Internal error caused by `err`.
    pub fn internal<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::new(Classification::InternalError).with_cause(err)
    }

    /// Internal error with a plain-text cause.
    pub fn internal_msg(cause: impl Into<String>) -> Self {
        Self::internal(CauseMessage(cause.into()))
    }

    /// Replace the default message shown on the page.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.public_message = Some(message.into());
        self
    }

    pub fn with_cause<E>(mut self, err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(err));
        self
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn cause(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Borrowed view handed to the responder.
    pub fn detail(&self) -> FailureDetail<'_> {
        FailureDetail {
            public_message: self.public_message.as_deref(),
            cause: self.cause.as_deref().map(|c| c as &dyn Error),
            ..FailureDetail::default()
        }
    }
}

impl fmt::Display for AppFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.classification.spec().log_message)?;
        if let Some(cause) = &self.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl Error for AppFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn Error + 'static))
    }
}

impl From<Classification> for AppFailure {
    fn from(classification: Classification) -> Self {
        Self::new(classification)
    }
}

impl IntoResponse for AppFailure {
    fn into_response(self) -> Response {
        let mut response = self.classification.status().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::io;

    #[test]
    fn test_into_response_parks_failure() {
        let response = AppFailure::internal_msg("db timeout").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let failure = response.extensions().get::<AppFailure>().unwrap();
        assert_eq!(failure.classification(), Classification::InternalError);
        assert_eq!(failure.cause().unwrap().to_string(), "db timeout");
    }

    #[test]
    fn test_display_and_source() {
        let failure = AppFailure::internal(io::Error::new(io::ErrorKind::Other, "disk full"));
        assert_eq!(failure.to_string(), "internal server error: disk full");
        assert_eq!(failure.source().unwrap().to_string(), "disk full");

        let failure = AppFailure::forbidden();
        assert_eq!(failure.to_string(), "request forbidden");
        assert!(failure.source().is_none());
    }

    #[test]
    fn test_detail_view() {
        let failure = AppFailure::not_found().with_message("No such project");
        let detail = failure.detail();
        assert_eq!(detail.public_message, Some("No such project"));
        assert!(detail.cause.is_none());
    }

    #[test]
    fn test_from_classification() {
        let response = AppFailure::from(Classification::Unauthorized).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let failure: AppFailure = Classification::Forbidden.into();
        assert!(failure.cause().is_none());
        assert!(failure.detail().public_message.is_none());
    }
}
