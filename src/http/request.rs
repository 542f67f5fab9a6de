//! Request context capture.
//!
//! # Responsibilities
//! - Snapshot the request facts error handling needs (method, path,
//!   remote address, request ID)
//! - Generate and propagate the `x-request-id` header
//!
//! # Design Decisions
//! - The snapshot is owned, so it can outlive the request it came from
//!   (the error-page middleware captures it before calling the handler)
//! - Request ID added as early as possible for tracing

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{request::Parts, Extensions, HeaderMap, HeaderName, Method, Request, Uri};
use serde_json::Value;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::observability::sink::LogFields;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that assigns a UUID v4 request ID when the client sent none.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Per-request facts attached to every error log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub remote_addr: Option<SocketAddr>,
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            remote_addr: None,
            request_id: None,
        }
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Capture the context of a full request.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self::capture(req.method(), req.uri(), req.headers(), req.extensions())
    }

    /// Capture the context from request parts.
    pub fn from_parts(parts: &Parts) -> Self {
        Self::capture(&parts.method, &parts.uri, &parts.headers, &parts.extensions)
    }

    fn capture(method: &Method, uri: &Uri, headers: &HeaderMap, extensions: &Extensions) -> Self {
        let request_id = headers
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let remote_addr = extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            method: method.clone(),
            path: uri.path().to_string(),
            remote_addr,
            request_id,
        }
    }

    /// Default fields for a log entry about this request.
    pub fn log_fields(&self) -> LogFields {
        let mut fields = LogFields::new();
        fields.insert("method".into(), Value::from(self.method.as_str()));
        fields.insert("path".into(), Value::from(self.path.as_str()));
        if let Some(addr) = self.remote_addr {
            fields.insert("remote_addr".into(), Value::from(addr.to_string()));
        }
        if let Some(id) = &self.request_id {
            fields.insert("request_id".into(), Value::from(id.as_str()));
        }
        fields
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
