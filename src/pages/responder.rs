//! Error responder.
//!
//! # Responsibilities
//! - Turn a [`Classification`] into a complete HTTP response
//! - Log exactly one classified entry per failure
//! - Render the page through the injected renderer, or fall back to a
//!   static body
//!
//! # Design Decisions
//! - The status code is set on the response before any rendering starts
//!   and is never touched again
//! - A missing renderer is a normal branch, not a failure
//! - A failed render is logged as its own event and replaced by the
//!   static body; partial output is discarded
//! - Internal causes go to the log only, never to the page

use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue};
use axum::response::Response;
use serde_json::Value;

use crate::http::request::RequestContext;
use crate::observability::error_log::ErrorLogger;
use crate::observability::metrics;
use crate::observability::sink::{LogFields, LogLevel};
use crate::pages::classification::Classification;
use crate::templates::renderer::{fallback_page, PageContext, TemplateRenderer};

/// Event name of the secondary entry written when rendering fails.
pub const RENDER_FAILED_EVENT: &str = "error_page.render_failed";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Optional details accompanying a failure.
#[derive(Debug, Default)]
pub struct FailureDetail<'a> {
    /// Shown on the page instead of the classification's default message.
    pub public_message: Option<&'a str>,
    /// Logged, never shown.
    pub cause: Option<&'a dyn Error>,
    /// Extra fields for the log entry.
    pub fields: LogFields,
}

impl<'a> FailureDetail<'a> {
    pub fn with_cause(cause: &'a dyn Error) -> Self {
        Self {
            cause: Some(cause),
            ..Self::default()
        }
    }
}

/// Builds error responses for every failure classification.
#[derive(Clone)]
pub struct ErrorResponder {
    logger: Arc<ErrorLogger>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
}

impl ErrorResponder {
    /// Responder without a renderer; every page uses the static fallback.
    pub fn new(logger: Arc<ErrorLogger>) -> Self {
        Self {
            logger,
            renderer: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn logger(&self) -> &ErrorLogger {
        &self.logger
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    pub fn forbidden(&self, ctx: &RequestContext) -> Response {
        self.respond(ctx, Classification::Forbidden, FailureDetail::default())
    }

    pub fn unauthorized(&self, ctx: &RequestContext) -> Response {
        self.respond(ctx, Classification::Unauthorized, FailureDetail::default())
    }

    pub fn not_found(&self, ctx: &RequestContext) -> Response {
        self.respond(ctx, Classification::NotFound, FailureDetail::default())
    }

    pub fn internal_error(&self, ctx: &RequestContext, cause: Option<&dyn Error>) -> Response {
        let detail = FailureDetail {
            cause,
            ..FailureDetail::default()
        };
        self.respond(ctx, Classification::InternalError, detail)
    }

    /// Build the response for `classification`.
    pub fn respond(
        &self,
        ctx: &RequestContext,
        classification: Classification,
        detail: FailureDetail<'_>,
    ) -> Response {
        let spec = classification.spec();

        let mut response = Response::new(Body::empty());
        *response.status_mut() = spec.status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));

        self.logger
            .log_classified(ctx, classification, spec.log_message, detail.cause, detail.fields);
        metrics::record_error_response(classification);

        let page = PageContext {
            title: spec.title.to_string(),
            status: spec.status.as_u16(),
            message: Some(detail.public_message.unwrap_or(spec.message).to_string()),
            request_id: ctx.request_id.clone(),
        };
        *response.body_mut() = Body::from(self.render_body(ctx, classification, &page));

        response
    }

    fn render_body(&self, ctx: &RequestContext, classification: Classification, page: &PageContext) -> String {
        let Some(renderer) = &self.renderer else {
            metrics::record_render_fallback("unconfigured");
            return fallback_page(page);
        };

        let template = classification.template_name();
        let mut out = String::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| renderer.render(&mut out, template, page)));

        let mut fields = LogFields::new();
        fields.insert("event".into(), Value::from(RENDER_FAILED_EVENT));
        fields.insert("template".into(), Value::from(template));

        match outcome {
            Ok(Ok(())) => return out,
            Ok(Err(e)) => {
                metrics::record_render_fallback("render_error");
                self.logger
                    .log_event(LogLevel::Error, ctx, "error page render failed", Some(&e), fields);
            }
            Err(_) => {
                metrics::record_render_fallback("render_panic");
                fields.insert("panicked".into(), Value::Bool(true));
                self.logger
                    .log_event(LogLevel::Error, ctx, "error page render failed", None, fields);
            }
        }

        fallback_page(page)
    }
}

impl std::fmt::Debug for ErrorResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorResponder")
            .field("logger", &self.logger)
            .field("has_renderer", &self.has_renderer())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::sink::MemorySink;
    use crate::templates::renderer::RenderError;
    use crate::templates::store::TemplateStore;
    use axum::http::{Method, StatusCode};
    use std::io;

    struct BrokenRenderer;

    impl TemplateRenderer for BrokenRenderer {
        fn render(&self, out: &mut String, _template: &str, _page: &PageContext) -> Result<(), RenderError> {
            out.push_str("<html><body>half a pa");
            Err(RenderError::Write(std::fmt::Error))
        }
    }

    struct PanickingRenderer;

    impl TemplateRenderer for PanickingRenderer {
        fn render(&self, _out: &mut String, _template: &str, _page: &PageContext) -> Result<(), RenderError> {
            panic!("template engine not initialized");
        }
    }

    fn setup() -> (Arc<MemorySink>, ErrorResponder) {
        let sink = Arc::new(MemorySink::new());
        let responder = ErrorResponder::new(Arc::new(ErrorLogger::new(sink.clone())));
        (sink, responder)
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_status_without_renderer() {
        let (sink, responder) = setup();
        let ctx = RequestContext::new(Method::GET, "/any");

        assert_eq!(responder.forbidden(&ctx).status(), StatusCode::FORBIDDEN);
        assert_eq!(responder.unauthorized(&ctx).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(responder.not_found(&ctx).status(), StatusCode::NOT_FOUND);
        assert_eq!(responder.internal_error(&ctx, None).status(), StatusCode::INTERNAL_SERVER_ERROR);

        // One entry per call, no render-failure events for a missing renderer.
        assert_eq!(sink.len(), 4);
    }

    #[tokio::test]
    async fn test_forbidden_scenario() {
        let (sink, responder) = setup();
        let ctx = RequestContext::new(Method::GET, "/forbidden");

        let response = responder.forbidden(&ctx);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()[header::CONTENT_TYPE], HTML_CONTENT_TYPE);
        assert!(body_text(response).await.contains("403 Forbidden"));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field_str("classification"), Some("forbidden"));
        assert_eq!(records[0].field_str("path"), Some("/forbidden"));
        assert_eq!(records[0].level, LogLevel::Warn);
    }

    #[tokio::test]
    async fn test_internal_error_scenario() {
        let (sink, responder) = setup();
        let ctx = RequestContext::new(Method::GET, "/error");
        let cause = io::Error::new(io::ErrorKind::TimedOut, "db timeout");

        let response = responder.internal_error(&ctx, Some(&cause));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // The cause stays out of the page.
        assert!(!body_text(response).await.contains("db timeout"));

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, LogLevel::Error);
        assert!(records[0].field_str("cause").unwrap().contains("db timeout"));
    }

    #[tokio::test]
    async fn test_renders_template() {
        let (sink, responder) = setup();
        let store = TemplateStore::new().with_template("not_found", "<main>{{ status }}: {{ message }}</main>");
        let responder = responder.with_renderer(Arc::new(store));
        let ctx = RequestContext::new(Method::GET, "/missing").with_request_id("req-7");

        let detail = FailureDetail {
            public_message: Some("No such invoice"),
            ..FailureDetail::default()
        };
        let response = responder.respond(&ctx, Classification::NotFound, detail);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "<main>404: No such invoice</main>");
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_template_falls_back() {
        let (sink, responder) = setup();
        let responder = responder.with_renderer(Arc::new(TemplateStore::new()));
        let ctx = RequestContext::new(Method::GET, "/unauthorized");

        let response = responder.unauthorized(&ctx);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(body_text(response).await.contains("<h1>401 Unauthorized</h1>"));

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].field_str("classification"), Some("unauthorized"));
        assert_eq!(records[1].field_str("event"), Some(RENDER_FAILED_EVENT));
        assert_eq!(records[1].field_str("template"), Some("unauthorized"));
        assert!(records[1].field_str("cause").unwrap().contains("unauthorized"));

        // Only the original entry carries the classification.
        let tagged = records
            .iter()
            .filter(|r| r.field_str("classification") == Some("unauthorized"))
            .count();
        assert_eq!(tagged, 1);
    }

    #[tokio::test]
    async fn test_partial_render_is_discarded() {
        let (sink, responder) = setup();
        let responder = responder.with_renderer(Arc::new(BrokenRenderer));
        let ctx = RequestContext::new(Method::GET, "/error");

        let response = responder.internal_error(&ctx, None);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert!(!body.contains("half a pa"));
        assert!(body.contains("500 Internal Server Error"));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_panicking_renderer_keeps_status() {
        let (sink, responder) = setup();
        let responder = responder.with_renderer(Arc::new(PanickingRenderer));
        let ctx = RequestContext::new(Method::GET, "/forbidden");

        let response = responder.forbidden(&ctx);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].field("panicked"), Some(&Value::Bool(true)));
        assert!(records[1].field("classification").is_none());
    }

    #[test]
    fn test_detail_with_cause() {
        let (sink, responder) = setup();
        let ctx = RequestContext::new(Method::POST, "/imports");
        let cause = io::Error::new(io::ErrorKind::InvalidData, "bad csv header");

        let response = responder.respond(&ctx, Classification::InternalError, FailureDetail::with_cause(&cause));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(sink.records()[0].field_str("cause").unwrap().contains("bad csv header"));
        assert_eq!(responder.logger().dropped(), 0);
    }

    #[test]
    fn test_extra_fields_reach_log() {
        let (sink, responder) = setup();
        let ctx = RequestContext::new(Method::DELETE, "/projects/7");
        let mut detail = FailureDetail::default();
        detail.fields.insert("project_id".into(), Value::from(7));

        responder.respond(&ctx, Classification::Forbidden, detail);

        let record = &sink.records()[0];
        assert_eq!(record.field("project_id"), Some(&Value::from(7)));
        assert_eq!(record.field_str("method"), Some("DELETE"));
    }
}
