//! Error-page middleware.
//!
//! Captures the request context up front, runs the inner service, then
//! replaces failure responses with rendered error pages:
//! - responses carrying an [`AppFailure`] extension
//! - bare (empty, untyped) 401/403/404/500 responses from other layers
//!
//! Headers set on the replaced response (`WWW-Authenticate`, `Set-Cookie`,
//! ...) are carried onto the page, except the body-describing ones.

use axum::{
    body::{Body, HttpBody},
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::http::request::RequestContext;
use crate::pages::classification::Classification;
use crate::pages::failure::AppFailure;
use crate::pages::responder::{ErrorResponder, FailureDetail};

pub async fn error_page_middleware(
    State(responder): State<ErrorResponder>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_request(&request);
    let mut response = next.run(request).await;

    if let Some(failure) = response.extensions_mut().remove::<AppFailure>() {
        let page = responder.respond(&ctx, failure.classification(), failure.detail());
        return carry_headers(response.headers(), page);
    }

    if is_bare(&response) {
        if let Some(classification) = Classification::from_status(response.status()) {
            let page = responder.respond(&ctx, classification, FailureDetail::default());
            return carry_headers(response.headers(), page);
        }
    }

    response
}

fn carry_headers(from: &HeaderMap, mut page: Response) -> Response {
    for (name, value) in from {
        if name == header::CONTENT_TYPE || name == header::CONTENT_LENGTH {
            continue;
        }
        page.headers_mut().append(name.clone(), value.clone());
    }
    page
}

fn is_bare(response: &Response) -> bool {
    !response.headers().contains_key(header::CONTENT_TYPE)
        && response.body().size_hint().exact() == Some(0)
}
