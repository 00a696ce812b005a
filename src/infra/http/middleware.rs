use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{
        HeaderValue, Request,
        header::{ACCEPT_LANGUAGE, AUTHORIZATION, CACHE_CONTROL, CONTENT_LANGUAGE, VARY},
    },
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::{error::ErrorReport, viewer::Viewer};
use crate::domain::types::LanguageCode;

use super::HttpState;

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

/// Active language and privilege resolved for one request.
#[derive(Debug, Clone)]
pub struct Visitor {
    pub language: LanguageCode,
    pub viewer: Viewer,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Negotiate the language and resolve staff privilege from request headers.
pub async fn resolve_visitor(
    State(state): State<HttpState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let headers = request.headers();
    let language = state
        .languages
        .negotiate(header_str(headers.get(ACCEPT_LANGUAGE)));
    let viewer = state.staff.resolve(header_str(headers.get(AUTHORIZATION)));

    let visitor = Visitor { language, viewer };
    request.extensions_mut().insert(visitor.clone());

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(visitor.language.as_str()) {
        headers.insert(CONTENT_LANGUAGE, value);
    }
    headers.insert(VARY, HeaderValue::from_static("Accept-Language, Authorization"));
    if visitor.viewer.is_staff() {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("private, no-store"));
    }

    response.extensions_mut().insert(visitor);
    response
}

fn header_str(value: Option<&HeaderValue>) -> Option<&str> {
    value.and_then(|value| value.to_str().ok())
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let response = next.run(request).await;
    let status = response.status();

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let (language, staff) = match response.extensions().get::<Visitor>() {
            Some(visitor) => (visitor.language.to_string(), visitor.viewer.is_staff()),
            None => (String::new(), false),
        };
        let report = response.extensions().get::<ErrorReport>().cloned();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "cms_blog::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                language = language,
                staff = staff,
                "request failed",
            );
        } else {
            warn!(
                target = "cms_blog::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                language = language,
                staff = staff,
                "client request error",
            );
        }
    }

    response
}
