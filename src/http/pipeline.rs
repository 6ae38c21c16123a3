//! Request pipeline shared by every route.
//!
//! # Order
//! ```text
//! request
//!     → pipeline (OPTIONS? → 200 + CORS, handler never runs)
//!     → buffer body
//!     → CatchPanicLayer (panic → 500 UNKNOWN_ERROR envelope)
//!     → dispatch (exact route lookup, 404 NETWORK_ERROR fallback)
//!     → pipeline (CORS headers, access log)
//! response
//! ```
//!
//! There are no axum routes: `dispatch` is the router's only fallback, so
//! "not found" has exactly one implementation.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};

use crate::errors::{ErrorCatalog, ErrorCode, ResponseEnvelope};
use crate::http::request::ApiRequest;
use crate::http::response::ApiError;
use crate::observability::LogSink;
use crate::routing::RouteTable;
use crate::{log_debug, log_error, log_info};

/// Largest request body accepted (2 MiB).
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";
const MAX_AGE: &str = "3600";

/// Cross-origin headers written on every response when enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub enabled: bool,
    pub origin: String,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            origin: "*".to_string(),
        }
    }
}

impl CorsPolicy {
    pub fn apply(&self, headers: &mut HeaderMap) {
        if !self.enabled {
            return;
        }
        let origin =
            HeaderValue::from_str(&self.origin).unwrap_or_else(|_| HeaderValue::from_static("*"));
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE));
    }
}

/// Everything the pipeline needs, fixed for the lifetime of a listener.
#[derive(Clone)]
pub struct PipelineState {
    pub routes: Arc<RouteTable>,
    pub catalog: Arc<ErrorCatalog>,
    pub sink: Arc<LogSink>,
    pub cors: CorsPolicy,
    pub request_logging: bool,
}

/// Build the axum application serving `state.routes`.
pub fn build_app(state: PipelineState) -> Router {
    let fault = FaultBoundary {
        catalog: state.catalog.clone(),
        sink: state.sink.clone(),
    };

    Router::new()
        .fallback(dispatch)
        .layer(CatchPanicLayer::custom(fault))
        .layer(middleware::from_fn_with_state(state.clone(), pipeline))
        .with_state(state)
}

fn json_response(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        body,
    )
        .into_response()
}

fn error_response(catalog: &ErrorCatalog, err: &ApiError) -> Response {
    let body = ResponseEnvelope::from(err.to_envelope(catalog)).to_json_string();
    json_response(err.status(), body)
}

async fn pipeline(State(state): State<PipelineState>, request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::OK.into_response();
        state.cors.apply(response.headers_mut());
        return response;
    }

    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let (parts, body) = request.into_parts();
    let (mut response, body_len) = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => {
            let len = bytes.len();
            let request = Request::from_parts(parts, Body::from(bytes));
            (next.run(request).await, len)
        }
        Err(e) => {
            let err = ApiError::invalid_param(format!("Failed to read request body: {}", e))
                .with_status(StatusCode::PAYLOAD_TOO_LARGE);
            (error_response(&state.catalog, &err), 0)
        }
    };

    state.cors.apply(response.headers_mut());

    if state.request_logging {
        let status = response.status().as_u16();
        if body_len > 0 {
            log_info!(state.sink, "{} {} - {} (body: {} bytes)", method, path, status, body_len);
        } else {
            log_info!(state.sink, "{} {} - {}", method, path, status);
        }
        log_debug!(state.sink, "Request completed in {}ms", started.elapsed().as_millis());
    }

    response
}

async fn dispatch(State(state): State<PipelineState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let Some(handler) = state.routes.get(&parts.method, parts.uri.path()).cloned() else {
        let err = ApiError::new(ErrorCode::NetworkError)
            .with_status(StatusCode::NOT_FOUND)
            .with_detail("Request handler not found");
        return error_response(&state.catalog, &err);
    };

    // Already buffered by `pipeline`; this only unwraps the bytes.
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = ApiError::invalid_param(e.to_string());
            return error_response(&state.catalog, &err);
        }
    };

    match handler.call(ApiRequest::from_parts(&parts, body)).await {
        Ok(reply) => json_response(reply.status(), reply.to_json_string()),
        Err(err) => error_response(&state.catalog, &err),
    }
}

/// Converts a handler panic into the UNKNOWN_ERROR envelope.
#[derive(Clone)]
struct FaultBoundary {
    catalog: Arc<ErrorCatalog>,
    sink: Arc<LogSink>,
}

impl ResponseForPanic for FaultBoundary {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Body> {
        let detail = panic_text(err.as_ref());
        log_error!(self.sink, "Exception in route handler: {}", detail);

        let err = ApiError::new(ErrorCode::UnknownError)
            .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            .with_detail(detail);
        error_response(&self.catalog, &err)
    }
}

fn panic_text(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Internal server error".to_string()
    }
}
