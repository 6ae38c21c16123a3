//! Handler outcomes.
//!
//! Handlers return a [`HandlerResult`]: `Ok` carries a success envelope (or
//! a raw JSON body for endpoints with their own shape, like `/health`),
//! `Err` carries an error code the pipeline resolves through the
//! [`ErrorCatalog`]. Panics are not part of this contract; the pipeline
//! catches them separately.

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::errors::envelope::to_pretty_json;
use crate::errors::{ErrorCatalog, ErrorCode, ErrorResponse, ResponseEnvelope, SuccessResponse};

pub type HandlerResult = Result<ApiResponse, ApiError>;

/// Body of a successful reply. The envelope stays a struct until it is
/// written so `status` always precedes `data`.
#[derive(Debug, Clone, PartialEq)]
enum ReplyBody {
    Envelope(ResponseEnvelope),
    Raw(Value),
}

/// Successful handler output.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    status: StatusCode,
    body: ReplyBody,
}

impl ApiResponse {
    /// `200` with `{"status":"success","data":data}`.
    pub fn success(data: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: ReplyBody::Envelope(SuccessResponse::new(data).into()),
        }
    }

    /// Success envelope around any serializable value.
    pub fn from_serialize<T: Serialize>(data: &T) -> HandlerResult {
        let value = serde_json::to_value(data).map_err(|e| {
            ApiError::new(ErrorCode::UnknownError)
                .with_status(StatusCode::INTERNAL_SERVER_ERROR)
                .with_detail(e.to_string())
        })?;
        Ok(Self::success(value))
    }

    /// A body outside the envelope contract.
    pub fn raw(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: ReplyBody::Raw(body),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The body as a JSON value.
    pub fn body(&self) -> Value {
        match &self.body {
            ReplyBody::Envelope(envelope) => envelope.to_value(),
            ReplyBody::Raw(value) => value.clone(),
        }
    }

    pub fn to_json_string(&self) -> String {
        match &self.body {
            ReplyBody::Envelope(envelope) => envelope.to_json_string(),
            ReplyBody::Raw(value) => to_pretty_json(value),
        }
    }
}

/// Expected failure reported by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    code: i32,
    detail: String,
}

impl ApiError {
    /// Error for `code` with HTTP 400 and the catalog's default detail.
    pub fn new(code: impl Into<i32>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: code.into(),
            detail: String::new(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn invalid_param(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParam).with_detail(detail)
    }

    pub fn not_initialized() -> Self {
        Self::new(ErrorCode::NotInitialized).with_status(StatusCode::SERVICE_UNAVAILABLE)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Resolve message and default detail through `catalog`.
    pub fn to_envelope(&self, catalog: &ErrorCatalog) -> ErrorResponse {
        catalog.create_error_response(self.code, &self.detail)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error {} ({})", self.code, self.status)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}
