//! JSON response envelopes.
//!
//! Every body the service writes is one of two shapes:
//!
//! ```text
//! {"status": "success", "data": <any>}
//! {"status": "error", "error_code": <int>, "message": <string>, "detail": <string>?}
//! ```
//!
//! Field order is fixed by struct declaration order.

use serde::Serialize;
use serde_json::Value;

const STATUS_SUCCESS: &str = "success";
const STATUS_ERROR: &str = "error";

/// Error envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub error_code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    /// Build an error envelope; an empty detail is dropped.
    pub fn new(error_code: i32, message: impl Into<String>, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self {
            status: STATUS_ERROR,
            error_code,
            message: message.into(),
            detail: (!detail.is_empty()).then_some(detail),
        }
    }
}

/// Success envelope wrapping arbitrary data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessResponse {
    pub status: &'static str,
    pub data: Value,
}

impl SuccessResponse {
    pub fn new(data: Value) -> Self {
        Self {
            status: STATUS_SUCCESS,
            data,
        }
    }
}

impl Default for SuccessResponse {
    fn default() -> Self {
        Self::new(Value::Object(Default::default()))
    }
}

/// Exactly one of the two envelope shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Success(SuccessResponse),
    Error(ErrorResponse),
}

impl ResponseEnvelope {
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success(_))
    }

    pub fn to_value(&self) -> Value {
        // Serializing these structs into a Value cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Indented JSON text, two spaces per level.
    pub fn to_json_string(&self) -> String {
        to_pretty_json(self)
    }
}

impl From<SuccessResponse> for ResponseEnvelope {
    fn from(r: SuccessResponse) -> Self {
        ResponseEnvelope::Success(r)
    }
}

impl From<ErrorResponse> for ResponseEnvelope {
    fn from(r: ErrorResponse) -> Self {
        ResponseEnvelope::Error(r)
    }
}

pub(crate) fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize response body");
        String::from("{}")
    })
}
