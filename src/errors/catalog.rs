//! Error code registry.
//!
//! Maps integer error codes to a short message and a default detail. Any
//! code without an entry resolves to [`ErrorCode::UnknownError`], so a
//! lookup never fails.

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::envelope::{ErrorResponse, ResponseEnvelope, SuccessResponse};

/// Codes known to the service. The wire value is the discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,
    NotInitialized = 1001,
    LoginFailed = 1002,
    InvalidParam = 1003,
    OrderFailed = 1004,
    NetworkError = 1005,
    ConfigError = 1006,
    SdkError = 1007,
    Timeout = 1008,
    UnknownError = 9999,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 10] = [
        ErrorCode::Success,
        ErrorCode::NotInitialized,
        ErrorCode::LoginFailed,
        ErrorCode::InvalidParam,
        ErrorCode::OrderFailed,
        ErrorCode::NetworkError,
        ErrorCode::ConfigError,
        ErrorCode::SdkError,
        ErrorCode::Timeout,
        ErrorCode::UnknownError,
    ];

    pub fn code(self) -> i32 {
        self as i32
    }

    fn defaults(self) -> (&'static str, &'static str) {
        match self {
            ErrorCode::Success => ("Success", "Operation completed successfully"),
            ErrorCode::NotInitialized => ("Not Initialized", "Service or SDK is not initialized"),
            ErrorCode::LoginFailed => ("Login Failed", "Failed to login to trading account"),
            ErrorCode::InvalidParam => {
                ("Invalid Parameter", "Invalid or missing parameter in request")
            }
            ErrorCode::OrderFailed => ("Order Failed", "Failed to place or cancel order"),
            ErrorCode::NetworkError => ("Network Error", "Network connection error occurred"),
            ErrorCode::ConfigError => (
                "Configuration Error",
                "Configuration file error or missing configuration",
            ),
            ErrorCode::SdkError => ("SDK Error", "OX SDK internal error"),
            ErrorCode::Timeout => ("Timeout", "Operation timeout"),
            ErrorCode::UnknownError => ("Unknown Error", "An unknown error occurred"),
        }
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: i32,
    pub message: String,
    pub detail: String,
}

/// Registry of error entries, built once and shared read-only.
#[derive(Debug, Clone)]
pub struct ErrorCatalog {
    entries: HashMap<i32, ErrorInfo>,
    unknown: ErrorInfo,
}

impl Default for ErrorCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorCatalog {
    pub fn new() -> Self {
        let entries = ErrorCode::ALL
            .iter()
            .map(|&code| {
                let (message, detail) = code.defaults();
                (
                    code.code(),
                    ErrorInfo {
                        code: code.code(),
                        message: message.to_string(),
                        detail: detail.to_string(),
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        let (message, detail) = ErrorCode::UnknownError.defaults();
        let unknown = ErrorInfo {
            code: ErrorCode::UnknownError.code(),
            message: message.to_string(),
            detail: detail.to_string(),
        };

        Self { entries, unknown }
    }

    /// Entry for `code`, or the unknown entry if it is not registered.
    pub fn get_error_info(&self, code: impl Into<i32>) -> &ErrorInfo {
        self.entries.get(&code.into()).unwrap_or(&self.unknown)
    }

    pub fn get_error_message(&self, code: impl Into<i32>) -> &str {
        &self.get_error_info(code).message
    }

    /// Error envelope for `code`. A non-empty `detail` overrides the
    /// catalog's default detail.
    ///
    /// The envelope carries the code as given, even when the message comes
    /// from the unknown entry.
    pub fn create_error_response(&self, code: impl Into<i32>, detail: &str) -> ErrorResponse {
        let code = code.into();
        let info = self.get_error_info(code);
        let detail = if detail.is_empty() {
            info.detail.as_str()
        } else {
            detail
        };
        ErrorResponse::new(code, info.message.clone(), detail)
    }

    pub fn create_success_response(data: Value) -> SuccessResponse {
        SuccessResponse::new(data)
    }

    /// Indented JSON body for an error code.
    pub fn to_json_string(&self, code: impl Into<i32>, detail: &str) -> String {
        ResponseEnvelope::from(self.create_error_response(code, detail)).to_json_string()
    }
}
