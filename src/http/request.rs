//! Request model handed to route handlers.
//!
//! The body is buffered once by the pipeline, so handlers get plain bytes
//! plus the request line and headers.

use axum::body::Bytes;
use axum::http::{request::Parts, HeaderMap, Method};
use serde::de::DeserializeOwned;

use crate::errors::ErrorCode;
use crate::http::response::ApiError;

/// A fully buffered request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiRequest {
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers.clone(),
            body,
        }
    }

    /// A request without headers or body.
    pub fn empty(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Deserialize the JSON body. An empty body reads as `{}`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let body: &[u8] = if self.body.is_empty() { b"{}" } else { &self.body };
        serde_json::from_slice(body).map_err(|e| {
            ApiError::new(ErrorCode::InvalidParam).with_detail(format!("Invalid JSON body: {}", e))
        })
    }

    /// First value of query parameter `name`, undecoded.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == name).then_some(value)
        })
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Order {
        symbol: String,
        #[serde(default)]
        qty: u32,
    }

    #[test]
    fn test_json_body() {
        let req = ApiRequest::empty(Method::POST, "/order")
            .with_body(r#"{"symbol":"600000","qty":100}"#);
        assert_eq!(
            req.json::<Order>().unwrap(),
            Order { symbol: "600000".into(), qty: 100 }
        );
    }

    #[test]
    fn test_empty_body_is_empty_object() {
        let req = ApiRequest::empty(Method::POST, "/ping");
        let value: serde_json::Value = req.json().unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn test_bad_json_is_invalid_param() {
        let req = ApiRequest::empty(Method::POST, "/order").with_body("{oops");
        let err = req.json::<Order>().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidParam.code());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.detail().starts_with("Invalid JSON body"));
    }

    #[test]
    fn test_query_param() {
        let mut req = ApiRequest::empty(Method::GET, "/orders");
        req.query = Some("account=A1&flag&side=buy".into());
        assert_eq!(req.query_param("account"), Some("A1"));
        assert_eq!(req.query_param("flag"), Some(""));
        assert_eq!(req.query_param("missing"), None);
    }
}
