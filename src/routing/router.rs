//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store handlers under an exact (method, path) key
//! - Look up the handler for a request
//! - Return matched handler or explicit no-match
//!
//! # Design Decisions
//! - Exact matching only; no path parameters or wildcards
//! - Last registration wins on key collision
//! - Frozen into an `Arc` when the server starts, read-only afterwards
//!   (thread-safe without locks)

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::http::Method;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::http::request::ApiRequest;
use crate::http::response::HandlerResult;

/// A request handler.
///
/// Implemented for any `Fn(ApiRequest) -> impl Future<Output = HandlerResult>`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, request: ApiRequest) -> BoxFuture<'static, HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(ApiRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, request: ApiRequest) -> BoxFuture<'static, HandlerResult> {
        (self)(request).boxed()
    }
}

pub type BoxedHandler = Arc<dyn Handler>;

/// Handlers keyed by method, then exact path.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: HashMap<Method, HashMap<String, BoxedHandler>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler`; returns true if it replaced an existing route.
    pub fn insert<H: Handler>(&mut self, method: Method, path: impl Into<String>, handler: H) -> bool {
        self.routes
            .entry(method)
            .or_default()
            .insert(path.into(), Arc::new(handler))
            .is_some()
    }

    pub fn get(&self, method: &Method, path: &str) -> Option<&BoxedHandler> {
        self.routes.get(method).and_then(|paths| paths.get(path))
    }

    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.get(method, path).is_some()
    }

    /// Whether any method is registered for `path`.
    pub fn has_path(&self, path: &str) -> bool {
        self.routes.values().any(|paths| paths.contains_key(path))
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Immutable copy for serving.
    pub fn freeze(&self) -> Arc<RouteTable> {
        Arc::new(self.clone())
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .routes
            .iter()
            .flat_map(|(method, paths)| paths.keys().map(move |p| format!("{} {}", method, p)))
            .collect();
        keys.sort();
        f.debug_struct("RouteTable").field("routes", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::response::{ApiError, ApiResponse};
    use serde_json::json;

    fn reply(tag: &'static str) -> impl Handler {
        move |_req: ApiRequest| async move { Ok::<_, ApiError>(ApiResponse::success(json!(tag))) }
    }

    #[tokio::test]
    async fn test_exact_match_and_last_wins() {
        let mut table = RouteTable::new();
        assert!(!table.insert(Method::GET, "/orders", reply("first")));
        assert!(table.insert(Method::GET, "/orders", reply("second")));
        table.insert(Method::POST, "/orders", reply("post"));

        assert_eq!(table.len(), 2);
        assert!(table.get(&Method::GET, "/orders/1").is_none());
        assert!(table.get(&Method::DELETE, "/orders").is_none());
        assert!(table.has_path("/orders"));

        let handler = table.get(&Method::GET, "/orders").unwrap().clone();
        let response = handler.call(ApiRequest::empty(Method::GET, "/orders")).await.unwrap();
        assert_eq!(response.body(), json!({"status": "success", "data": "second"}));
    }

    #[test]
    fn test_frozen_copy_is_independent() {
        let mut table = RouteTable::new();
        table.insert(Method::GET, "/a", reply("a"));
        let frozen = table.freeze();
        table.insert(Method::GET, "/b", reply("b"));

        assert_eq!(frozen.len(), 1);
        assert!(!frozen.contains(&Method::GET, "/b"));
        assert_eq!(format!("{:?}", table), r#"RouteTable { routes: ["GET /a", "GET /b"] }"#);
    }
}
