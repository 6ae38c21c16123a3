//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve on the listener thread)
//!     → pipeline.rs (preflight, body buffering, fault boundary, CORS, access log)
//!     → routing::RouteTable (exact method + path)
//!     → handler(ApiRequest) → HandlerResult
//!     → response.rs / errors (JSON envelope)
//!     → Send to client
//! ```

pub mod pipeline;
pub mod request;
pub mod response;
pub mod server;

pub use pipeline::CorsPolicy;
pub use request::ApiRequest;
pub use response::{ApiError, ApiResponse, HandlerResult};
pub use server::{HttpServer, ServerError, ServerState, DEFAULT_SERVICE_NAME, HEALTH_PATH};
