//! HTTP microservice core for the OX trading service.
//!
//! Configuration with hot reload, a rotating leveled log sink, a uniform
//! JSON error/success envelope, and an exact-match router wrapped in a fixed
//! middleware pipeline. Trading handlers are registered by the embedding
//! binary.

pub mod config;
pub mod errors;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::{ConfigStore, ServiceConfig};
pub use errors::{ErrorCatalog, ErrorCode};
pub use http::{ApiError, ApiRequest, ApiResponse, HandlerResult, HttpServer};
pub use observability::LogSink;
