//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (exact lookup)
//!     → Return: handler or NoMatch (unified 404 fallback in http::pipeline)
//!
//! Route registration (before start):
//!     route(method, path, handler)
//!     → RouteTable (last registration wins)
//!     → Freeze as immutable Arc<RouteTable> on start
//! ```

pub mod router;

pub use router::{BoxedHandler, Handler, RouteTable};
