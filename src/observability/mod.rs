//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Service code:
//!     → logging.rs (LogSink::log / log_info! macros)
//!
//! Dependencies and ad-hoc diagnostics:
//!     → tracing events
//!     → layer.rs (LogSinkLayer)
//!     → logging.rs
//!
//! logging.rs:
//!     → stdout
//!     → rotation.rs (dir/stem_YYYY-MM-DD.ext, append, flush per line)
//! ```

pub mod layer;
pub mod logging;
pub mod rotation;

pub use layer::LogSinkLayer;
pub use logging::{Location, LogSink};
pub use rotation::LogError;
