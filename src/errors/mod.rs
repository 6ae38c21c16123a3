//! Error taxonomy and response envelopes.
//!
//! # Data Flow
//! ```text
//! handler outcome
//!     → Ok(data)          → SuccessResponse
//!     → Err(code, detail) → catalog.rs lookup → ErrorResponse
//!     → envelope.rs (indented JSON body)
//! ```

pub mod catalog;
pub mod envelope;

pub use catalog::{ErrorCatalog, ErrorCode, ErrorInfo};
pub use envelope::{ErrorResponse, ResponseEnvelope, SuccessResponse};
