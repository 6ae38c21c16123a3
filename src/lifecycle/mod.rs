//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     HttpServer::stop() → trigger → serve loop drains and exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → main → HttpServer::stop()
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
