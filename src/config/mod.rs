//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON, or TOML by extension)
//!     → loader.rs (parse into a partial document)
//!     → overlay onto a copy of the current snapshot
//!     → store.rs (atomic swap of Arc<ServiceConfig>)
//!     → validation.rs (semantic checks, on demand)
//!
//! On file change:
//!     watcher.rs detects change
//!     → store.reload()
//!     → new snapshot sent to subscribers
//! ```
//!
//! # Design Decisions
//! - Config is immutable once published; changes produce a new snapshot
//! - All fields have defaults to allow minimal configs
//! - A document is applied whole or not at all

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use loader::ConfigError;
pub use schema::{LogConfig, LogLevel, SdkConfig, ServerConfig, ServiceConfig};
pub use store::ConfigStore;
pub use validation::ValidationError;
