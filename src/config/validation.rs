//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (port, thread count)
//! - Check fields required by enabled features (log file when file output is on)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - SDK paths are opaque and never validated here

use std::fmt;

use crate::config::schema::{LogConfig, ServerConfig, ServiceConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    PortOutOfRange(i64),
    ThreadsOutOfRange(i64),
    EmptyHost,
    EmptyLogFile,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::PortOutOfRange(p) => write!(f, "server.port {} not in 1..=65535", p),
            ValidationError::ThreadsOutOfRange(t) => {
                write!(f, "server.threads {} not in 1..=32", t)
            }
            ValidationError::EmptyHost => write!(f, "server.host is empty"),
            ValidationError::EmptyLogFile => {
                write!(f, "log.file is empty while log.file_output is enabled")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_server(server: &ServerConfig, errors: &mut Vec<ValidationError>) {
    if !(1..=65535).contains(&server.port) {
        errors.push(ValidationError::PortOutOfRange(server.port));
    }
    if !(1..=32).contains(&server.threads) {
        errors.push(ValidationError::ThreadsOutOfRange(server.threads));
    }
    if server.host.is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
}

pub fn validate_log(log: &LogConfig, errors: &mut Vec<ValidationError>) {
    if log.file_output && log.file.is_empty() {
        errors.push(ValidationError::EmptyLogFile);
    }
}

/// Validate a complete configuration.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    validate_server(&config.server, &mut errors);
    validate_log(&config.log, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
