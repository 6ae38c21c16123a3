//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! Every field has a built-in default so a missing file, section or key
//! still yields a usable configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (host, port, worker threads).
    pub server: ServerConfig,

    /// Trading SDK locations, passed through to the SDK untouched.
    #[serde(alias = "ox_sdk")]
    pub sdk: SdkConfig,

    /// Log sink configuration.
    pub log: LogConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (e.g., "127.0.0.1").
    pub host: String,

    /// TCP port, 1..=65535.
    pub port: i64,

    /// Worker threads handed to the listener runtime, 1..=32.
    pub threads: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            threads: 4,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding. IPv6 hosts are bracketed.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// SDK configuration. The service never interprets these paths.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Path to the vendor trading library.
    pub dll_path: String,

    /// Path to the vendor's own ini file.
    pub config_path: String,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            dll_path: "./bin/GuosenOXAPI.dll".to_string(),
            config_path: "./bin/config/config.ini".to_string(),
        }
    }
}

/// Log sink configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level written.
    pub level: LogLevel,

    /// Base log file path; the dated file name is derived from it.
    pub file: String,

    /// Write lines to stdout.
    pub console_output: bool,

    /// Write lines to the dated log file.
    pub file_output: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: "./logs/service.log".to_string(),
            console_output: true,
            file_output: true,
        }
    }
}

/// Log severity, ordered `Debug < Info < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl LogLevel {
    /// Lowercase name as it appears in configuration documents.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Fixed-width label used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO ",
            LogLevel::Warn => "WARN ",
            LogLevel::Error => "ERROR",
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LogLevel::Debug,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    /// Lenient parse: unknown names fall back to `Info`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

impl Serialize for LogLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(LogLevel::parse_lenient(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address_brackets_ipv6() {
        let mut server = ServerConfig::default();
        assert_eq!(server.bind_address(), "127.0.0.1:8080");

        server.host = "::1".into();
        assert_eq!(server.bind_address(), "[::1]:8080");
        assert!(server.bind_address().parse::<std::net::SocketAddr>().is_ok());

        server.host = "[::1]".into();
        assert_eq!(server.bind_address(), "[::1]:8080");
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.threads, 4);
        assert_eq!(config.log.level, LogLevel::Info);
        assert_eq!(config.log.file, "./logs/service.log");
        assert!(config.log.console_output);
        assert!(config.log.file_output);
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_level_parse_is_lenient() {
        assert_eq!(LogLevel::parse_lenient("DEBUG"), LogLevel::Debug);
        assert_eq!(LogLevel::parse_lenient("Warn"), LogLevel::Warn);
        assert_eq!(LogLevel::parse_lenient("verbose"), LogLevel::Info);
        assert_eq!(LogLevel::from_u8(LogLevel::Error as u8), LogLevel::Error);
    }
}
