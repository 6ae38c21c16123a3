//! Configuration loading from disk.
//!
//! A document is parsed into a [`ConfigDocument`] whose every field is
//! optional, then overlaid onto a copy of an existing [`ServiceConfig`].
//! Parsing finishes before anything is applied, so a mistyped field never
//! leaves a half-updated configuration behind.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::config::schema::{LogLevel, ServiceConfig};
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("No configuration file path has been set")]
    NoPath,
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Partial configuration as found in a document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigDocument {
    pub server: Option<ServerSection>,
    #[serde(alias = "ox_sdk")]
    pub sdk: Option<SdkSection>,
    pub log: Option<LogSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<i64>,
    pub threads: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SdkSection {
    pub dll_path: Option<String>,
    pub config_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub level: Option<LogLevel>,
    pub file: Option<String>,
    pub console_output: Option<bool>,
    pub file_output: Option<bool>,
}

impl ConfigDocument {
    /// Parse a JSON document.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse a TOML document with the same layout.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Overlay present fields onto `base`, returning the merged config.
    pub fn apply(self, base: &ServiceConfig) -> ServiceConfig {
        let mut config = base.clone();

        if let Some(server) = self.server {
            overlay(&mut config.server.host, server.host);
            overlay(&mut config.server.port, server.port);
            overlay(&mut config.server.threads, server.threads);
        }

        if let Some(sdk) = self.sdk {
            overlay(&mut config.sdk.dll_path, sdk.dll_path);
            overlay(&mut config.sdk.config_path, sdk.config_path);
        }

        if let Some(log) = self.log {
            overlay(&mut config.log.level, log.level);
            overlay(&mut config.log.file, log.file);
            overlay(&mut config.log.console_output, log.console_output);
            overlay(&mut config.log.file_output, log.file_output);
        }

        config
    }
}

fn overlay<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Read and parse the document at `path`. Files ending in `.toml` are read
/// as TOML, everything else as JSON.
pub fn read_document(path: &Path) -> Result<ConfigDocument, ConfigError> {
    let content = fs::read_to_string(path)?;
    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    if is_toml {
        ConfigDocument::from_toml(&content)
    } else {
        ConfigDocument::from_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_keep_defaults() {
        let doc = ConfigDocument::from_json(r#"{"server":{"port":9999}}"#).unwrap();
        let config = doc.apply(&ServiceConfig::default());
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.threads, 4);
        assert_eq!(config.log, ServiceConfig::default().log);
    }

    #[test]
    fn test_overlay_keeps_base_values() {
        let mut base = ServiceConfig::default();
        base.server.host = "0.0.0.0".into();

        let doc = ConfigDocument::from_json(r#"{"log":{"level":"ERROR","console_output":false}}"#)
            .unwrap();
        let config = doc.apply(&base);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.log.level, LogLevel::Error);
        assert!(!config.log.console_output);
        assert!(config.log.file_output);
    }

    #[test]
    fn test_sdk_alias_and_unknown_keys() {
        let doc = ConfigDocument::from_json(
            r#"{"ox_sdk":{"dll_path":"/opt/sdk.so"},"extra":{"a":1}}"#,
        )
        .unwrap();
        let config = doc.apply(&ServiceConfig::default());
        assert_eq!(config.sdk.dll_path, "/opt/sdk.so");
        assert_eq!(config.sdk.config_path, "./bin/config/config.ini");
    }

    #[test]
    fn test_wrong_type_is_rejected_whole() {
        let result = ConfigDocument::from_json(r#"{"server":{"host":"h","port":"eighty"}}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_toml_document() {
        let doc = ConfigDocument::from_toml(
            "[server]\nport = 7000\n\n[log]\nlevel = \"debug\"\nfile_output = false\n",
        )
        .unwrap();
        let config = doc.apply(&ServiceConfig::default());
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.log.level, LogLevel::Debug);
        assert!(!config.log.file_output);
    }
}
