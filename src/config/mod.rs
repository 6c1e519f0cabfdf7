//! Configuration management for graphsnap
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `GRAPHSNAP__<section>__<key>`
//!
//! Examples:
//! - `GRAPHSNAP__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `GRAPHSNAP__BROWSER__WEBDRIVER_URL=http://chromedriver:4444`
//! - `GRAPHSNAP__CAPTURE__WORKER_COUNT=4`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/graphsnap.toml`.
//! This can be overridden using the `GRAPHSNAP_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use models::{
    BrowserConfig, CaptureConfig, Config, ConfluenceConfig, GrafanaConfig, ServerConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`GRAPHSNAP__*`)
    /// 2. TOML file (default: `config/graphsnap.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or the
    /// validation pass rejects a value.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[capture]
worker_count = 1
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.capture.worker_count, 1);
    }

    #[test]
    fn test_config_parses_from_toml_with_defaults() {
        let config: Config = toml::from_str(
            r#"
[browser]
webdriver_url = "http://chromedriver:4444"
        "#,
        )
        .unwrap();

        assert_eq!(config.browser.webdriver_url, "http://chromedriver:4444");
        // Unnamed sections and keys fall back to struct defaults.
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.capture.worker_count, 2);
    }

    #[test]
    fn test_validation_rejects_zero_workers() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[capture]
worker_count = 0
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::ZeroWorkerCount)
        ));
    }
}
