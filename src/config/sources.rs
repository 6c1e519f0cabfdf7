use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "GRAPHSNAP_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/graphsnap.toml";
const ENV_PREFIX: &str = "GRAPHSNAP";
const ENV_SEPARATOR: &str = "__";

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env file if it exists (ignore errors if file doesn't exist)
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_from_sources(config_path)
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    // Start with defaults (handled by struct Default implementations)
    // Add TOML file if it exists (optional)
    if config_path.exists() {
        tracing::info!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::warn!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // Add environment variable overrides
    // GRAPHSNAP__SERVER__BIND_ADDR -> server.bind_addr
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_defaults_only() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.capture.worker_count, 2);
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "127.0.0.1:9000"

[browser]
webdriver_url = "http://chromedriver:4444"
step_timeout_secs = 240
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.browser.webdriver_url, "http://chromedriver:4444");
        assert_eq!(config.browser.step_timeout_secs, 240);
        // Untouched sections keep their defaults
        assert_eq!(config.grafana.snapshot_min_expiry_secs, 900);
    }

    #[test]
    fn test_full_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "0.0.0.0:8080"

[grafana]
api_timeout_secs = 5
snapshot_min_expiry_secs = 1800

[confluence]
api_timeout_secs = 15

[browser]
webdriver_url = "http://127.0.0.1:9515"
step_timeout_secs = 120
poll_interval_ms = 250

[capture]
window_hours = 6
snapshot_expiry_secs = 3600
worker_count = 4
scratch_root = "/var/tmp/graphsnap"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = load_from_sources(config_path).unwrap();
        assert_eq!(config.grafana.api_timeout_secs, 5);
        assert_eq!(config.grafana.snapshot_min_expiry_secs, 1800);
        assert_eq!(config.confluence.api_timeout_secs, 15);
        assert_eq!(config.browser.poll_interval_ms, 250);
        assert_eq!(config.capture.window_hours, 6);
        assert_eq!(config.capture.snapshot_expiry_secs, 3600);
        assert_eq!(config.capture.worker_count, 4);
        assert_eq!(
            config.capture.scratch_root.as_deref(),
            Some(std::path::Path::new("/var/tmp/graphsnap"))
        );
    }
}
