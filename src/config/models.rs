use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub grafana: GrafanaConfig,
    #[serde(default)]
    pub confluence: ConfluenceConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            grafana: GrafanaConfig::default(),
            confluence: ConfluenceConfig::default(),
            browser: BrowserConfig::default(),
            capture: CaptureConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

/// Grafana REST API settings. Credentials arrive per request; only
/// connection behavior lives here.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GrafanaConfig {
    #[serde(default = "default_rest_timeout_secs")]
    pub api_timeout_secs: u64,
    /// Floor for snapshot expiration. Snapshots that would expire sooner
    /// are extended to this, so they stay viewable long enough to capture.
    #[serde(default = "default_snapshot_min_expiry_secs")]
    pub snapshot_min_expiry_secs: u64,
}

impl GrafanaConfig {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }

    pub fn snapshot_min_expiry(&self) -> Duration {
        Duration::from_secs(self.snapshot_min_expiry_secs)
    }
}

impl Default for GrafanaConfig {
    fn default() -> Self {
        Self {
            api_timeout_secs: default_rest_timeout_secs(),
            snapshot_min_expiry_secs: default_snapshot_min_expiry_secs(),
        }
    }
}

fn default_rest_timeout_secs() -> u64 {
    10
}

fn default_snapshot_min_expiry_secs() -> u64 {
    15 * 60
}

/// Confluence REST API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfluenceConfig {
    #[serde(default = "default_rest_timeout_secs")]
    pub api_timeout_secs: u64,
}

impl ConfluenceConfig {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

impl Default for ConfluenceConfig {
    fn default() -> Self {
        Self {
            api_timeout_secs: default_rest_timeout_secs(),
        }
    }
}

/// Headless-browser driver settings. The driver speaks WebDriver to the
/// endpoint named here (chromedriver or a Selenium grid).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    /// Budget for one browser step (login sequence or a single panel
    /// screenshot). Browser steps render full pages, so this runs minutes
    /// where the REST timeouts run seconds.
    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl BrowserConfig {
    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            step_timeout_secs: default_step_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_webdriver_url() -> String {
    "http://127.0.0.1:9515".to_string()
}

fn default_step_timeout_secs() -> u64 {
    180
}

fn default_poll_interval_ms() -> u64 {
    500
}

/// Capture pipeline settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureConfig {
    /// Display window rendered into each snapshot: now-window_hours..now.
    #[serde(default = "default_window_hours")]
    pub window_hours: u64,
    /// Requested snapshot lifetime. Zero means "expire immediately", which
    /// the expiry floor then raises to the configured minimum.
    #[serde(default)]
    pub snapshot_expiry_secs: u64,
    /// Dashboards processed concurrently. Browser automation is CPU and
    /// memory heavy, so this stays small.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Parent directory for per-dashboard scratch directories. System temp
    /// when unset.
    pub scratch_root: Option<PathBuf>,
}

impl CaptureConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_hours * 3600)
    }

    pub fn snapshot_expiry(&self) -> Duration {
        Duration::from_secs(self.snapshot_expiry_secs)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            window_hours: default_window_hours(),
            snapshot_expiry_secs: 0,
            worker_count: default_worker_count(),
            scratch_root: None,
        }
    }
}

fn default_window_hours() -> u64 {
    24
}

fn default_worker_count() -> usize {
    2
}
