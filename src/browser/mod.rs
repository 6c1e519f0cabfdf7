//! Headless-browser driver behind a narrow capability interface.
//!
//! The capture engine only needs two operations: log into the dashboard
//! service's web UI once per dashboard, then screenshot one panel URL at a
//! time within that authenticated session. Everything else (which driver,
//! which protocol, which selectors) stays behind [`PanelBrowser`] /
//! [`PanelSession`], so the engine is testable against a fake with no real
//! browser.

mod webdriver;

pub use webdriver::WebDriverBrowser;

use crate::api::models::Credential;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("webdriver request failed: {0}")]
    Transport(String),

    #[error("webdriver error: {0}")]
    Protocol(String),

    #[error("timed out after {0:?} waiting for {1}")]
    WaitTimeout(Duration, String),

    #[error("UI login requires a basic credential")]
    BasicCredentialRequired,
}

pub type Result<T> = std::result::Result<T, BrowserError>;

/// Entry point: authenticate against a service's login page and hand back
/// an authenticated session.
#[async_trait]
pub trait PanelBrowser: Send + Sync {
    async fn login(&self, base_url: &str, auth: &Credential) -> Result<Box<dyn PanelSession>>;
}

/// One authenticated browser session. Owned by a single dashboard's
/// capture; closed once its panels are done.
#[async_trait]
pub trait PanelSession: Send + Sync {
    /// Navigate to `url`, wait for the panel's chart element to become
    /// visible, and return a full-page screenshot.
    async fn panel_screenshot(&self, url: &str, panel_id: i64) -> Result<Bytes>;

    /// Release the underlying browser session. Best effort; failures are
    /// logged, not surfaced.
    async fn close(&self);
}
