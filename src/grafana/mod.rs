//! Source-service access: dashboard lookup, snapshot lifecycle, login ping.
//!
//! The capture pipeline only sees the [`DashboardSource`] trait; the
//! concrete [`GrafanaClient`] speaks the Grafana HTTP API. Tests substitute
//! a fake.

mod client;
mod dashboard;
mod snapshot;

pub use client::GrafanaClient;
pub use dashboard::{PanelDescriptor, dashboard_title, panel_descriptors, select_panels};
pub use snapshot::{SnapshotHandle, TimeWindow, effective_expiry_secs, panel_view_url, with_time_range};

use crate::api::models::{Credential, DashboardTarget};
use crate::report::StageResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GrafanaError {
    #[error("dashboard {uid} not found at {host}:{port}")]
    DashboardNotFound {
        uid: String,
        host: String,
        port: u16,
    },

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid dashboard payload: {0}")]
    InvalidPayload(String),

    #[error("window start {from} is not before end {to}")]
    InvalidWindow {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },
}

pub type Result<T> = std::result::Result<T, GrafanaError>;

/// Dashboard service operations the pipeline depends on.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// Fetch the raw dashboard description by UID. A missing dashboard is
    /// [`GrafanaError::DashboardNotFound`], never a silent empty value.
    async fn fetch_dashboard(&self, target: &DashboardTarget) -> Result<serde_json::Value>;

    /// Materialize a shareable snapshot of `dashboard` rendering `window`,
    /// expiring no earlier than the configured floor.
    async fn create_snapshot(
        &self,
        target: &DashboardTarget,
        dashboard: &serde_json::Value,
        window: TimeWindow,
        expiry: DateTime<Utc>,
    ) -> Result<SnapshotHandle>;

    async fn delete_snapshot(&self, target: &DashboardTarget, key: &str) -> Result<()>;

    /// Authenticated no-op against the login ping endpoint. Transport
    /// errors fold into the returned result; this never aborts a batch.
    async fn login_ping(&self, host: &str, port: u16, auth: &Credential) -> StageResult;
}
