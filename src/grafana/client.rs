//! HTTP client for the Grafana REST API.

use super::snapshot::{SnapshotHandle, TimeWindow, effective_expiry_secs, with_time_range};
use super::{DashboardSource, GrafanaError, Result};
use crate::api::models::{Credential, DashboardTarget};
use crate::config::GrafanaConfig;
use crate::report::StageResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub struct GrafanaClient {
    http: reqwest::Client,
    snapshot_min_expiry: Duration,
}

#[derive(Debug, Serialize)]
struct CreateSnapshotRequest<'a> {
    dashboard: &'a serde_json::Value,
    expires: i64,
    external: bool,
}

#[derive(Debug, Deserialize)]
struct CreateSnapshotResponse {
    key: String,
}

#[derive(Debug, Deserialize)]
struct GetDashboardResponse {
    dashboard: serde_json::Value,
}

impl GrafanaClient {
    pub fn new(config: &GrafanaConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.api_timeout())
            .build()
            .map_err(|e| GrafanaError::RequestFailed(e.to_string()))?;

        Ok(Self {
            http,
            snapshot_min_expiry: config.snapshot_min_expiry(),
        })
    }
}

#[async_trait]
impl DashboardSource for GrafanaClient {
    async fn fetch_dashboard(&self, target: &DashboardTarget) -> Result<serde_json::Value> {
        let url = format!("{}/api/dashboards/uid/{}", target.base_url(), target.uid);
        debug!(url, uid = %target.uid, "Fetching dashboard description");

        let response = target
            .auth
            .apply(self.http.get(&url))
            .send()
            .await
            .map_err(|e| GrafanaError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(GrafanaError::DashboardNotFound {
                uid: target.uid.clone(),
                host: target.host.clone(),
                port: target.port,
            });
        }
        if !status.is_success() {
            return Err(GrafanaError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body: GetDashboardResponse = response
            .json()
            .await
            .map_err(|e| GrafanaError::InvalidPayload(e.to_string()))?;

        Ok(body.dashboard)
    }

    async fn create_snapshot(
        &self,
        target: &DashboardTarget,
        dashboard: &serde_json::Value,
        window: TimeWindow,
        expiry: DateTime<Utc>,
    ) -> Result<SnapshotHandle> {
        // Validation precedes the remote call: a bad window never leaves
        // the process.
        window.validate()?;

        let rewritten = with_time_range(dashboard, window)?;
        let expires = effective_expiry_secs(expiry, Utc::now(), self.snapshot_min_expiry);

        let url = format!("{}/api/snapshots", target.base_url());
        debug!(url, uid = %target.uid, expires, "Creating dashboard snapshot");

        let request = CreateSnapshotRequest {
            dashboard: &rewritten,
            expires,
            external: false,
        };

        let response = target
            .auth
            .apply(self.http.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| GrafanaError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GrafanaError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body: CreateSnapshotResponse = response
            .json()
            .await
            .map_err(|e| GrafanaError::InvalidPayload(e.to_string()))?;

        Ok(SnapshotHandle { key: body.key })
    }

    async fn delete_snapshot(&self, target: &DashboardTarget, key: &str) -> Result<()> {
        let url = format!("{}/api/snapshots/{}", target.base_url(), key);
        debug!(url, "Deleting dashboard snapshot");

        let response = target
            .auth
            .apply(self.http.delete(&url))
            .send()
            .await
            .map_err(|e| GrafanaError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "Snapshot deletion returned non-success");
            return Err(GrafanaError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        Ok(())
    }

    async fn login_ping(&self, host: &str, port: u16, auth: &Credential) -> StageResult {
        let url = format!("http://{host}:{port}/api/login/ping");
        debug!(url, "Checking grafana credential");

        match auth.apply(self.http.get(&url)).send().await {
            Ok(response) => match response.status() {
                reqwest::StatusCode::OK => StageResult::success(),
                reqwest::StatusCode::UNAUTHORIZED => StageResult::failure("Unauthorized"),
                status => {
                    StageResult::failure(format!("unexpected status {} from {url}", status.as_u16()))
                }
            },
            Err(e) => StageResult::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_snapshot_request_wire_shape() {
        let dashboard = json!({"title": "t"});
        let request = CreateSnapshotRequest {
            dashboard: &dashboard,
            expires: 900,
            external: false,
        };

        let encoded = serde_json::to_value(&request).unwrap();
        assert_eq!(
            encoded,
            json!({"dashboard": {"title": "t"}, "expires": 900, "external": false})
        );
    }
}
