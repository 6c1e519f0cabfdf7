//! API models for the graphsnap schedule and credential endpoints.
//!
//! The schedule contract: `POST /schedule/check` accepts a
//! [`ScheduleRequest`] naming N dashboards to capture and M destination
//! page hierarchies to publish into, and returns the stage-level
//! [`crate::report::ScheduleReport`] once every dashboard has finished.
//!
//! A complete request example (as JSON):
//!
//! ```json
//! {
//!   "title": "nightly capture",
//!   "dashboards": {
//!     "service-overview": {
//!       "host": "grafana.internal",
//!       "port": 3000,
//!       "uid": "k3BY5Gl7z",
//!       "include_panel_ids": [2, 3],
//!       "auth": { "username": "snapper", "password": "hunter2" }
//!     }
//!   },
//!   "destinations": {
//!     "team-wiki": {
//!       "host": "confluence.internal",
//!       "port": 8090,
//!       "space_key": "OPS",
//!       "top_page_id": "98314",
//!       "auth": { "username": "snapper", "password": "hunter2" }
//!     }
//!   }
//! }
//! ```
//!
//! Dashboard and destination keys are caller-chosen labels; they key the
//! per-dashboard and per-destination sub-trees of the returned report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Service credential: HTTP basic or a bearer token.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Credential {
    Basic { username: String, password: String },
    Bearer { token: String },
}

impl Credential {
    /// Attach this credential to an outgoing request.
    pub fn apply(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Credential::Basic { username, password } => req.basic_auth(username, Some(password)),
            Credential::Bearer { token } => req.bearer_auth(token),
        }
    }

    /// Username/password pair, when this is a basic credential. UI login
    /// drives a form and cannot use a bearer token.
    pub fn basic(&self) -> Option<(&str, &str)> {
        match self {
            Credential::Basic { username, password } => {
                Some((username.as_str(), password.as_str()))
            }
            Credential::Bearer { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Credential::Basic { username, .. } => username.is_empty(),
            Credential::Bearer { token } => token.is_empty(),
        }
    }
}

/// One dashboard to capture from the source service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardTarget {
    pub host: String,
    pub port: u16,
    pub uid: String,
    /// Non-empty: capture exactly these panel ids (exclusions ignored).
    #[serde(default)]
    pub include_panel_ids: Vec<i64>,
    /// Non-empty and include list empty: capture everything but these.
    #[serde(default)]
    pub exclude_panel_ids: Vec<i64>,
    pub auth: Credential,
}

impl DashboardTarget {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// One destination page hierarchy. The page named by `top_page_id` must
/// already exist; only sub-pages beneath it are ever created.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageDestination {
    pub host: String,
    pub port: u16,
    pub space_key: String,
    pub top_page_id: String,
    pub auth: Credential,
}

impl PageDestination {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Body of `POST /schedule/check`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleRequest {
    #[serde(default = "default_schedule_title")]
    pub title: String,
    pub dashboards: BTreeMap<String, DashboardTarget>,
    #[serde(default)]
    pub destinations: BTreeMap<String, PageDestination>,
}

fn default_schedule_title() -> String {
    "Schedule check".to_string()
}

/// One service endpoint plus credential to probe.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceTarget {
    pub host: String,
    pub port: u16,
    pub auth: Credential,
}

/// Body of `POST /credentials/check`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialCheckRequest {
    #[serde(default)]
    pub grafana: Vec<ServiceTarget>,
    #[serde(default)]
    pub confluence: Vec<ServiceTarget>,
}

/// Per-credential outcome row. Rows preserve request order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialCheckRow {
    pub host: String,
    pub port: u16,
    pub succeeded: bool,
    pub cause: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialCheckResponse {
    pub grafana: Vec<CredentialCheckRow>,
    pub confluence: Vec<CredentialCheckRow>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub components: std::collections::HashMap<String, String>,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_deserializes_untagged() {
        let basic: Credential =
            serde_json::from_str(r#"{"username": "u", "password": "p"}"#).unwrap();
        assert_eq!(basic.basic(), Some(("u", "p")));

        let bearer: Credential = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert!(bearer.basic().is_none());
        assert!(!bearer.is_empty());
    }

    #[test]
    fn test_schedule_request_defaults() {
        let request: ScheduleRequest = serde_json::from_value(serde_json::json!({
            "dashboards": {
                "main": {
                    "host": "grafana.internal",
                    "port": 3000,
                    "uid": "abc123",
                    "auth": {"token": "t"}
                }
            }
        }))
        .unwrap();

        assert_eq!(request.title, "Schedule check");
        assert!(request.destinations.is_empty());

        let target = &request.dashboards["main"];
        assert!(target.include_panel_ids.is_empty());
        assert!(target.exclude_panel_ids.is_empty());
        assert_eq!(target.base_url(), "http://grafana.internal:3000");
    }
}
