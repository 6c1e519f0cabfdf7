//! HTTP client for the Confluence REST content API.

use super::{ConfluenceError, PageStore, Result};
use crate::api::models::{Credential, PageDestination};
use crate::config::ConfluenceConfig;
use crate::report::StageResult;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, warn};

// Server-side CSRF protection rejects multipart uploads without this.
const ATLASSIAN_TOKEN_HEADER: &str = "X-Atlassian-Token";

pub struct ConfluenceClient {
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ContentSearchResponse {
    #[serde(default)]
    results: Vec<ContentResult>,
}

#[derive(Debug, Deserialize)]
struct ContentResult {
    id: String,
    #[serde(default)]
    ancestors: Vec<ContentAncestor>,
}

#[derive(Debug, Deserialize)]
struct ContentAncestor {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedContent {
    id: String,
}

impl ConfluenceClient {
    pub fn new(config: &ConfluenceConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.api_timeout())
            .build()
            .map_err(|e| ConfluenceError::RequestFailed(e.to_string()))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl PageStore for ConfluenceClient {
    async fn page_exists(&self, dest: &PageDestination, page_id: &str) -> Result<bool> {
        let url = format!("{}/rest/api/content/{}", dest.base_url(), page_id);
        debug!(url, "Checking page existence");

        let response = dest
            .auth
            .apply(self.http.get(&url))
            .send()
            .await
            .map_err(|e| ConfluenceError::RequestFailed(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => Err(ConfluenceError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            }),
        }
    }

    async fn find_child_page(&self, dest: &PageDestination, title: &str) -> Result<Option<String>> {
        let url = format!("{}/rest/api/content", dest.base_url());
        debug!(url, title, space = %dest.space_key, "Looking up child page by title");

        let response = dest
            .auth
            .apply(self.http.get(&url).query(&[
                ("spaceKey", dest.space_key.as_str()),
                ("title", title),
                ("type", "page"),
                ("expand", "ancestors"),
            ]))
            .send()
            .await
            .map_err(|e| ConfluenceError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfluenceError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body: ContentSearchResponse = response
            .json()
            .await
            .map_err(|e| ConfluenceError::InvalidResponse(e.to_string()))?;

        // Same-titled pages can exist elsewhere in the space; only a child
        // of the configured top page counts.
        let child = body
            .results
            .into_iter()
            .find(|page| page.ancestors.iter().any(|a| a.id == dest.top_page_id))
            .map(|page| page.id);

        Ok(child)
    }

    async fn create_page(&self, dest: &PageDestination, title: &str) -> Result<String> {
        let url = format!("{}/rest/api/content", dest.base_url());
        debug!(url, title, parent = %dest.top_page_id, "Creating dashboard page");

        let body = serde_json::json!({
            "type": "page",
            "title": title,
            "space": {"key": dest.space_key},
            "ancestors": [{"id": dest.top_page_id}],
            "body": {
                "storage": {"value": "", "representation": "storage"}
            }
        });

        let response = dest
            .auth
            .apply(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ConfluenceError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfluenceError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        let created: CreatedContent = response
            .json()
            .await
            .map_err(|e| ConfluenceError::InvalidResponse(e.to_string()))?;

        Ok(created.id)
    }

    async fn upload_attachment(
        &self,
        dest: &PageDestination,
        page_id: &str,
        name: &str,
        image: Bytes,
    ) -> Result<()> {
        let url = format!(
            "{}/rest/api/content/{}/child/attachment",
            dest.base_url(),
            page_id
        );
        debug!(url, name, size = image.len(), "Uploading attachment");

        let part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name(name.to_string())
            .mime_str("image/png")
            .map_err(|e| ConfluenceError::RequestFailed(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = dest
            .auth
            .apply(self.http.post(&url))
            .header(ATLASSIAN_TOKEN_HEADER, "nocheck")
            .multipart(form)
            .send()
            .await
            .map_err(|e| ConfluenceError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, name, status = status.as_u16(), "Attachment upload failed");
            return Err(ConfluenceError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        Ok(())
    }

    async fn access_mode(&self, host: &str, port: u16, auth: &Credential) -> StageResult {
        let url = format!("http://{host}:{port}/rest/api/accessmode");
        debug!(url, "Checking confluence credential");

        let response = match auth.apply(self.http.get(&url)).send().await {
            Ok(response) => response,
            Err(e) => return StageResult::failure(e.to_string()),
        };

        match response.status() {
            reqwest::StatusCode::OK => match response.text().await {
                // The endpoint reports the instance access mode as text;
                // anything without "write" means uploads would be refused.
                Ok(body) if body.to_lowercase().contains("write") => StageResult::success(),
                Ok(_) => StageResult::failure("access mode is not writable"),
                Err(e) => StageResult::failure(e.to_string()),
            },
            reqwest::StatusCode::UNAUTHORIZED => StageResult::failure("Unauthorized"),
            status => StageResult::failure(format!(
                "unexpected status {} from {url}",
                status.as_u16()
            )),
        }
    }
}
