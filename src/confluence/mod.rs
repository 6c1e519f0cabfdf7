//! Destination-service access: page hierarchy resolution and attachment
//! upload.
//!
//! The publish engine only sees the [`PageStore`] trait; the concrete
//! [`ConfluenceClient`] speaks the Confluence REST content API. Tests
//! substitute a fake.

mod client;

pub use client::ConfluenceClient;

use crate::api::models::{Credential, PageDestination};
use crate::report::StageResult;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfluenceError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ConfluenceError>;

/// Document-store operations the publish engine depends on.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Whether the page with this id exists at the destination.
    async fn page_exists(&self, dest: &PageDestination, page_id: &str) -> Result<bool>;

    /// Id of the child page with `title` under the destination's top page,
    /// if one exists.
    async fn find_child_page(&self, dest: &PageDestination, title: &str) -> Result<Option<String>>;

    /// Create a page titled `title` under the destination's top page and
    /// return its id.
    async fn create_page(&self, dest: &PageDestination, title: &str) -> Result<String>;

    /// Attach `image` to the page under `name`.
    async fn upload_attachment(
        &self,
        dest: &PageDestination,
        page_id: &str,
        name: &str,
        image: Bytes,
    ) -> Result<()>;

    /// Authenticated access-mode probe. Transport errors fold into the
    /// returned result; this never aborts a batch.
    async fn access_mode(&self, host: &str, port: u16, auth: &Credential) -> StageResult;
}
