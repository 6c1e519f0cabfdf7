//! Publish pipeline for one dashboard/destination pair.
//!
//! Hierarchy: top page (pre-existing, never created here) → dashboard
//! sub-page titled `{name}_{uid}` (created on first use, reused after) →
//! one uniquely-named attachment per captured panel.

use crate::api::models::PageDestination;
use crate::capture::DownloadedPanel;
use crate::confluence::PageStore;
use crate::grafana::TimeWindow;
use crate::report::{PublishStages, StageResult};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct PublishEngine {
    store: Arc<dyn PageStore>,
    /// Sub-page creation is check-then-create against a shared hierarchy;
    /// creation attempts for the same destination page title are
    /// serialized here so concurrent dashboards cannot duplicate pages.
    page_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PublishEngine {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self {
            store,
            page_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Publish one dashboard's captured panels to one destination,
    /// recording every stage into `stages`. A top-page or sub-page failure
    /// aborts this destination only.
    pub async fn publish(
        &self,
        dest: &PageDestination,
        dashboard_name: &str,
        uid: &str,
        window: TimeWindow,
        panels: &[DownloadedPanel],
        stages: &mut PublishStages,
    ) {
        match self.store.page_exists(dest, &dest.top_page_id).await {
            Ok(true) => stages.top_page_exists = StageResult::success(),
            Ok(false) => {
                stages.top_page_exists = StageResult::failure(format!(
                    "top page {} does not exist at {}",
                    dest.top_page_id,
                    dest.base_url()
                ));
                return;
            }
            Err(e) => {
                warn!(page = %dest.top_page_id, error = %e, "Top page check failed");
                stages.top_page_exists = StageResult::failure(e.to_string());
                return;
            }
        }

        let title = format!("{dashboard_name}_{uid}");
        let page_id = match self.ensure_dashboard_page(dest, &title).await {
            Ok(page_id) => {
                stages.dashboard_page = StageResult::success();
                page_id
            }
            Err(cause) => {
                stages.dashboard_page = StageResult::failure(cause);
                return;
            }
        };

        for panel in panels {
            let name = attachment_name(dashboard_name, &panel.descriptor.title, panel.descriptor.id, window);
            let result = self.upload_panel(dest, &page_id, &name, panel).await;
            stages
                .panel_uploads
                .insert(panel.descriptor.title.clone(), result);
        }

        info!(
            page = %page_id,
            panels = panels.len(),
            "Publish finished for destination"
        );
    }

    /// Resolve the dashboard sub-page, creating it only if absent.
    /// Idempotent: reruns and concurrent runs reuse the existing page.
    async fn ensure_dashboard_page(
        &self,
        dest: &PageDestination,
        title: &str,
    ) -> Result<String, String> {
        let lock = self
            .lock_for(format!("{}:{}/{}", dest.host, dest.port, title))
            .await;
        let _guard = lock.lock().await;

        match self.store.find_child_page(dest, title).await {
            Ok(Some(page_id)) => {
                debug!(title, page = %page_id, "Reusing existing dashboard page");
                Ok(page_id)
            }
            Ok(None) => self
                .store
                .create_page(dest, title)
                .await
                .map_err(|e| format!("unable to create dashboard page {title}: {e}")),
            Err(e) => Err(format!("unable to look up dashboard page {title}: {e}")),
        }
    }

    async fn upload_panel(
        &self,
        dest: &PageDestination,
        page_id: &str,
        name: &str,
        panel: &DownloadedPanel,
    ) -> StageResult {
        let image = match tokio::fs::read(&panel.path).await {
            Ok(image) => Bytes::from(image),
            Err(e) => {
                return StageResult::failure(format!(
                    "unable to read captured image {}: {e}",
                    panel.path.display()
                ));
            }
        };

        match self
            .store
            .upload_attachment(dest, page_id, name, image)
            .await
        {
            Ok(()) => StageResult::success(),
            Err(e) => StageResult::failure(format!("unable to upload {name}: {e}")),
        }
    }

    async fn lock_for(&self, key: String) -> Arc<Mutex<()>> {
        let mut locks = self.page_locks.lock().await;
        locks.entry(key).or_default().clone()
    }
}

/// Unique attachment name: dashboard, panel id, panel title, captured
/// window, plus a random suffix so repeated runs never collide.
fn attachment_name(dashboard_name: &str, panel_title: &str, panel_id: i64, window: TimeWindow) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}_{}_{}_{}_{}.png",
        sanitize(dashboard_name),
        panel_id,
        sanitize(panel_title),
        window.from.timestamp(),
        window.to.timestamp(),
        &suffix[..8]
    )
}

fn sanitize(part: &str) -> String {
    part.replace(char::is_whitespace, "-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn window() -> TimeWindow {
        TimeWindow {
            from: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            to: DateTime::from_timestamp(1_700_086_400, 0).unwrap(),
        }
    }

    #[test]
    fn test_attachment_name_carries_identifying_parts() {
        let name = attachment_name("Service Overview", "CPU usage", 4, window());

        assert!(name.starts_with("Service-Overview_4_CPU-usage_1700000000_1700086400_"));
        assert!(name.ends_with(".png"));
        assert!(!name.contains(' '));
    }

    #[test]
    fn test_attachment_names_are_unique_per_call() {
        let a = attachment_name("dash", "panel", 1, window());
        let b = attachment_name("dash", "panel", 1, window());
        assert_ne!(a, b);
    }
}
