//! Capture pipeline for one dashboard: existence check, panel selection,
//! snapshot creation, browser login, per-panel screenshot downloads.

use super::{CaptureOutcome, CaptureSession, DownloadedPanel};
use crate::api::models::DashboardTarget;
use crate::browser::PanelBrowser;
use crate::config::CaptureConfig;
use crate::grafana::{
    DashboardSource, TimeWindow, dashboard_title, panel_descriptors, panel_view_url, select_panels,
};
use crate::report::{CaptureStages, PanelDownload, StageResult};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct CaptureEngine {
    source: Arc<dyn DashboardSource>,
    browser: Arc<dyn PanelBrowser>,
    window: Duration,
    snapshot_expiry: Duration,
    scratch_root: Option<PathBuf>,
}

impl CaptureEngine {
    pub fn new(
        source: Arc<dyn DashboardSource>,
        browser: Arc<dyn PanelBrowser>,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            source,
            browser,
            window: config.window(),
            snapshot_expiry: config.snapshot_expiry(),
            scratch_root: config.scratch_root.clone(),
        }
    }

    /// Run the capture stage sequence for one dashboard, recording every
    /// stage into `stages`. A failed stage aborts the remaining ones; the
    /// returned outcome says whether publishing should follow and carries
    /// the session the caller must release afterwards.
    pub async fn capture(
        &self,
        target: &DashboardTarget,
        stages: &mut CaptureStages,
    ) -> CaptureOutcome {
        let window = TimeWindow::ending_now(self.window);
        let mut outcome = CaptureOutcome::aborted(window);

        // Existence check doubles as the description fetch; the raw
        // dashboard feeds both selection and snapshot creation.
        let dashboard = match self.source.fetch_dashboard(target).await {
            Ok(dashboard) => {
                stages.dashboard_exists = StageResult::success();
                dashboard
            }
            Err(e) => {
                warn!(uid = %target.uid, error = %e, "Dashboard existence check failed");
                stages.dashboard_exists = StageResult::failure(e.to_string());
                return outcome;
            }
        };

        let title = match dashboard_title(&dashboard) {
            Ok(title) => title,
            Err(e) => {
                stages.panel_selection = StageResult::failure(e.to_string());
                return outcome;
            }
        };

        let panels = match panel_descriptors(&dashboard) {
            Ok(panels) => panels,
            Err(e) => {
                stages.panel_selection = StageResult::failure(e.to_string());
                return outcome;
            }
        };

        let selected = select_panels(
            panels,
            &target.include_panel_ids,
            &target.exclude_panel_ids,
        );
        if selected.is_empty() {
            stages.panel_selection = StageResult::failure(format!(
                "no panels remaining after applying include {:?} and exclude {:?}",
                target.include_panel_ids, target.exclude_panel_ids
            ));
            return outcome;
        }
        stages.panel_selection = StageResult::success();
        debug!(uid = %target.uid, count = selected.len(), "Panels selected");

        let expiry = Utc::now()
            + chrono::Duration::from_std(self.snapshot_expiry)
                .unwrap_or_else(|_| chrono::Duration::zero());
        let handle = match self
            .source
            .create_snapshot(target, &dashboard, window, expiry)
            .await
        {
            Ok(handle) => {
                stages.snapshot_create = StageResult::success();
                handle
            }
            Err(e) => {
                warn!(uid = %target.uid, error = %e, "Snapshot creation failed");
                stages.snapshot_create = StageResult::failure(e.to_string());
                return outcome;
            }
        };

        let scratch = match self.make_scratch_dir() {
            Ok(scratch) => {
                stages.create_scratch_dir = StageResult::success();
                scratch
            }
            Err(e) => {
                stages.create_scratch_dir = StageResult::failure(e.to_string());
                // The snapshot exists with nowhere to download into;
                // delete it here since no session will carry it.
                stages.snapshot_delete = match self
                    .source
                    .delete_snapshot(target, &handle.key)
                    .await
                {
                    Ok(()) => StageResult::success(),
                    Err(e) => StageResult::failure(format!(
                        "failed to delete snapshot {}: {e}",
                        handle.key
                    )),
                };
                return outcome;
            }
        };

        let session = CaptureSession::new(&target.uid, handle.key, scratch);
        let (panels, completed) = self.download_panels(target, &session, selected, stages).await;

        info!(
            uid = %target.uid,
            downloaded = panels.len(),
            "Dashboard capture finished"
        );

        outcome.dashboard_title = title;
        outcome.panels = panels;
        outcome.session = Some(session);
        outcome.completed = completed;
        outcome
    }

    /// Release a capture session created by [`capture`](Self::capture).
    pub async fn release(
        &self,
        session: CaptureSession,
        target: &DashboardTarget,
    ) -> (StageResult, StageResult) {
        session.release(self.source.as_ref(), target).await
    }

    async fn download_panels(
        &self,
        target: &DashboardTarget,
        session: &CaptureSession,
        selected: Vec<crate::grafana::PanelDescriptor>,
        stages: &mut CaptureStages,
    ) -> (Vec<DownloadedPanel>, bool) {
        let base_url = target.base_url();

        // One UI login per dashboard, not per panel.
        let browser_session = match self.browser.login(&base_url, &target.auth).await {
            Ok(session) => {
                stages.ui_login = StageResult::success();
                session
            }
            Err(e) => {
                warn!(uid = %target.uid, error = %e, "UI login failed");
                stages.ui_login =
                    StageResult::failure(format!("unable to log into UI at {base_url}: {e}"));
                return (Vec::new(), false);
            }
        };

        let mut downloaded = Vec::with_capacity(selected.len());

        for mut panel in selected {
            panel.snapshot_url = panel_view_url(&base_url, &session.snapshot_key, panel.id);

            let mut node = PanelDownload::new();
            let path = session
                .scratch_path()
                .join(format!("{}-{}.png", panel.id, Uuid::new_v4()));

            if let Err(e) = tokio::fs::File::create(&path).await {
                node.create_scratch_file = StageResult::failure(format!(
                    "unable to create scratch file for panel {}: {e}",
                    panel.id
                ));
                stages.panel_downloads.insert(panel.id, node);
                continue;
            }
            node.create_scratch_file = StageResult::success();

            match browser_session
                .panel_screenshot(&panel.snapshot_url, panel.id)
                .await
            {
                Ok(image) => match tokio::fs::write(&path, &image).await {
                    Ok(()) => {
                        node.save_screenshot = StageResult::success();
                        let id = panel.id;
                        downloaded.push(DownloadedPanel {
                            descriptor: panel,
                            path,
                        });
                        stages.panel_downloads.insert(id, node);
                        continue;
                    }
                    Err(e) => {
                        node.save_screenshot =
                            StageResult::failure(format!("unable to persist screenshot: {e}"));
                    }
                },
                Err(e) => {
                    node.save_screenshot = StageResult::failure(format!(
                        "unable to capture {}: {e}",
                        panel.snapshot_url
                    ));
                }
            }

            stages.panel_downloads.insert(panel.id, node);
        }

        browser_session.close().await;

        (downloaded, true)
    }

    fn make_scratch_dir(&self) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("graphsnap-");

        match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }
}
