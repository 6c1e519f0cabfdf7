//! Stage-level execution reports.
//!
//! Every pipeline step records exactly one [`StageResult`]. A report is
//! structurally complete from the moment it is constructed: all declared
//! stages start at the "Not executed" sentinel, so an early abort still
//! yields a full tree. Stage functions return fresh `StageResult` values
//! and the runner assigns them into the tree — setting a result is a pure
//! overwrite, never an accumulation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Sentinel cause for a stage that was never reached. Distinct from both a
/// recorded success and a recorded failure.
pub const NOT_EXECUTED: &str = "Not executed";

/// The atomic reporting unit. `cause` is empty when the stage succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    pub succeeded: bool,
    pub cause: String,
}

impl StageResult {
    pub fn not_executed() -> Self {
        Self {
            succeeded: false,
            cause: NOT_EXECUTED.to_string(),
        }
    }

    pub fn success() -> Self {
        Self {
            succeeded: true,
            cause: String::new(),
        }
    }

    pub fn failure(cause: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            cause: cause.into(),
        }
    }

    pub fn is_not_executed(&self) -> bool {
        !self.succeeded && self.cause == NOT_EXECUTED
    }
}

/// Per-panel download node: scratch file creation and the screenshot save
/// are reported separately.
#[derive(Debug, Clone, Serialize)]
pub struct PanelDownload {
    pub create_scratch_file: StageResult,
    pub save_screenshot: StageResult,
}

impl PanelDownload {
    pub fn new() -> Self {
        Self {
            create_scratch_file: StageResult::not_executed(),
            save_screenshot: StageResult::not_executed(),
        }
    }
}

impl Default for PanelDownload {
    fn default() -> Self {
        Self::new()
    }
}

/// Capture-side stages for one dashboard, in execution order. The two
/// cleanup stages are recorded even when earlier stages abort.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureStages {
    pub dashboard_exists: StageResult,
    pub panel_selection: StageResult,
    pub snapshot_create: StageResult,
    pub create_scratch_dir: StageResult,
    pub ui_login: StageResult,
    /// Keyed by panel id; populated lazily as panels are attempted.
    pub panel_downloads: BTreeMap<i64, PanelDownload>,
    pub snapshot_delete: StageResult,
    pub remove_scratch_dir: StageResult,
}

impl CaptureStages {
    pub fn new() -> Self {
        Self {
            dashboard_exists: StageResult::not_executed(),
            panel_selection: StageResult::not_executed(),
            snapshot_create: StageResult::not_executed(),
            create_scratch_dir: StageResult::not_executed(),
            ui_login: StageResult::not_executed(),
            panel_downloads: BTreeMap::new(),
            snapshot_delete: StageResult::not_executed(),
            remove_scratch_dir: StageResult::not_executed(),
        }
    }
}

impl Default for CaptureStages {
    fn default() -> Self {
        Self::new()
    }
}

/// Publish-side stages for one destination page hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct PublishStages {
    pub top_page_exists: StageResult,
    pub dashboard_page: StageResult,
    /// Keyed by panel title; populated lazily as uploads are attempted.
    pub panel_uploads: BTreeMap<String, StageResult>,
}

impl PublishStages {
    pub fn new() -> Self {
        Self {
            top_page_exists: StageResult::not_executed(),
            dashboard_page: StageResult::not_executed(),
            panel_uploads: BTreeMap::new(),
        }
    }
}

impl Default for PublishStages {
    fn default() -> Self {
        Self::new()
    }
}

/// Full stage tree for one dashboard entry in a schedule.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub title: String,
    pub uid: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub end_time: Option<DateTime<Utc>>,
    pub capture: CaptureStages,
    /// Keyed by destination key from the schedule request. One sub-tree per
    /// declared destination, present from construction time.
    pub publish: BTreeMap<String, PublishStages>,
}

impl DashboardReport {
    pub fn new<'a>(uid: &str, destinations: impl IntoIterator<Item = &'a String>) -> Self {
        let publish = destinations
            .into_iter()
            .map(|key| (key.clone(), PublishStages::new()))
            .collect();

        Self {
            title: format!("Dashboard {uid} capture report"),
            uid: uid.to_string(),
            start_time: Utc::now(),
            end_time: None,
            capture: CaptureStages::new(),
            publish,
        }
    }

    pub fn finalize(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(Utc::now());
        }
    }

    /// Whether any stage recorded an actual failure. The "Not executed"
    /// sentinel does not count.
    pub fn has_failures(&self) -> bool {
        let failed = |r: &StageResult| !r.succeeded && !r.is_not_executed();

        let capture = [
            &self.capture.dashboard_exists,
            &self.capture.panel_selection,
            &self.capture.snapshot_create,
            &self.capture.create_scratch_dir,
            &self.capture.ui_login,
            &self.capture.snapshot_delete,
            &self.capture.remove_scratch_dir,
        ];
        if capture.into_iter().any(failed) {
            return true;
        }

        if self
            .capture
            .panel_downloads
            .values()
            .any(|p| failed(&p.create_scratch_file) || failed(&p.save_screenshot))
        {
            return true;
        }

        self.publish.values().any(|stages| {
            failed(&stages.top_page_exists)
                || failed(&stages.dashboard_page)
                || stages.panel_uploads.values().any(failed)
        })
    }

    pub fn captured_panel_count(&self) -> u64 {
        self.capture
            .panel_downloads
            .values()
            .filter(|p| p.save_screenshot.succeeded)
            .count() as u64
    }

    pub fn uploaded_panel_count(&self) -> u64 {
        self.publish
            .values()
            .flat_map(|stages| stages.panel_uploads.values())
            .filter(|r| r.succeeded)
            .count() as u64
    }
}

/// Root aggregate returned to the caller, one entry per dashboard in the
/// schedule request.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleReport {
    pub title: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub end_time: Option<DateTime<Utc>>,
    pub dashboards: BTreeMap<String, DashboardReport>,
}

impl ScheduleReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start_time: Utc::now(),
            end_time: None,
            dashboards: BTreeMap::new(),
        }
    }

    /// Set exactly once, when every dashboard in the request has finished.
    pub fn finalize(&mut self) {
        if self.end_time.is_none() {
            self.end_time = Some(Utc::now());
        }
    }
}
