//! Per-dashboard panel capture: snapshot session lifecycle, browser-driven
//! downloads into a scratch directory.

mod engine;
mod session;

pub use engine::CaptureEngine;
pub use session::CaptureSession;

use crate::grafana::{PanelDescriptor, TimeWindow};
use std::path::PathBuf;

/// One panel image persisted to the scratch directory, awaiting publish.
#[derive(Debug, Clone)]
pub struct DownloadedPanel {
    pub descriptor: PanelDescriptor,
    pub path: PathBuf,
}

/// Result of one dashboard's capture run.
///
/// `session` holds the live snapshot key and scratch directory; the caller
/// must release it once the dashboard's processing (including publishing)
/// is done. `completed` is true when the stage sequence ran through UI
/// login — the gate for attempting publication; individual panel failures
/// do not clear it.
pub struct CaptureOutcome {
    pub dashboard_title: String,
    pub window: TimeWindow,
    pub panels: Vec<DownloadedPanel>,
    pub session: Option<CaptureSession>,
    pub completed: bool,
}

impl CaptureOutcome {
    pub(crate) fn aborted(window: TimeWindow) -> Self {
        Self {
            dashboard_title: String::new(),
            window,
            panels: Vec::new(),
            session: None,
            completed: false,
        }
    }
}
