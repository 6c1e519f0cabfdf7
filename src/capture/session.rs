//! Scoped ownership of one dashboard's capture resources.

use crate::api::models::DashboardTarget;
use crate::grafana::DashboardSource;
use crate::report::StageResult;
use std::path::Path;
use tempfile::TempDir;
use tracing::debug;

/// Owns the remote snapshot and the local scratch directory for one
/// dashboard's capture. Consuming [`release`](Self::release) is the only
/// way out, so both resources are let go exactly once on every path.
pub struct CaptureSession {
    uid: String,
    pub snapshot_key: String,
    scratch: TempDir,
}

impl CaptureSession {
    pub fn new(uid: &str, snapshot_key: String, scratch: TempDir) -> Self {
        Self {
            uid: uid.to_string(),
            snapshot_key,
            scratch,
        }
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    /// Delete the remote snapshot and remove the scratch directory,
    /// reporting each as its own stage. Cleanup failures are recorded but
    /// never escalate.
    pub async fn release(
        self,
        source: &dyn DashboardSource,
        target: &DashboardTarget,
    ) -> (StageResult, StageResult) {
        debug!(uid = %self.uid, key = %self.snapshot_key, "Releasing capture session");

        let snapshot_delete = match source.delete_snapshot(target, &self.snapshot_key).await {
            Ok(()) => StageResult::success(),
            Err(e) => StageResult::failure(format!(
                "failed to delete snapshot {}: {e}",
                self.snapshot_key
            )),
        };

        let remove_scratch_dir = match self.scratch.close() {
            Ok(()) => StageResult::success(),
            Err(e) => StageResult::failure(format!("failed to remove scratch directory: {e}")),
        };

        (snapshot_delete, remove_scratch_dir)
    }
}
