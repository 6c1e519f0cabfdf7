//! Bounded-parallel dashboard processing.

use crate::api::models::{DashboardTarget, PageDestination, ScheduleRequest};
use crate::capture::CaptureEngine;
use crate::publish::PublishEngine;
use crate::report::{DashboardReport, ScheduleReport};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

pub struct ScheduleRunner {
    capture: Arc<CaptureEngine>,
    publish: Arc<PublishEngine>,
    worker_count: usize,
}

impl ScheduleRunner {
    pub fn new(capture: Arc<CaptureEngine>, publish: Arc<PublishEngine>, worker_count: usize) -> Self {
        Self {
            capture,
            publish,
            worker_count: worker_count.max(1),
        }
    }

    /// Run one schedule request to completion and return the report.
    ///
    /// Dashboards own disjoint resources, so they run concurrently up to
    /// the worker cap; stages within one dashboard stay strictly ordered.
    /// A dashboard's failure never touches its siblings, and the report
    /// gains an entry for every dashboard no matter how it went.
    pub async fn run(&self, request: ScheduleRequest) -> ScheduleReport {
        info!(
            title = %request.title,
            dashboards = request.dashboards.len(),
            destinations = request.destinations.len(),
            "Starting schedule run"
        );

        let mut report = ScheduleReport::new(request.title.clone());
        let destinations = Arc::new(request.destinations);
        let semaphore = Arc::new(Semaphore::new(self.worker_count));
        let mut tasks = JoinSet::new();

        for (key, target) in request.dashboards {
            let capture = Arc::clone(&self.capture);
            let publish = Arc::clone(&self.publish);
            let destinations = Arc::clone(&destinations);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("schedule semaphore closed");

                let dashboard_report =
                    process_dashboard(&capture, &publish, &target, &destinations).await;

                (key, dashboard_report)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, dashboard_report)) => {
                    report.dashboards.insert(key, dashboard_report);
                }
                Err(e) => {
                    error!(error = %e, "Dashboard task aborted");
                }
            }
        }

        report.finalize();
        report
    }
}

/// One dashboard end to end: capture, publish to every destination, then
/// release the session. The release runs on every path out of capture, so
/// the snapshot deletion and scratch-directory removal always happen.
async fn process_dashboard(
    capture: &CaptureEngine,
    publish: &PublishEngine,
    target: &DashboardTarget,
    destinations: &BTreeMap<String, PageDestination>,
) -> DashboardReport {
    let mut report = DashboardReport::new(&target.uid, destinations.keys());

    let mut outcome = capture.capture(target, &mut report.capture).await;

    if outcome.completed {
        for (dest_key, dest) in destinations {
            if let Some(stages) = report.publish.get_mut(dest_key) {
                publish
                    .publish(
                        dest,
                        &outcome.dashboard_title,
                        &target.uid,
                        outcome.window,
                        &outcome.panels,
                        stages,
                    )
                    .await;
            }
        }
    }

    if let Some(session) = outcome.session.take() {
        let (snapshot_delete, remove_scratch_dir) = capture.release(session, target).await;
        report.capture.snapshot_delete = snapshot_delete;
        report.capture.remove_scratch_dir = remove_scratch_dir;
    }

    report.finalize();
    report
}
