use std::sync::Arc;

use crate::config::Config;
use crate::credentials::CredentialChecker;
use crate::observability::Metrics;
use crate::schedule::ScheduleRunner;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub runner: Arc<ScheduleRunner>,
    pub credentials: Arc<CredentialChecker>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, runner: ScheduleRunner, credentials: CredentialChecker) -> Self {
        Self {
            config: Arc::new(config),
            runner: Arc::new(runner),
            credentials: Arc::new(credentials),
            metrics: Arc::new(Metrics::new()),
        }
    }
}
