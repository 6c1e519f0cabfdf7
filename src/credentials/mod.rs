//! Credential validation: one authenticated no-op call per declared
//! credential, pass/fail with cause.

use crate::api::models::{
    CredentialCheckRequest, CredentialCheckResponse, CredentialCheckRow, ServiceTarget,
};
use crate::confluence::PageStore;
use crate::grafana::DashboardSource;
use crate::report::StageResult;
use std::sync::Arc;
use tracing::debug;

pub struct CredentialChecker {
    grafana: Arc<dyn DashboardSource>,
    confluence: Arc<dyn PageStore>,
}

impl CredentialChecker {
    pub fn new(grafana: Arc<dyn DashboardSource>, confluence: Arc<dyn PageStore>) -> Self {
        Self { grafana, confluence }
    }

    /// Probe every credential in the batch. Input order is preserved and a
    /// failing entry never stops the rest.
    pub async fn check(&self, request: &CredentialCheckRequest) -> CredentialCheckResponse {
        debug!(
            grafana = request.grafana.len(),
            confluence = request.confluence.len(),
            "Checking credential batch"
        );

        let mut grafana = Vec::with_capacity(request.grafana.len());
        for target in &request.grafana {
            let outcome = self
                .grafana
                .login_ping(&target.host, target.port, &target.auth)
                .await;
            grafana.push(row(target, outcome));
        }

        let mut confluence = Vec::with_capacity(request.confluence.len());
        for target in &request.confluence {
            let outcome = self
                .confluence
                .access_mode(&target.host, target.port, &target.auth)
                .await;
            confluence.push(row(target, outcome));
        }

        CredentialCheckResponse { grafana, confluence }
    }
}

fn row(target: &ServiceTarget, outcome: StageResult) -> CredentialCheckRow {
    CredentialCheckRow {
        host: target.host.clone(),
        port: target.port,
        succeeded: outcome.succeeded,
        cause: outcome.cause,
    }
}
