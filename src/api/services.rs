use axum::{Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};

use super::models::{CredentialCheckRequest, ScheduleRequest};
use super::state::AppState;
use crate::api::error::ApiError;

/// Schedule check endpoint (POST /schedule/check)
///
/// Runs the full capture-and-publish pipeline for every dashboard in the
/// request and returns the stage-level report.
///
/// ## Flow:
/// 1. Validate the request shape (hosts, uids, credentials present)
/// 2. Run each dashboard through capture → publish under the worker cap
/// 3. Record metrics from the finished report
/// 4. Return 200 with the complete ScheduleReport
///
/// A completed run always answers 200: per-dashboard and per-panel
/// failures are visible only inside the report body, where stages that
/// were never reached stay at their "Not executed" sentinel.
pub async fn check_schedule(
    State(state): State<AppState>,
    payload: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidPayload(e.body_text()))?;

    super::validation::validate_schedule(&request)
        .map_err(|e| ApiError::InvalidPayload(e.to_string()))?;

    let report = state.runner.run(request).await;

    state.metrics.schedule_run();
    for dashboard in report.dashboards.values() {
        state.metrics.dashboard_processed();
        if dashboard.has_failures() {
            state.metrics.dashboard_failed();
        }
        state.metrics.panels_captured(dashboard.captured_panel_count());
        state.metrics.panels_uploaded(dashboard.uploaded_panel_count());
    }

    Ok((axum::http::StatusCode::OK, Json(report)))
}

/// Credential check endpoint (POST /credentials/check)
///
/// Probes every declared credential with one authenticated no-op call and
/// returns pass/fail with cause per credential, in request order.
pub async fn check_credentials(
    State(state): State<AppState>,
    payload: Result<Json<CredentialCheckRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidPayload(e.body_text()))?;

    let response = state.credentials.check(&request).await;

    Ok((axum::http::StatusCode::OK, Json(response)))
}

/// Health check endpoint (GET /health)
pub async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    use std::collections::HashMap;

    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());
    components.insert("pipeline".to_string(), "healthy".to_string());

    let response = super::models::HealthResponse {
        status: "healthy".to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (axum::http::StatusCode::OK, Json(response))
}
