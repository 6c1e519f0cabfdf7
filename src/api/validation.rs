use thiserror::Error;

use super::models::ScheduleRequest;

#[derive(Debug, Error)]
pub enum ScheduleValidationError {
    #[error("schedule contains no dashboards")]
    NoDashboards,
    #[error("dashboard '{0}' has an empty host")]
    EmptyDashboardHost(String),
    #[error("dashboard '{0}' has an empty uid")]
    EmptyDashboardUid(String),
    #[error("dashboard '{0}' has an empty credential")]
    EmptyDashboardCredential(String),
    #[error("destination '{0}' has an empty host")]
    EmptyDestinationHost(String),
    #[error("destination '{0}' has an empty space key")]
    EmptyDestinationSpaceKey(String),
    #[error("destination '{0}' has an empty top page id")]
    EmptyDestinationTopPage(String),
    #[error("destination '{0}' has an empty credential")]
    EmptyDestinationCredential(String),
}

/// Reject structurally invalid schedules before any remote call is made.
pub fn validate_schedule(request: &ScheduleRequest) -> Result<(), ScheduleValidationError> {
    if request.dashboards.is_empty() {
        return Err(ScheduleValidationError::NoDashboards);
    }

    for (key, dashboard) in &request.dashboards {
        if dashboard.host.is_empty() {
            return Err(ScheduleValidationError::EmptyDashboardHost(key.clone()));
        }
        if dashboard.uid.is_empty() {
            return Err(ScheduleValidationError::EmptyDashboardUid(key.clone()));
        }
        if dashboard.auth.is_empty() {
            return Err(ScheduleValidationError::EmptyDashboardCredential(key.clone()));
        }
    }

    for (key, destination) in &request.destinations {
        if destination.host.is_empty() {
            return Err(ScheduleValidationError::EmptyDestinationHost(key.clone()));
        }
        if destination.space_key.is_empty() {
            return Err(ScheduleValidationError::EmptyDestinationSpaceKey(key.clone()));
        }
        if destination.top_page_id.is_empty() {
            return Err(ScheduleValidationError::EmptyDestinationTopPage(key.clone()));
        }
        if destination.auth.is_empty() {
            return Err(ScheduleValidationError::EmptyDestinationCredential(key.clone()));
        }
    }

    Ok(())
}
