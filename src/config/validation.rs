use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("capture.worker_count must be at least 1")]
    ZeroWorkerCount,

    #[error("capture.window_hours must be at least 1")]
    ZeroWindow,

    #[error("{0} must be non-zero")]
    ZeroTimeout(&'static str),

    #[error("browser.webdriver_url must not be empty")]
    EmptyWebDriverUrl,

    #[error("browser.poll_interval_ms must be non-zero")]
    ZeroPollInterval,
}

pub fn validate(config: &Config) -> Result<(), ValidationError> {
    if config.capture.worker_count == 0 {
        return Err(ValidationError::ZeroWorkerCount);
    }

    if config.capture.window_hours == 0 {
        return Err(ValidationError::ZeroWindow);
    }

    if config.grafana.api_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout("grafana.api_timeout_secs"));
    }

    if config.confluence.api_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout("confluence.api_timeout_secs"));
    }

    if config.browser.step_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout("browser.step_timeout_secs"));
    }

    if config.browser.webdriver_url.trim().is_empty() {
        return Err(ValidationError::EmptyWebDriverUrl);
    }

    if config.browser.poll_interval_ms == 0 {
        return Err(ValidationError::ZeroPollInterval);
    }

    Ok(())
}
