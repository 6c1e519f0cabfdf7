use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    services::{check_credentials, check_schedule, health},
    state::AppState,
};
use crate::browser::WebDriverBrowser;
use crate::capture::CaptureEngine;
use crate::config::Config;
use crate::confluence::ConfluenceClient;
use crate::credentials::CredentialChecker;
use crate::grafana::GrafanaClient;
use crate::publish::PublishEngine;
use crate::schedule::ScheduleRunner;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(address: Option<SocketAddr>) -> Result<(), AnyError> {
    info!("Loading configuration");
    let config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;

    let address = address.unwrap_or(config.server.bind_addr);

    let grafana = Arc::new(
        GrafanaClient::new(&config.grafana)
            .map_err(|e| format!("Failed to build grafana client: {}", e))?,
    );
    let confluence = Arc::new(
        ConfluenceClient::new(&config.confluence)
            .map_err(|e| format!("Failed to build confluence client: {}", e))?,
    );
    let browser = Arc::new(
        WebDriverBrowser::new(&config.browser)
            .map_err(|e| format!("Failed to build browser driver: {}", e))?,
    );

    let capture = Arc::new(CaptureEngine::new(
        grafana.clone(),
        browser,
        &config.capture,
    ));
    let publish = Arc::new(PublishEngine::new(confluence.clone()));
    let runner = ScheduleRunner::new(capture, publish, config.capture.worker_count);
    let credentials = CredentialChecker::new(grafana, confluence);

    let state = AppState::new(config, runner, credentials);

    let app = Router::new()
        .route("/schedule/check", post(check_schedule))
        .route("/credentials/check", post(check_credentials))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(address).await?;
    info!(%address, "graphsnap API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
