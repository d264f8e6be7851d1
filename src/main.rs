// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::auth_service::AuthService;
use crate::application::machine_api::{AuthApi, MachineApi};
use crate::application::maintenance_service::MaintenanceService;
use crate::application::monitor_service::MonitorService;
use crate::application::scheduler::spawn_poll_scheduler;
use crate::application::telemetry_client::TelemetryClient;
use crate::infrastructure::client_store::ClientStore;
use crate::infrastructure::config::load_monitor_config;
use crate::infrastructure::http_machine_api::HttpMachineApi;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    connection, current_user, dismiss_alert, downtime_history, downtime_statistics, get_dashboard,
    get_fmea, get_preferences, health_check, login, logout, predict, refresh_dashboard, register,
    set_notifications, stream_dashboard, toggle_notifications,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_monitor_config()?;
    let components = config
        .poll
        .component_names()
        .context("invalid poll.components")?;

    // Backend adapter and local client store (infrastructure layer)
    let http_api = Arc::new(
        HttpMachineApi::new(config.api.base_url.clone(), config.api.request_timeout())
            .context("failed to build backend HTTP client")?,
    );
    let backend = http_api.base_url().to_string();
    let machine_api: Arc<dyn MachineApi> = http_api.clone();
    let auth_api: Arc<dyn AuthApi> = http_api;
    let store = Arc::new(ClientStore::load(&config.store.path));

    // Create services (application layer)
    let client = TelemetryClient::new(machine_api.clone(), components, config.api.request_timeout());
    let monitor = Arc::new(MonitorService::new(
        client,
        backend.clone(),
        config.poll.history_capacity,
        config.poll.gap_policy,
    ));
    let scheduler = spawn_poll_scheduler(monitor.clone(), config.poll.interval());

    let state = Arc::new(AppState {
        monitor,
        refresh: scheduler.refresh_trigger(),
        auth: AuthService::new(auth_api, store.clone()),
        maintenance: MaintenanceService::new(machine_api),
        store,
    });

    // Build router (presentation layer)
    // Compression is applied per response and per stream frame, so there is
    // no CompressionLayer here.
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(current_user))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/stream", get(stream_dashboard))
        .route("/dashboard/refresh", post(refresh_dashboard))
        .route("/alert/dismiss", post(dismiss_alert))
        .route("/preferences", get(get_preferences))
        .route("/preferences/notifications", put(set_notifications))
        .route("/preferences/notifications/toggle", post(toggle_notifications))
        .route("/fmea/:component", get(get_fmea))
        .route("/downtime/history", get(downtime_history))
        .route("/downtime/statistics", get(downtime_statistics))
        .route("/predict", post(predict))
        .route("/connection", get(connection))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .listen
        .parse()
        .with_context(|| format!("invalid server.listen address {}", config.server.listen))?;
    tracing::info!(
        "Starting flexo-monitor on {} (backend {}, poll every {:?})",
        addr,
        backend,
        config.poll.interval()
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, shutting down poll scheduler");
    scheduler.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
