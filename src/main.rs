// Main entry point - Dependency injection and server setup
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use live_telemetry::application::event_hub::EventHub;
use live_telemetry::application::history_source::{HistorySource, NoHistory};
use live_telemetry::application::view_service::ViewService;
use live_telemetry::infrastructure::config::{SourceKind, load_app_config};
use live_telemetry::infrastructure::http_history::HttpHistorySource;
use live_telemetry::infrastructure::json_lines_source::JsonLinesSource;
use live_telemetry::infrastructure::simulated_source::SimulatedSource;
use live_telemetry::presentation::app_state::AppState;
use live_telemetry::presentation::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let app_config = load_app_config().context("Failed to load configuration")?;
    let addr = app_config.bind_addr()?;
    let view_settings = app_config.view_settings()?;
    let sample_period = app_config.sample_period()?;

    // Create ingress (infrastructure layer)
    let hub = EventHub::new(app_config.hub.capacity);
    let _ingress = match app_config.source.kind {
        SourceKind::Simulated => hub.spawn_ingress(SimulatedSource::new(
            app_config.source.equipment_count,
            sample_period,
        )),
        SourceKind::Stdin => hub.spawn_ingress(JsonLinesSource::stdin()),
    };

    let history: Arc<dyn HistorySource> = match &app_config.history.base_url {
        Some(base_url) => Arc::new(HttpHistorySource::new(
            base_url.clone(),
            app_config.history.project_id.clone(),
            app_config.history.limit,
        )),
        None => Arc::new(NoHistory),
    };

    // Create services (application layer)
    let view_service = ViewService::new(hub, history, view_settings);
    let state = Arc::new(AppState::new(view_service));

    // Build router (presentation layer)
    let app = router(state);

    tracing::info!(%addr, source = ?app_config.source.kind, "starting live-telemetry service");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("live-telemetry stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
