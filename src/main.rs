// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use sensor_telemetry::application::recording_service::RecordingService;
use sensor_telemetry::infrastructure::config::load_server_config;
use sensor_telemetry::infrastructure::json_file_repository::JsonFileRepository;
use sensor_telemetry::presentation::app_state::AppState;
use sensor_telemetry::presentation::handlers::{
    clear_selected_file, data, health_check, ingest, list_files, select_file, set_session_name,
    start_recording, status, stop_recording,
};
use sensor_telemetry::presentation::upload::upload;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_server_config()?;
    let settings = config.server;

    // Create repository (infrastructure layer)
    let repository = Arc::new(JsonFileRepository::new(&settings.data_dir));
    repository.ensure_dir().await?;
    tokio::fs::create_dir_all(&settings.upload_dir).await?;

    // Create services (application layer)
    let recording_service =
        RecordingService::new(repository.clone(), settings.default_session_name.clone());

    // Create application state
    let state = Arc::new(AppState {
        recording_service,
        upload_dir: settings.upload_dir.clone(),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/", get(health_check).post(ingest))
        .route("/start", post(start_recording))
        .route("/stop", post(stop_recording))
        .route("/set-session-name", post(set_session_name))
        .route("/status", get(status))
        .route("/data", get(data))
        .route("/list-files", get(list_files))
        .route("/select-file", post(select_file))
        .route("/clear-selected-file", post(clear_selected_file))
        .route("/upload", get(upload))
        .fallback_service(ServeDir::new(&settings.static_dir))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = settings.bind_address().parse()?;
    tracing::info!(
        "Starting sensor-telemetry server on {} (data in {})",
        addr,
        repository.dir().display()
    );

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
