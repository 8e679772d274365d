// Viewer entry point - polls the telemetry server and keeps the chart model in sync
use std::sync::Arc;

use anyhow::Context;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio_stream::wrappers::IntervalStream;
use tracing_subscriber::EnvFilter;

use sensor_telemetry::application::series_registry::RegistryContext;
use sensor_telemetry::application::sync_client::{SyncClient, TickOutcome, poll_once, refresh_status};
use sensor_telemetry::application::window_controller::WindowController;
use sensor_telemetry::infrastructure::config::load_viewer_config;
use sensor_telemetry::infrastructure::http_source::HttpTelemetrySource;
use sensor_telemetry::infrastructure::tracing_surface::TracingSurface;

type SharedClient = Arc<Mutex<SyncClient<TracingSurface>>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_viewer_config()?;
    let settings = config.viewer;
    let window = settings.window()?;

    let source = Arc::new(HttpTelemetrySource::new(&settings.base_url)?);
    tracing::info!("Viewer polling {} every {:?}", settings.base_url, settings.poll_interval());

    if let Some(file) = settings.replay_file.as_deref() {
        let available = source.list_files().await.context("Failed to list session files")?;
        if !available.iter().any(|f| f == file) {
            anyhow::bail!("Replay file {} not found on server (have {:?})", file, available);
        }
        let message = source.select_file(file).await?;
        tracing::info!("{}", message);
    }

    let client: SharedClient = Arc::new(Mutex::new(SyncClient::new(
        RegistryContext::new(settings.series_capacity, settings.bounds),
        WindowController::new(window),
        TracingSurface::default(),
    )));

    if refresh_status(&client, source.as_ref()).await.is_none() {
        tracing::warn!("Server not reachable yet, will keep polling");
    }

    let status_loop = {
        let client = client.clone();
        let source = source.clone();
        let mut ticks = IntervalStream::new(tokio::time::interval(settings.status_interval()));
        async move {
            while ticks.next().await.is_some() {
                if let Some(status) = refresh_status(&client, source.as_ref()).await {
                    tracing::debug!("Status: {}", status.message);
                }
            }
        }
    };

    let data_loop = {
        let client = client.clone();
        let source = source.clone();
        let mut ticks = IntervalStream::new(tokio::time::interval(settings.poll_interval()));
        async move {
            while ticks.next().await.is_some() {
                let client = client.clone();
                let source = source.clone();
                // Ticks overlap on purpose; stale or repeated responses are discarded by the client.
                tokio::spawn(async move {
                    match poll_once(&client, source.as_ref()).await {
                        TickOutcome::Applied { points, cursor } => {
                            tracing::debug!("Applied {} points, cursor {}", points, cursor);
                        }
                        TickOutcome::Stale => tracing::debug!("Discarded stale response"),
                        _ => {}
                    }
                });
            }
        }
    };

    tokio::select! {
        _ = status_loop => {}
        _ = data_loop => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            tracing::info!("Viewer shutting down");
        }
    }

    Ok(())
}
