use crate::application::series_registry::BoundsPolicy;
use crate::domain::series::MAX_SAMPLES_PER_SERIES;
use crate::domain::window::TimeWindow;
use anyhow::Context;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "TELEMETRY";

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub default_session_name: String,
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewerConfig {
    pub viewer: ViewerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewerSettings {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub status_interval_ms: u64,
    /// "all" or a number of seconds.
    pub time_window: String,
    pub series_capacity: usize,
    pub bounds: BoundsPolicy,
    #[serde(default)]
    pub replay_file: Option<String>,
}

impl ViewerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms.max(1))
    }

    pub fn window(&self) -> anyhow::Result<TimeWindow> {
        self.time_window
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("Invalid viewer.time_window")
    }
}

fn builder(file: &str) -> config::ConfigBuilder<config::builder::DefaultState> {
    config::Config::builder()
        .add_source(config::File::with_name(file).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
}

pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    load_server_config_from("config/server")
}

pub fn load_server_config_from(file: &str) -> anyhow::Result<ServerConfig> {
    let settings = builder(file)
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5000)?
        .set_default("server.data_dir", "ReceivedData")?
        .set_default("server.upload_dir", "ReceivedData/Cam")?
        .set_default("server.static_dir", "public")?
        .set_default("server.default_session_name", "session1")?
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_viewer_config() -> anyhow::Result<ViewerConfig> {
    load_viewer_config_from("config/viewer")
}

pub fn load_viewer_config_from(file: &str) -> anyhow::Result<ViewerConfig> {
    let settings = builder(file)
        .set_default("viewer.base_url", "http://127.0.0.1:5000")?
        .set_default("viewer.poll_interval_ms", 500)?
        .set_default("viewer.status_interval_ms", 2000)?
        .set_default("viewer.time_window", "20")?
        .set_default("viewer.series_capacity", MAX_SAMPLES_PER_SERIES as i64)?
        .set_default("viewer.bounds", "running")?
        .build()?;

    Ok(settings.try_deserialize()?)
}
