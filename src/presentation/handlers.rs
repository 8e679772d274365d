// HTTP request handlers
use crate::domain::session::SessionStatus;
use crate::domain::telemetry::DataBatch;
use crate::error::{Result, TelemetryError};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub message: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetSessionNameRequest {
    #[serde(rename = "newSessionName")]
    pub new_session_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectFileRequest {
    #[serde(rename = "fileName")]
    pub file_name: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct DataQuery {
    pub since: Option<String>,
}

/// Liveness probe
pub async fn health_check() -> &'static str {
    "Hello! The server is running."
}

pub async fn start_recording(State(state): State<Arc<AppState>>) -> Json<StartResponse> {
    let file_name = state.recording_service.start(chrono::Utc::now()).await;
    Json(StartResponse {
        message: "Recording started.".to_string(),
        file_name,
    })
}

pub async fn stop_recording(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    state.recording_service.stop().await;
    MessageResponse::new("Recording stopped.")
}

pub async fn set_session_name(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetSessionNameRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .recording_service
        .set_session_name(&request.new_session_name)
        .await?;
    Ok(MessageResponse::new(format!(
        "Session name changed to {}.",
        request.new_session_name
    )))
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<SessionStatus> {
    Json(state.recording_service.status().await)
}

/// Points of the active session newer than `since` (epoch ms).
pub async fn data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DataQuery>,
) -> Result<Json<DataBatch>> {
    let since = parse_since(query.since.as_deref())?;
    Ok(Json(state.recording_service.data_since(since).await?))
}

/// Empty means "from the start"; anything else must be numeric.
fn parse_since(raw: Option<&str>) -> Result<Option<i64>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    match raw.parse::<f64>() {
        Ok(since) if since.is_finite() => Ok(Some(since.floor() as i64)),
        _ => Err(TelemetryError::InvalidSince(raw.to_string())),
    }
}

pub async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<FileListResponse>> {
    let files = state.recording_service.list_files().await?;
    Ok(Json(FileListResponse { files }))
}

pub async fn select_file(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectFileRequest>,
) -> Result<Json<MessageResponse>> {
    state.recording_service.select_file(&request.file_name).await?;
    Ok(MessageResponse::new(format!(
        "File {} selected.",
        request.file_name
    )))
}

pub async fn clear_selected_file(State(state): State<Arc<AppState>>) -> Json<MessageResponse> {
    state.recording_service.clear_selected_file().await;
    MessageResponse::new("Selected file cleared.")
}

/// Device ingestion endpoint: `{ "data": [DataPoint, ...] }`.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> Result<Json<MessageResponse>> {
    let outcome = state.recording_service.ingest(body).await?;
    tracing::debug!("Ingest: {:?}", outcome);
    Ok(MessageResponse::new(outcome.message()))
}
