// Recording service - session control, ingestion and point-set queries
use crate::application::telemetry_repository::SessionRepository;
use crate::domain::session::{RecordingState, SessionStatus, is_bare_file_name, session_file_name};
use crate::domain::telemetry::{DataBatch, DataPoint};
use crate::error::{Result, TelemetryError};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Result of an ingestion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Nothing is being recorded; the batch was ignored.
    NotRecording,
    Created { file_name: String, points: usize },
    Appended { file_name: String, points: usize },
}

impl IngestOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            IngestOutcome::NotRecording => "Recording is stopped.",
            IngestOutcome::Created { .. } => "File created and data saved successfully!",
            IngestOutcome::Appended { .. } => "Data saved successfully!",
        }
    }
}

#[derive(Clone)]
pub struct RecordingService {
    repository: Arc<dyn SessionRepository>,
    state: Arc<RwLock<RecordingState>>,
}

impl RecordingService {
    pub fn new(repository: Arc<dyn SessionRepository>, default_session_name: String) -> Self {
        Self {
            repository,
            state: Arc::new(RwLock::new(RecordingState::new(default_session_name))),
        }
    }

    /// Begin recording into a fresh log named after the session and `now`.
    pub async fn start(&self, now: DateTime<Utc>) -> String {
        let mut state = self.state.write().await;
        let file_name = session_file_name(&state.session_name, now);
        state.current_file = Some(file_name.clone());
        state.selected_file = None;
        tracing::info!("Recording started into {}", file_name);
        file_name
    }

    pub async fn stop(&self) {
        let mut state = self.state.write().await;
        if let Some(file_name) = state.current_file.take() {
            tracing::info!("Recording stopped, {} is now immutable", file_name);
        }
    }

    pub async fn set_session_name(&self, new_name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        if state.is_recording() {
            return Err(TelemetryError::RecordingActive);
        }
        if !is_bare_file_name(new_name) {
            return Err(TelemetryError::InvalidPayload(format!(
                "Invalid session name: {:?}",
                new_name
            )));
        }
        state.session_name = new_name.to_string();
        Ok(())
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.read().await.status()
    }

    pub async fn list_files(&self) -> Result<Vec<String>> {
        self.repository.list_sessions().await
    }

    pub async fn select_file(&self, file_name: &str) -> Result<()> {
        if !is_bare_file_name(file_name) {
            return Err(TelemetryError::InvalidPayload(format!(
                "Invalid file name: {:?}",
                file_name
            )));
        }
        if !self.repository.exists(file_name).await? {
            return Err(TelemetryError::NotFound("File".to_string()));
        }

        self.state.write().await.selected_file = Some(file_name.to_string());
        tracing::info!("Selected {} for replay", file_name);
        Ok(())
    }

    pub async fn clear_selected_file(&self) {
        self.state.write().await.selected_file = None;
    }

    /// Validate, normalize and append a raw batch to the session being recorded.
    ///
    /// The state lock is released before any file I/O, so a `stop` racing this call can let
    /// one batch land in the log after recording ended. A session has a single ingesting
    /// device; the race is only reported.
    pub async fn ingest(&self, body: Value) -> Result<IngestOutcome> {
        let Some(file_name) = self.state.read().await.current_file.clone() else {
            return Ok(IngestOutcome::NotRecording);
        };

        let raw = match body {
            Value::Object(mut fields) => match fields.remove("data") {
                Some(Value::Array(raw)) => raw,
                _ => return Err(invalid_batch()),
            },
            _ => return Err(invalid_batch()),
        };

        let points = DataPoint::from_raw_batch(raw)?;
        let count = points.len();
        let outcome = self.repository.append(&file_name, &points).await?;

        if self.state.read().await.current_file.as_deref() != Some(file_name.as_str()) {
            tracing::warn!(
                "Recording into {} ended while a batch was being written; {} points landed after stop",
                file_name,
                count
            );
        }

        Ok(if outcome.created {
            IngestOutcome::Created { file_name, points: count }
        } else {
            IngestOutcome::Appended { file_name, points: count }
        })
    }

    /// Points of the active session newer than `since`.
    pub async fn data_since(&self, since: Option<i64>) -> Result<DataBatch> {
        let Some(file_name) = self.state.read().await.active_file().map(str::to_string) else {
            return Ok(DataBatch::default());
        };

        let data = self.repository.query(&file_name, since).await?;
        Ok(DataBatch {
            data,
            file_name: Some(file_name),
        })
    }
}

fn invalid_batch() -> TelemetryError {
    TelemetryError::InvalidPayload("Data must be an object with a 'data' array.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::json_file_repository::JsonFileRepository;
    use chrono::TimeZone;
    use serde_json::json;

    fn service() -> (tempfile::TempDir, RecordingService) {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(JsonFileRepository::new(dir.path()));
        (dir, RecordingService::new(repository, "session1".to_string()))
    }

    fn started_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 7, 22, 4, 26, 40).unwrap()
    }

    fn gyro() -> Value {
        json!({
            "angular_velocity": {"x": 1.0, "y": 2.0, "z": 3.0},
            "acceleration": {"x": 0.1, "y": 0.2, "z": 0.3},
            "resultant_acceleration": 0.4
        })
    }

    #[tokio::test]
    async fn test_ingest_while_stopped_is_a_no_op() {
        let (dir, service) = service();
        let outcome = service
            .ingest(json!({"data": [{"timestamp": 1690000000}]}))
            .await
            .unwrap();

        assert_eq!(outcome, IngestOutcome::NotRecording);
        assert_eq!(outcome.message(), "Recording is stopped.");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_seconds_scale_point_is_stored_in_millis() {
        let (_dir, service) = service();
        let file_name = service.start(started_at()).await;
        assert_eq!(file_name, "session1_2023_07_22T04_26_40.json");

        let outcome = service
            .ingest(json!({"data": [{"timestamp": 1690000000, "sensors": {"GYRO": gyro()}}]}))
            .await
            .unwrap();
        assert_eq!(outcome.message(), "File created and data saved successfully!");

        let all = service.data_since(None).await.unwrap();
        assert_eq!(all.data[0].timestamp, 1_690_000_000_000);
        assert_eq!(all.file_name.as_deref(), Some(file_name.as_str()));

        assert!(service.data_since(Some(1_690_000_000_000)).await.unwrap().data.is_empty());
        assert_eq!(service.data_since(Some(1_689_999_999_999)).await.unwrap().data.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_batch_leaves_log_unchanged() {
        let (_dir, service) = service();
        service.start(started_at()).await;
        service
            .ingest(json!({"data": [{"timestamp": 1690000000}]}))
            .await
            .unwrap();
        let before = service.data_since(None).await.unwrap().data;

        let result = service
            .ingest(json!({"data": [{"timestamp": 1690000001}, {"sensors": {}}]}))
            .await;
        assert!(matches!(result, Err(TelemetryError::Validation { index: 1, .. })));

        assert_eq!(service.data_since(None).await.unwrap().data, before);
    }

    #[tokio::test]
    async fn test_ingest_rejects_non_array_payload() {
        let (_dir, service) = service();
        service.start(started_at()).await;

        for body in [json!({"data": {}}), json!([1, 2]), json!({"points": []})] {
            assert!(matches!(
                service.ingest(body).await,
                Err(TelemetryError::InvalidPayload(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_second_append_reports_appended() {
        let (_dir, service) = service();
        service.start(started_at()).await;
        service.ingest(json!({"data": [{"timestamp": 1}]})).await.unwrap();

        let outcome = service.ingest(json!({"data": [{"timestamp": 2}]})).await.unwrap();
        assert!(matches!(outcome, IngestOutcome::Appended { points: 1, .. }));
    }

    /// Repository that stops the recording while an append is in flight.
    struct StopDuringAppend {
        inner: JsonFileRepository,
        state: std::sync::OnceLock<Arc<RwLock<RecordingState>>>,
    }

    #[async_trait::async_trait]
    impl SessionRepository for StopDuringAppend {
        async fn append(
            &self,
            session_id: &str,
            points: &[DataPoint],
        ) -> Result<crate::application::telemetry_repository::AppendOutcome> {
            let outcome = self.inner.append(session_id, points).await?;
            if let Some(state) = self.state.get() {
                state.write().await.current_file = None;
            }
            Ok(outcome)
        }

        async fn query(&self, session_id: &str, since: Option<i64>) -> Result<Vec<DataPoint>> {
            self.inner.query(session_id, since).await
        }

        async fn list_sessions(&self) -> Result<Vec<String>> {
            self.inner.list_sessions().await
        }

        async fn exists(&self, session_id: &str) -> Result<bool> {
            self.inner.exists(session_id).await
        }
    }

    #[tokio::test]
    async fn test_stop_during_append_keeps_later_batches_out() {
        let dir = tempfile::tempdir().unwrap();
        let repository = Arc::new(StopDuringAppend {
            inner: JsonFileRepository::new(dir.path()),
            state: std::sync::OnceLock::new(),
        });
        let service = RecordingService::new(repository.clone(), "session1".to_string());
        let _ = repository.state.set(service.state.clone());

        let file_name = service.start(started_at()).await;
        let outcome = service
            .ingest(json!({"data": [{"timestamp": 1}]}))
            .await
            .unwrap();
        assert_eq!(outcome, IngestOutcome::Created { file_name: file_name.clone(), points: 1 });
        assert!(!service.status().await.is_recording);

        let late = service.ingest(json!({"data": [{"timestamp": 2}]})).await.unwrap();
        assert_eq!(late, IngestOutcome::NotRecording);

        let stored = repository.inner.query(&file_name, None).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_session_name_locked_while_recording() {
        let (_dir, service) = service();
        service.set_session_name("bench").await.unwrap();
        let file_name = service.start(started_at()).await;
        assert!(file_name.starts_with("bench_"));

        assert!(matches!(
            service.set_session_name("other").await,
            Err(TelemetryError::RecordingActive)
        ));

        service.stop().await;
        let status = service.status().await;
        assert!(!status.is_recording);
        assert_eq!(status.current_file_name, None);
        service.set_session_name("other").await.unwrap();
        assert!(service.set_session_name("../x").await.is_err());
    }

    #[tokio::test]
    async fn test_select_and_clear_replay_file() {
        let (_dir, service) = service();
        assert!(matches!(
            service.select_file("missing.json").await,
            Err(TelemetryError::NotFound(_))
        ));

        let file_name = service.start(started_at()).await;
        service.ingest(json!({"data": [{"timestamp": 1}]})).await.unwrap();
        service.stop().await;
        assert!(service.data_since(None).await.unwrap().data.is_empty());

        service.select_file(&file_name).await.unwrap();
        assert_eq!(service.status().await.selected_file_name.as_deref(), Some(file_name.as_str()));
        assert_eq!(service.data_since(None).await.unwrap().data.len(), 1);
        assert_eq!(service.list_files().await.unwrap(), vec![file_name]);

        service.clear_selected_file().await;
        assert!(service.data_since(None).await.unwrap().file_name.is_none());
    }

    #[tokio::test]
    async fn test_start_clears_replay_selection() {
        let (_dir, service) = service();
        let first = service.start(started_at()).await;
        service.ingest(json!({"data": [{"timestamp": 1}]})).await.unwrap();
        service.stop().await;
        service.select_file(&first).await.unwrap();

        service.start(started_at() + chrono::Duration::seconds(5)).await;
        let status = service.status().await;
        assert!(status.is_recording);
        assert_eq!(status.selected_file_name, None);
    }
}
