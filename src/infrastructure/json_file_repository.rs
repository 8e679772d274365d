// Session log repository backed by one JSON array file per session
use crate::application::telemetry_repository::{AppendOutcome, SessionRepository};
use crate::domain::session::{is_bare_file_name, is_session_file};
use crate::domain::telemetry::DataPoint;
use crate::error::{Result, TelemetryError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A session log as found on disk.
enum StoredLog {
    Missing,
    Points(Vec<DataPoint>),
    /// Present but not a point array, e.g. caught mid-rewrite or hand-edited.
    Unreadable(String),
}

#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    fn path_for(&self, session_id: &str) -> Result<PathBuf> {
        if !is_bare_file_name(session_id) {
            return Err(TelemetryError::InvalidPayload(format!(
                "Invalid session file name: {}",
                session_id
            )));
        }
        Ok(self.dir.join(session_id))
    }

    async fn read_log(&self, path: &Path) -> Result<StoredLog> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoredLog::Missing),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Vec<DataPoint>>(&bytes) {
            Ok(points) => Ok(StoredLog::Points(points)),
            Err(e) => Ok(StoredLog::Unreadable(e.to_string())),
        }
    }

    /// Replace the log through a sibling temp file so readers never see a half-written array.
    async fn write_log(&self, path: &Path, points: &[DataPoint]) -> Result<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("session");
        let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

        let body = serde_json::to_vec_pretty(points)?;
        tokio::fs::write(&tmp_path, body).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for JsonFileRepository {
    async fn append(&self, session_id: &str, points: &[DataPoint]) -> Result<AppendOutcome> {
        let path = self.path_for(session_id)?;

        let (created, mut log) = match self.read_log(&path).await? {
            StoredLog::Missing => (true, Vec::new()),
            StoredLog::Points(points) => (false, points),
            StoredLog::Unreadable(reason) => {
                tracing::error!(
                    "Session log {} is unreadable ({}); its previous contents will be replaced",
                    path.display(),
                    reason
                );
                (false, Vec::new())
            }
        };

        // Stable sort keeps arrival order among equal timestamps.
        log.extend_from_slice(points);
        log.sort_by_key(|p| p.timestamp);
        self.write_log(&path, &log).await?;

        tracing::debug!(
            "Appended {} points to {} ({} total)",
            points.len(),
            session_id,
            log.len()
        );

        Ok(AppendOutcome {
            created,
            total_points: log.len(),
        })
    }

    async fn query(&self, session_id: &str, since: Option<i64>) -> Result<Vec<DataPoint>> {
        let path = self.path_for(session_id)?;
        let log = match self.read_log(&path).await? {
            StoredLog::Missing => Vec::new(),
            StoredLog::Points(points) => points,
            StoredLog::Unreadable(reason) => {
                tracing::warn!(
                    "Session log {} is unreadable ({}), answering with no data",
                    path.display(),
                    reason
                );
                Vec::new()
            }
        };

        let mut points: Vec<DataPoint> = match since {
            Some(since) => log.into_iter().filter(|p| p.timestamp > since).collect(),
            None => log,
        };
        // Logs not written through `append` may be unordered.
        if !points.is_sorted_by_key(|p| p.timestamp) {
            points.sort_by_key(|p| p.timestamp);
        }
        Ok(points)
    }

    async fn list_sessions(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut sessions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_session_file(name) && !name.starts_with('.') {
                    sessions.push(name.to_string());
                }
            }
        }

        sessions.sort();
        Ok(sessions)
    }

    async fn exists(&self, session_id: &str) -> Result<bool> {
        let path = self.path_for(session_id)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}
