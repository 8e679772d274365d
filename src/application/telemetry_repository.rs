// Repository trait for session log persistence
use crate::domain::telemetry::DataPoint;
use crate::error::Result;
use async_trait::async_trait;

/// What an append did to the session log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// The log did not exist before this append.
    pub created: bool,
    /// Points in the log after the append.
    pub total_points: usize,
}

/// Append-only store holding one ordered log per recording session.
///
/// Appends are read-modify-write and are not serialized against each other; a session
/// must have a single ingesting source while it is being recorded.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Append already validated, normalized points. The log stays ordered by timestamp
    /// whatever order the batch arrives in.
    async fn append(&self, session_id: &str, points: &[DataPoint]) -> Result<AppendOutcome>;

    /// Points with `timestamp > since` in ascending timestamp order; the whole log when `since` is `None`.
    /// An absent or unreadable log yields an empty list.
    async fn query(&self, session_id: &str, since: Option<i64>) -> Result<Vec<DataPoint>>;

    /// Names of the stored session logs.
    async fn list_sessions(&self) -> Result<Vec<String>>;

    async fn exists(&self, session_id: &str) -> Result<bool>;
}
