// Sync client - incremental pull of new points into the series registry
use crate::application::chart_surface::ChartSurface;
use crate::application::series_registry::RegistryContext;
use crate::application::window_controller::WindowController;
use crate::domain::session::SessionStatus;
use crate::domain::telemetry::{DataBatch, DataPoint};
use crate::domain::window::{TimeRange, TimeWindow};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Where the viewer pulls data and status from.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Points newer than `since`; the whole active session when `since` is `None`.
    async fn fetch_since(&self, since: Option<i64>) -> anyhow::Result<DataBatch>;

    async fn fetch_status(&self) -> anyhow::Result<SessionStatus>;
}

/// A poll in flight: what was asked and under which session generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTicket {
    pub generation: u64,
    pub since: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing recording and nothing selected for replay.
    Idle,
    Applied { points: usize, cursor: i64 },
    NoNewData,
    /// Transport or decode failure; the cursor is unchanged.
    Failed,
    /// The answer belongs to a session the client has since left.
    Stale,
}

pub struct SyncClient<S: ChartSurface> {
    cursor: Option<i64>,
    generation: u64,
    recording: bool,
    session: Option<String>,
    registry: RegistryContext,
    window: WindowController,
    surface: S,
}

impl<S: ChartSurface> SyncClient<S> {
    pub fn new(registry: RegistryContext, window: WindowController, surface: S) -> Self {
        Self {
            cursor: None,
            generation: 0,
            recording: false,
            session: None,
            registry,
            window,
            surface,
        }
    }

    /// Timestamp of the latest applied point; also the window anchor.
    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn registry(&self) -> &RegistryContext {
        &self.registry
    }

    pub fn window(&self) -> &WindowController {
        &self.window
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Start a tick, or `None` when there is nothing to follow.
    pub fn begin_tick(&self) -> Option<PollTicket> {
        if !self.recording && self.session.is_none() {
            return None;
        }
        Some(PollTicket {
            generation: self.generation,
            since: self.cursor,
        })
    }

    /// Apply the answer to `ticket`.
    ///
    /// Points at or before the cursor are skipped, so re-delivered or overlapping
    /// answers change nothing.
    pub fn complete_tick(&mut self, ticket: &PollTicket, result: anyhow::Result<DataBatch>) -> TickOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Discarding poll answer from generation {} (now {})",
                ticket.generation,
                self.generation
            );
            return TickOutcome::Stale;
        }

        let batch = match result {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!("Data poll failed, retrying from cursor {:?}: {:#}", self.cursor, e);
                return TickOutcome::Failed;
            }
        };

        match (self.session.as_deref(), batch.file_name.as_deref()) {
            (Some(expected), Some(actual)) if expected != actual => {
                tracing::debug!("Discarding poll answer for {} while following {}", actual, expected);
                return TickOutcome::Stale;
            }
            (None, Some(actual)) => self.session = Some(actual.to_string()),
            _ => {}
        }

        let cursor = self.cursor;
        let fresh: Vec<DataPoint> = batch
            .data
            .into_iter()
            .filter(|p| cursor.is_none_or(|c| p.timestamp > c))
            .collect();

        let Some(last) = fresh.iter().map(|p| p.timestamp).max() else {
            return TickOutcome::NoNewData;
        };

        let summary = self.registry.ingest(&fresh, &mut self.surface);
        self.cursor = Some(last);
        self.window.refresh(&self.registry, self.cursor, &mut self.surface);
        self.surface.redraw(&self.registry);

        tracing::debug!(
            "Applied {} points ({} samples, {} new series), cursor now {}",
            fresh.len(),
            summary.samples,
            summary.new_series,
            last
        );

        TickOutcome::Applied {
            points: fresh.len(),
            cursor: last,
        }
    }

    /// Follow a different session: forget the cursor, flush every series and
    /// invalidate polls still in flight.
    pub fn switch_session(&mut self, recording: bool, session: Option<String>) {
        tracing::info!(
            "Switching to {} ({})",
            session.as_deref().unwrap_or("no session"),
            if recording { "live" } else { "replay" }
        );
        self.recording = recording;
        self.session = session;
        self.cursor = None;
        self.generation += 1;
        self.registry.reset(&mut self.surface);
    }

    /// Explicit clear; same effect as switching to the current session afresh.
    pub fn clear(&mut self) {
        let session = self.session.take();
        self.switch_session(self.recording, session);
    }

    /// Track server status; a change of active session is a session switch.
    pub fn observe_status(&mut self, status: &SessionStatus) {
        let active = status.active_file();
        if active == self.session.as_deref() {
            self.recording = status.is_recording;
        } else {
            self.switch_session(status.is_recording, active.map(str::to_string));
        }
    }

    pub fn set_window(&mut self, mode: TimeWindow) -> Option<TimeRange> {
        self.window
            .set_mode(mode, &self.registry, self.cursor, &mut self.surface)
    }

    pub fn mark_user_interaction(&mut self) {
        self.window.mark_user_interaction();
    }

    pub fn reset_view(&mut self) -> Option<TimeRange> {
        self.window
            .reset_view(&self.registry, self.cursor, &mut self.surface)
    }
}

/// One data tick against a shared client. The lock is not held while the request is in flight,
/// so ticks may overlap.
pub async fn poll_once<S, T>(client: &Mutex<SyncClient<S>>, source: &T) -> TickOutcome
where
    S: ChartSurface,
    T: TelemetrySource + ?Sized,
{
    let Some(ticket) = client.lock().await.begin_tick() else {
        return TickOutcome::Idle;
    };

    let result = source.fetch_since(ticket.since).await;
    client.lock().await.complete_tick(&ticket, result)
}

/// One status tick. On failure the last known status stays in effect.
pub async fn refresh_status<S, T>(client: &Mutex<SyncClient<S>>, source: &T) -> Option<SessionStatus>
where
    S: ChartSurface,
    T: TelemetrySource + ?Sized,
{
    match source.fetch_status().await {
        Ok(status) => {
            client.lock().await.observe_status(&status);
            Some(status)
        }
        Err(e) => {
            tracing::warn!("Status poll failed, keeping last known status: {:#}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::series_registry::tests::{RecordingSurface, motor_point};
    use crate::domain::channel::SeriesKey;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    /// Source answering from a fixed log and recording the cursors it was asked for.
    struct FakeSource {
        file_name: String,
        log: Vec<DataPoint>,
        failures: StdMutex<VecDeque<bool>>,
        requests: StdMutex<Vec<Option<i64>>>,
        status: SessionStatus,
    }

    impl FakeSource {
        fn new(file_name: &str, log: Vec<DataPoint>) -> Self {
            Self {
                file_name: file_name.to_string(),
                log,
                failures: StdMutex::new(VecDeque::new()),
                requests: StdMutex::new(Vec::new()),
                status: recording_status(file_name),
            }
        }

        fn fail_next(&self) {
            self.failures.lock().unwrap().push_back(true);
        }
    }

    #[async_trait]
    impl TelemetrySource for FakeSource {
        async fn fetch_since(&self, since: Option<i64>) -> anyhow::Result<DataBatch> {
            self.requests.lock().unwrap().push(since);
            if self.failures.lock().unwrap().pop_front().unwrap_or(false) {
                anyhow::bail!("connection refused");
            }
            Ok(DataBatch {
                data: self
                    .log
                    .iter()
                    .filter(|p| since.is_none_or(|s| p.timestamp > s))
                    .cloned()
                    .collect(),
                file_name: Some(self.file_name.clone()),
            })
        }

        async fn fetch_status(&self) -> anyhow::Result<SessionStatus> {
            Ok(self.status.clone())
        }
    }

    fn recording_status(file_name: &str) -> SessionStatus {
        SessionStatus {
            is_recording: true,
            session_name: "session1".to_string(),
            current_file_name: Some(file_name.to_string()),
            selected_file_name: None,
            message: "Server is recording.".to_string(),
        }
    }

    fn client() -> SyncClient<RecordingSurface> {
        SyncClient::new(
            RegistryContext::default(),
            WindowController::new(TimeWindow::Trailing(20)),
            RecordingSurface::default(),
        )
    }

    fn log(times: &[i64]) -> Vec<DataPoint> {
        times.iter().map(|&t| motor_point(t, t as f64)).collect()
    }

    fn batch(file_name: &str, times: &[i64]) -> DataBatch {
        DataBatch {
            data: log(times),
            file_name: Some(file_name.to_string()),
        }
    }

    fn motor_len<S: ChartSurface>(client: &SyncClient<S>) -> usize {
        client
            .registry()
            .series(&SeriesKey::motor("I", "MOTOR1"))
            .map(|s| s.len())
            .unwrap_or(0)
    }

    #[test]
    fn test_idle_when_nothing_to_follow() {
        let client = client();
        assert_eq!(client.begin_tick(), None);
    }

    #[tokio::test]
    async fn test_first_tick_omits_since_then_follows_cursor() {
        let source = FakeSource::new("a.json", log(&[1_000, 2_000, 3_000]));
        let shared = Mutex::new(client());
        shared.lock().await.observe_status(&source.status);

        let outcome = poll_once(&shared, &source).await;
        assert_eq!(outcome, TickOutcome::Applied { points: 3, cursor: 3_000 });

        let outcome = poll_once(&shared, &source).await;
        assert_eq!(outcome, TickOutcome::NoNewData);

        assert_eq!(*source.requests.lock().unwrap(), vec![None, Some(3_000)]);
        let client = shared.lock().await;
        assert_eq!(motor_len(&*client), 3);
        assert_eq!(client.cursor(), Some(3_000));
    }

    #[tokio::test]
    async fn test_failure_keeps_cursor_and_retries_same_request() {
        let source = FakeSource::new("a.json", log(&[1_000, 2_000]));
        let shared = Mutex::new(client());
        shared.lock().await.observe_status(&source.status);

        source.fail_next();
        assert_eq!(poll_once(&shared, &source).await, TickOutcome::Failed);
        assert_eq!(shared.lock().await.cursor(), None);

        assert!(matches!(poll_once(&shared, &source).await, TickOutcome::Applied { .. }));
        assert_eq!(*source.requests.lock().unwrap(), vec![None, None]);
    }

    #[test]
    fn test_redelivered_answer_is_a_no_op() {
        let mut client = client();
        client.observe_status(&recording_status("a.json"));

        let first = client.begin_tick().unwrap();
        let overlapping = client.begin_tick().unwrap();
        assert_eq!(first, overlapping);

        client.complete_tick(&first, Ok(batch("a.json", &[1_000, 2_000])));
        let outcome = client.complete_tick(&overlapping, Ok(batch("a.json", &[1_000, 2_000, 3_000])));

        assert_eq!(outcome, TickOutcome::Applied { points: 1, cursor: 3_000 });
        assert_eq!(motor_len(&client), 3);

        let again = client.begin_tick().unwrap();
        assert_eq!(client.complete_tick(&again, Ok(batch("a.json", &[1_000, 2_000, 3_000]))), TickOutcome::NoNewData);
        assert_eq!(client.complete_tick(&again, Ok(DataBatch::default())), TickOutcome::NoNewData);
        assert_eq!(motor_len(&client), 3);
    }

    #[test]
    fn test_cursor_takes_highest_timestamp_of_batch() {
        let mut client = client();
        client.observe_status(&recording_status("a.json"));

        let ticket = client.begin_tick().unwrap();
        assert_eq!(
            client.complete_tick(&ticket, Ok(batch("a.json", &[3_000, 1_000]))),
            TickOutcome::Applied { points: 2, cursor: 3_000 }
        );

        let ticket = client.begin_tick().unwrap();
        assert_eq!(ticket.since, Some(3_000));
        assert_eq!(
            client.complete_tick(&ticket, Ok(batch("a.json", &[3_000, 1_000]))),
            TickOutcome::NoNewData
        );
        assert_eq!(motor_len(&client), 2);
    }

    #[tokio::test]
    async fn test_out_of_order_ingest_is_applied_once() {
        let dir = tempfile::tempdir().unwrap();
        let repository = std::sync::Arc::new(
            crate::infrastructure::json_file_repository::JsonFileRepository::new(dir.path()),
        );
        let service = crate::application::recording_service::RecordingService::new(
            repository,
            "session1".to_string(),
        );
        let file_name = service.start(chrono::Utc::now()).await;
        service
            .ingest(serde_json::json!({"data": [
                {"timestamp": 1690000003000i64, "sensors": {"MOTOR1_I": {"value": 3.0}}},
                {"timestamp": 1690000001000i64, "sensors": {"MOTOR1_I": {"value": 1.0}}}
            ]}))
            .await
            .unwrap();

        let mut client = client();
        client.observe_status(&recording_status(&file_name));
        for _ in 0..2 {
            let ticket = client.begin_tick().unwrap();
            let answer = service.data_since(ticket.since).await.map_err(anyhow::Error::from);
            client.complete_tick(&ticket, answer);
        }

        assert_eq!(client.cursor(), Some(1_690_000_003_000));
        let times: Vec<i64> = client
            .registry()
            .series(&SeriesKey::motor("I", "MOTOR1"))
            .unwrap()
            .samples()
            .map(|p| p.time_ms)
            .collect();
        assert_eq!(times, vec![1_690_000_001_000, 1_690_000_003_000]);
    }

    #[test]
    fn test_answer_from_previous_session_is_discarded() {
        let mut client = client();
        client.observe_status(&recording_status("a.json"));
        let ticket = client.begin_tick().unwrap();

        client.observe_status(&recording_status("b.json"));
        assert_eq!(client.complete_tick(&ticket, Ok(batch("a.json", &[1_000]))), TickOutcome::Stale);
        assert!(client.registry().is_empty());
        assert_eq!(client.cursor(), None);

        let ticket = client.begin_tick().unwrap();
        assert_eq!(ticket.since, None);
        assert_eq!(client.complete_tick(&ticket, Ok(batch("a.json", &[1_000]))), TickOutcome::Stale);
        assert!(matches!(
            client.complete_tick(&ticket, Ok(batch("b.json", &[5_000]))),
            TickOutcome::Applied { points: 1, cursor: 5_000 }
        ));
    }

    #[test]
    fn test_session_switch_flushes_state() {
        let mut client = client();
        client.observe_status(&recording_status("a.json"));
        let ticket = client.begin_tick().unwrap();
        client.complete_tick(&ticket, Ok(batch("a.json", &[1_000, 2_000])));
        assert!(!client.registry().is_empty());
        let clears = client.surface().clears;

        let mut replay = recording_status("a.json");
        replay.is_recording = false;
        replay.current_file_name = None;
        replay.selected_file_name = Some("old.json".to_string());
        client.observe_status(&replay);

        assert_eq!(client.session(), Some("old.json"));
        assert!(!client.is_recording());
        assert_eq!(client.cursor(), None);
        assert!(client.registry().is_empty());
        assert_eq!(client.surface().clears, clears + 1);
    }

    #[test]
    fn test_unchanged_status_keeps_state() {
        let mut client = client();
        client.observe_status(&recording_status("a.json"));
        let ticket = client.begin_tick().unwrap();
        client.complete_tick(&ticket, Ok(batch("a.json", &[1_000])));
        let generation = client.generation();

        client.observe_status(&recording_status("a.json"));
        assert_eq!(client.generation(), generation);
        assert_eq!(client.cursor(), Some(1_000));
    }

    #[test]
    fn test_window_follows_cursor_not_wall_clock() {
        let mut client = client();
        client.observe_status(&recording_status("a.json"));
        let ticket = client.begin_tick().unwrap();
        client.complete_tick(&ticket, Ok(batch("a.json", &[50_000, 60_000])));

        let range = TimeRange::new(40_000, 60_000);
        assert!(client.surface().ranges.values().all(|r| *r == range));

        let ticket = client.begin_tick().unwrap();
        client.complete_tick(&ticket, Ok(batch("a.json", &[])));
        assert!(client.surface().ranges.values().all(|r| *r == range));

        assert_eq!(client.set_window(TimeWindow::All), Some(TimeRange::new(50_000, 60_000)));
    }

    #[test]
    fn test_manual_zoom_is_not_overridden_by_new_data() {
        let mut client = client();
        client.observe_status(&recording_status("a.json"));
        let ticket = client.begin_tick().unwrap();
        client.complete_tick(&ticket, Ok(batch("a.json", &[50_000])));

        client.mark_user_interaction();
        let ticket = client.begin_tick().unwrap();
        client.complete_tick(&ticket, Ok(batch("a.json", &[90_000])));
        assert!(client.surface().ranges.values().all(|r| *r == TimeRange::new(30_000, 50_000)));

        assert_eq!(client.reset_view(), Some(TimeRange::new(70_000, 90_000)));
    }

    #[test]
    fn test_clear_resets_and_keeps_following() {
        let mut client = client();
        client.observe_status(&recording_status("a.json"));
        let ticket = client.begin_tick().unwrap();
        client.complete_tick(&ticket, Ok(batch("a.json", &[1_000])));

        client.clear();
        assert!(client.registry().is_empty());
        assert_eq!(client.session(), Some("a.json"));
        assert_eq!(client.begin_tick().unwrap().since, None);
    }
}
