// Recording session domain model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SESSION_FILE_EXTENSION: &str = "json";

/// Derive the log file name for a recording started at `started_at`.
///
/// `session1` started at 2024-03-05T07:08:09Z becomes `session1_2024_03_05T07_08_09.json`.
pub fn session_file_name(session_name: &str, started_at: DateTime<Utc>) -> String {
    format!(
        "{}_{}.{}",
        session_name,
        started_at.format("%Y_%m_%dT%H_%M_%S"),
        SESSION_FILE_EXTENSION
    )
}

/// True when `name` is a single path component with no directory parts.
pub fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

pub fn is_session_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext == SESSION_FILE_EXTENSION)
}

/// Server-side recording state.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingState {
    pub session_name: String,
    /// Log being written; present exactly while recording.
    pub current_file: Option<String>,
    /// Log chosen for replay while not recording.
    pub selected_file: Option<String>,
}

impl RecordingState {
    pub fn new(session_name: String) -> Self {
        Self {
            session_name,
            current_file: None,
            selected_file: None,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.current_file.is_some()
    }

    /// Session a point-set query reads from.
    pub fn active_file(&self) -> Option<&str> {
        self.current_file
            .as_deref()
            .or(self.selected_file.as_deref())
    }

    pub fn status(&self) -> SessionStatus {
        let is_recording = self.is_recording();
        SessionStatus {
            is_recording,
            session_name: self.session_name.clone(),
            current_file_name: self.current_file.clone(),
            selected_file_name: self.selected_file.clone(),
            message: format!(
                "Server is {}.",
                if is_recording { "recording" } else { "not recording" }
            ),
        }
    }
}

/// Wire form of `GET /status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub is_recording: bool,
    pub session_name: String,
    pub current_file_name: Option<String>,
    pub selected_file_name: Option<String>,
    pub message: String,
}

impl SessionStatus {
    pub fn active_file(&self) -> Option<&str> {
        if self.is_recording {
            self.current_file_name.as_deref()
        } else {
            self.selected_file_name.as_deref()
        }
    }
}
