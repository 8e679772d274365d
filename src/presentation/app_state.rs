// Application state for HTTP handlers
use crate::application::recording_service::RecordingService;
use std::path::PathBuf;

#[derive(Clone)]
pub struct AppState {
    pub recording_service: RecordingService,
    pub upload_dir: PathBuf,
}
