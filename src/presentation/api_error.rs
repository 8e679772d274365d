// JSON error responses for the HTTP API
use crate::error::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

impl TelemetryError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TelemetryError::Validation { .. }
            | TelemetryError::InvalidPayload(_)
            | TelemetryError::InvalidSince(_)
            | TelemetryError::RecordingActive => StatusCode::BAD_REQUEST,
            TelemetryError::NotFound(_) => StatusCode::NOT_FOUND,
            TelemetryError::Io(_) | TelemetryError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for TelemetryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = match &self {
            TelemetryError::Validation { index, reason } => json!({ "message": reason, "index": index }),
            other => json!({ "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
