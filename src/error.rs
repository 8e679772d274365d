// Error types shared by the store, the recording service and the HTTP layer
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A data point in an ingestion batch carries no usable timestamp.
    #[error("{reason}")]
    Validation { index: usize, reason: String },

    /// The request body or a name in it has the wrong shape.
    #[error("{0}")]
    InvalidPayload(String),

    #[error("Invalid \"since\" parameter. Must be a numeric timestamp. Got: {0}")]
    InvalidSince(String),

    #[error("Cannot change session name while recording is in progress.")]
    RecordingActive,

    #[error("{0} not found.")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TelemetryError {
    pub fn missing_timestamp(index: usize) -> Self {
        Self::Validation {
            index,
            reason: format!("Data point at index {} is missing 'timestamp'.", index),
        }
    }

    pub fn invalid_timestamp(index: usize) -> Self {
        Self::Validation {
            index,
            reason: format!(
                "Invalid timestamp format in data point at index {}. Must be a numeric value.",
                index
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
