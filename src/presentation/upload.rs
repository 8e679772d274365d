// Camera upload channel - WebSocket that streams binary chunks into a named file
use crate::error::{Result, TelemetryError};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

pub async fn upload(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let dir = state.upload_dir.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, dir))
}

async fn handle_socket(mut socket: WebSocket, dir: PathBuf) {
    let mut sink = UploadSink::new(dir);

    while let Some(message) = socket.next().await {
        let result = match message {
            Ok(Message::Text(name)) => sink.open(&name).await,
            Ok(Message::Binary(chunk)) => sink.write_chunk(&chunk).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!("Upload socket error: {}", e);
                break;
            }
        };

        if let Err(e) = result {
            tracing::warn!("Closing upload channel: {}", e);
            break;
        }
    }

    if let Err(e) = sink.finish().await {
        tracing::error!("Failed to flush upload: {}", e);
    }
}

/// Destination for one upload channel. A text frame names the file, binary frames append to it.
pub struct UploadSink {
    dir: PathBuf,
    current: Option<(String, File)>,
    bytes_written: u64,
}

impl UploadSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: None,
            bytes_written: 0,
        }
    }

    /// Starts a new destination file, flushing the previous one.
    pub async fn open(&mut self, raw_name: &str) -> Result<()> {
        let name = Path::new(raw_name.trim())
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.starts_with('.'))
            .ok_or_else(|| {
                TelemetryError::InvalidPayload(format!("Invalid upload file name: {}", raw_name))
            })?
            .to_string();

        self.finish().await?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let file = File::create(self.dir.join(&name)).await?;

        tracing::info!("Receiving upload {}", name);
        self.current = Some((name, file));
        Ok(())
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let (_, file) = self.current.as_mut().ok_or_else(|| {
            TelemetryError::InvalidPayload("Binary data received before a file name".to_string())
        })?;
        file.write_all(chunk).await?;
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    pub async fn finish(&mut self) -> Result<()> {
        if let Some((name, mut file)) = self.current.take() {
            file.flush().await?;
            tracing::info!("Upload {} complete ({} bytes)", name, self.bytes_written);
        }
        self.bytes_written = 0;
        Ok(())
    }
}
