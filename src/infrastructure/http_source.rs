// HTTP client for the telemetry server, used by the viewer
use crate::application::sync_client::TelemetrySource;
use crate::domain::session::SessionStatus;
use crate::domain::telemetry::DataBatch;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct HttpTelemetrySource {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct FileListResponse {
    files: Vec<String>,
}

impl HttpTelemetrySource {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Server answered {}: {}", status, body);
        }

        response
            .json::<T>()
            .await
            .context("Failed to parse server response")
    }

    pub async fn list_files(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.url("/list-files"))
            .send()
            .await
            .context("Failed to send list-files request")?;

        Ok(Self::read_json::<FileListResponse>(response).await?.files)
    }

    pub async fn select_file(&self, file_name: &str) -> Result<String> {
        let response = self
            .client
            .post(self.url("/select-file"))
            .json(&serde_json::json!({ "fileName": file_name }))
            .send()
            .await
            .context("Failed to send select-file request")?;

        Ok(Self::read_json::<MessageResponse>(response).await?.message)
    }
}

#[async_trait]
impl TelemetrySource for HttpTelemetrySource {
    async fn fetch_since(&self, since: Option<i64>) -> Result<DataBatch> {
        let mut request = self.client.get(self.url("/data"));
        if let Some(since) = since {
            request = request.query(&[("since", since)]);
        }

        let response = request
            .send()
            .await
            .context("Failed to send data request")?;
        Self::read_json(response).await
    }

    async fn fetch_status(&self) -> Result<SessionStatus> {
        let response = self
            .client
            .get(self.url("/status"))
            .send()
            .await
            .context("Failed to send status request")?;
        Self::read_json(response).await
    }
}
