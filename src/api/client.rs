use std::time::Duration;

use futures::Stream;
use futures::TryStreamExt;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::models::DownloaderConfig;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Server returned {0}")]
    Status(StatusCode),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Result of a single existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Hit,
    /// Non-200 status or transport failure, with a short reason for the log
    Miss(String),
}

/// HTTP access to the paper archive. Cloning shares the connection pool.
#[derive(Clone)]
pub struct ArchiveClient {
    http: Client,
    base_url: String,
    probe_timeout: Duration,
}

impl ArchiveClient {
    pub fn new(config: &DownloaderConfig) -> Result<Self> {
        let http = Client::builder().user_agent(&config.user_agent).build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            probe_timeout: config.probe_timeout,
        })
    }

    /// Absolute URL for a rendered catalog template.
    pub fn url_for(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url, relative)
    }

    /// HEAD request bounded by the probe timeout. Only a 200 counts as a hit.
    pub async fn probe(&self, url: &str) -> ProbeOutcome {
        match self
            .http
            .head(url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) if response.status() == StatusCode::OK => ProbeOutcome::Hit,
            Ok(response) => ProbeOutcome::Miss(format!("status {}", response.status())),
            Err(e) => ProbeOutcome::Miss(e.to_string()),
        }
    }

    /// Start a GET and hand back the body as a chunk stream.
    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        download_url: &str,
    ) -> Result<(Option<u64>, impl Stream<Item = Result<bytes::Bytes>>)> {
        let response = self.http.get(download_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(ApiError::RequestError);

        Ok((total_size, stream))
    }
}
