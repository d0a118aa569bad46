//! imgbb upload API client (`POST https://api.imgbb.com/1/upload`).

use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;

use super::{ImageHost, ImageHostError};

pub const DEFAULT_ENDPOINT: &str = "https://api.imgbb.com/1/upload";

/// Whole-request deadline for an upload, including reading the response.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ImgbbResponse {
    #[serde(default)]
    data: Option<ImgbbData>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    status: u16,
}

#[derive(Debug, Deserialize)]
struct ImgbbData {
    url: String,
}

#[derive(Clone)]
pub struct ImgbbClient {
    http: reqwest::Client,
    endpoint: String,
    key: Option<String>,
    expiration: Option<u32>,
}

impl ImgbbClient {
    /// `key` may be absent; uploads then fail with [`ImageHostError::NotConfigured`].
    pub fn new(key: Option<String>, expiration: Option<u32>) -> Result<Self, ImageHostError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ImageHostError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            key: key.filter(|k| !k.trim().is_empty()),
            expiration,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl fmt::Debug for ImgbbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImgbbClient")
            .field("endpoint", &self.endpoint)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

fn parse_response(body: &str) -> Result<String, ImageHostError> {
    let parsed: ImgbbResponse =
        serde_json::from_str(body).map_err(|e| ImageHostError::InvalidResponse(e.to_string()))?;
    if !parsed.success {
        return Err(ImageHostError::Rejected(parsed.status));
    }
    parsed
        .data
        .map(|d| d.url)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| ImageHostError::InvalidResponse("missing data.url".into()))
}

#[async_trait]
impl ImageHost for ImgbbClient {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ImageHostError> {
        let key = self.key.as_deref().ok_or(ImageHostError::NotConfigured)?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let mut form = reqwest::multipart::Form::new().part("image", part);
        if let Some(expiration) = self.expiration {
            form = form.text("expiration", expiration.to_string());
        }

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", key)])
            .multipart(form)
            .send()
            .await
            .map_err(|e| ImageHostError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ImageHostError::Transport(e.to_string()))?;

        let url = parse_response(&body).inspect_err(|e| {
            tracing::warn!(http_status = %status, error = %e, "imgbb rejected upload");
        })?;
        tracing::debug!(file_name, %url, "image uploaded to imgbb");
        Ok(url)
    }
}
