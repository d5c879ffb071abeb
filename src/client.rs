//! HTTP client for the classification endpoints.

use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::prediction::PredictionPayload;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Anything that kept a JSON payload from arriving: connection failures,
    /// timeouts, non-JSON bodies.
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}

/// A file chosen by the user, read fully into memory.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime = mime_for(&name).to_string();
        Self { name, mime, bytes }
    }

    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();
        Ok(Self::new(name, bytes))
    }
}

pub fn mime_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Backend contract used by the page. The HTTP status is ignored: any JSON
/// body is handed back as a payload and only its `error` field matters.
#[async_trait]
pub trait PredictionApi: Send + Sync {
    async fn upload(&self, file: &SelectedFile) -> Result<PredictionPayload, ClientError>;

    async fn instagram(&self, url: &str) -> Result<PredictionPayload, ClientError>;
}

pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PredictionApi for HttpApi {
    async fn upload(&self, file: &SelectedFile) -> Result<PredictionPayload, ClientError> {
        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        Ok(resp.json::<PredictionPayload>().await?)
    }

    async fn instagram(&self, url: &str) -> Result<PredictionPayload, ClientError> {
        let resp = self
            .client
            .post(format!("{}/instagram", self.base_url))
            .json(&json!({ "url": url }))
            .send()
            .await?;

        Ok(resp.json::<PredictionPayload>().await?)
    }
}
