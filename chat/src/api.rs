use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Thin HTTP client over the assistant's documented contract. No retry,
/// no backoff, no request timeout.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryReply {
    pub response: String,
    #[serde(default)]
    pub sources: Vec<SourceReply>,
    #[serde(default)]
    pub confidence: f32,
}

#[derive(Debug, Deserialize)]
pub struct SourceReply {
    pub source: String,
    pub score: f32,
}

#[derive(Debug, Deserialize)]
pub struct UploadReply {
    pub message: String,
    pub document_id: String,
    pub chunks_created: usize,
}

#[derive(Debug, Deserialize)]
pub struct HealthReply {
    pub status: String,
    pub watsonx_connected: bool,
    pub documents_loaded: usize,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn query(&self, query: &str) -> Result<QueryReply> {
        let response = self
            .http
            .post(format!("{}/api/query", self.base_url))
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    pub async fn upload(&self, path: &Path) -> Result<UploadReply> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .context("Upload path has no filename")?;
        let bytes = tokio::fs::read(path).await?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    pub async fn health(&self) -> Result<HealthReply> {
        let response = self
            .http
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
