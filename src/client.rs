use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::{Config, DEFAULT_TIMEOUT_MS};
use crate::error::StudyError;
use crate::study::{Mode, StudyData};

const FETCH_FAILED: &str = "Failed to fetch study data";

/// Source of study material for a topic
#[async_trait]
pub trait StudyFetcher: Send + Sync {
    async fn fetch(&self, topic: &str, mode: Mode) -> Result<StudyData, StudyError>;
}

/// Response envelope used by the study service
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the study service (`GET {base}/study?topic=..&mode=..`)
#[derive(Debug, Clone)]
pub struct HttpStudyClient {
    http: Client,
    endpoint: String,
}

impl HttpStudyClient {
    pub fn new(base_url: &str) -> Result<Self, StudyError> {
        Self::with_timeout(base_url, Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    pub fn from_config(cfg: &Config) -> Result<Self, StudyError> {
        Self::with_timeout(&cfg.api_base_url, cfg.request_timeout())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, StudyError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StudyError::Unknown(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}/study", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn classify(e: reqwest::Error) -> StudyError {
    if e.is_timeout() {
        StudyError::Timeout
    } else if e.is_connect() {
        StudyError::Connection
    } else {
        StudyError::Unknown(e.to_string())
    }
}

#[async_trait]
impl StudyFetcher for HttpStudyClient {
    async fn fetch(&self, topic: &str, mode: Mode) -> Result<StudyData, StudyError> {
        tracing::debug!(endpoint = %self.endpoint, topic, %mode, "requesting study data");

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("topic", topic), ("mode", mode.as_str())])
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope>(&body)
                .ok()
                .and_then(|env| env.error)
                .filter(|m| !m.trim().is_empty());
            tracing::warn!(%status, "study service returned an error status");
            return Err(StudyError::Application(message));
        }

        let envelope: Envelope = serde_json::from_str(&body)
            .map_err(|e| StudyError::Unknown(format!("invalid response body: {e}")))?;

        if !envelope.success {
            let message = envelope
                .error
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| FETCH_FAILED.to_string());
            return Err(StudyError::Application(Some(message)));
        }

        let payload = envelope
            .data
            .ok_or_else(|| StudyError::Unknown("response has no data".to_string()))?;

        StudyData::from_payload(mode, payload)
            .map_err(|e| StudyError::Unknown(format!("unexpected payload shape: {e}")))
    }
}
