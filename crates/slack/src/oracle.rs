//! Client for the external sentiment scoring service.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use thiserror::Error;

use tonecheck_core::config::SentimentConfig;
use tonecheck_core::sentiment::SentimentScores;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("oracle client setup failed: {0}")]
    Setup(String),
    #[error("oracle request failed: {0}")]
    Transport(String),
    #[error("oracle answered with status {0}")]
    Status(u16),
    #[error("oracle response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait SentimentOracle: Send + Sync {
    async fn score(&self, text: &str) -> Result<SentimentScores, OracleError>;
}

/// POSTs `{"text": ...}` and expects `{"transformer_score": .., "vader_compound": ..}`.
#[derive(Clone, Debug)]
pub struct HttpSentimentOracle {
    client: Client,
    url: String,
}

impl HttpSentimentOracle {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| OracleError::Setup(error.to_string()))?;
        Ok(Self { client, url: url.into() })
    }

    pub fn from_config(config: &SentimentConfig) -> Result<Self, OracleError> {
        Self::new(config.oracle_url.clone(), Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl SentimentOracle for HttpSentimentOracle {
    async fn score(&self, text: &str) -> Result<SentimentScores, OracleError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|error| OracleError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        response.json().await.map_err(|error| OracleError::Decode(error.to_string()))
    }
}

/// Fixed scores with optional per-text overrides.
#[derive(Clone, Debug, Default)]
pub struct StaticSentimentOracle {
    default: SentimentScores,
    overrides: HashMap<String, SentimentScores>,
}

impl StaticSentimentOracle {
    pub fn new(default: SentimentScores) -> Self {
        Self { default, overrides: HashMap::new() }
    }

    pub fn with_text(mut self, text: impl Into<String>, scores: SentimentScores) -> Self {
        self.overrides.insert(text.into(), scores);
        self
    }
}

#[async_trait]
impl SentimentOracle for StaticSentimentOracle {
    async fn score(&self, text: &str) -> Result<SentimentScores, OracleError> {
        Ok(self.overrides.get(text).copied().unwrap_or(self.default))
    }
}
