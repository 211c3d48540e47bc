//! Outbound Slack Web API calls.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use tonecheck_core::config::SlackConfig;

use crate::blocks::{Attachment, ModalView};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NotifierError {
    #[error("slack client setup failed: {0}")]
    Setup(String),
    #[error("slack request failed: {0}")]
    Transport(String),
    #[error("slack answered with status {0}")]
    Status(u16),
    #[error("slack rejected the call: {0}")]
    Api(String),
    #[error("slack response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<(), NotifierError>;

    async fn open_modal(&self, trigger_id: &str, view: &ModalView) -> Result<(), NotifierError>;
}

#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct SlackNotifier {
    client: Client,
    api_base_url: String,
    bot_token: SecretString,
}

impl std::fmt::Debug for SlackNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackNotifier")
            .field("api_base_url", &self.api_base_url)
            .field("bot_token", &"[redacted]")
            .finish()
    }
}

impl SlackNotifier {
    pub fn new(
        api_base_url: impl Into<String>,
        bot_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| NotifierError::Setup(error.to_string()))?;
        let api_base_url = api_base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { client, api_base_url, bot_token })
    }

    pub fn from_config(config: &SlackConfig) -> Result<Self, NotifierError> {
        Self::new(
            config.api_base_url.clone(),
            config.bot_token.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn call(&self, method: &str, body: Value) -> Result<(), NotifierError> {
        let url = format!("{}/{method}", self.api_base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.bot_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| NotifierError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::Status(status.as_u16()));
        }

        let payload: SlackApiResponse =
            response.json().await.map_err(|error| NotifierError::Decode(error.to_string()))?;
        debug!(event_name = "slack.api.call", method, ok = payload.ok, "slack api call finished");
        interpret(payload)
    }
}

fn interpret(payload: SlackApiResponse) -> Result<(), NotifierError> {
    if payload.ok {
        Ok(())
    } else {
        Err(NotifierError::Api(payload.error.unwrap_or_else(|| "unknown_error".to_owned())))
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<(), NotifierError> {
        let mut body = json!({ "channel": channel, "text": text, "mrkdwn": true });
        if !attachments.is_empty() {
            body["attachments"] = serde_json::to_value(attachments)
                .map_err(|error| NotifierError::Decode(error.to_string()))?;
        }
        self.call("chat.postMessage", body).await
    }

    async fn open_modal(&self, trigger_id: &str, view: &ModalView) -> Result<(), NotifierError> {
        let view = serde_json::to_value(view).map_err(|error| NotifierError::Decode(error.to_string()))?;
        self.call("views.open", json!({ "trigger_id": trigger_id, "view": view })).await
    }
}

/// One outbound call captured by [`RecordingNotifier`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "method")]
pub enum SentNotification {
    #[serde(rename = "chat.postMessage")]
    Message { channel: String, text: String, attachments: Vec<Attachment> },
    #[serde(rename = "views.open")]
    Modal { trigger_id: String, callback_id: String },
}

/// Keeps every call in memory. Used by tests and local dry runs.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentNotification>>,
    failure: Option<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every call and then fails it with `error`.
    pub fn failing(error: impl Into<String>) -> Self {
        Self { sent: Mutex::new(Vec::new()), failure: Some(error.into()) }
    }

    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().await.clone()
    }

    pub async fn messages(&self) -> Vec<(String, String, Vec<Attachment>)> {
        self.sent
            .lock()
            .await
            .iter()
            .filter_map(|sent| match sent {
                SentNotification::Message { channel, text, attachments } => {
                    Some((channel.clone(), text.clone(), attachments.clone()))
                }
                SentNotification::Modal { .. } => None,
            })
            .collect()
    }

    fn outcome(&self) -> Result<(), NotifierError> {
        match &self.failure {
            Some(error) => Err(NotifierError::Api(error.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<(), NotifierError> {
        self.sent.lock().await.push(SentNotification::Message {
            channel: channel.to_owned(),
            text: text.to_owned(),
            attachments: attachments.to_vec(),
        });
        self.outcome()
    }

    async fn open_modal(&self, trigger_id: &str, view: &ModalView) -> Result<(), NotifierError> {
        self.sent.lock().await.push(SentNotification::Modal {
            trigger_id: trigger_id.to_owned(),
            callback_id: view.callback_id.clone(),
        });
        self.outcome()
    }
}
