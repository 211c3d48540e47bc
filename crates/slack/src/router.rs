//! Dispatch of verified webhooks to their handlers.
//!
//! The router owns no per-request state. Everything a multi-step interaction needs between
//! calls lives in the correlation store.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{info, warn};

use tonecheck_core::config::AppConfig;
use tonecheck_core::domain::correlation::DEFAULT_CORRELATION_TTL_SECS;
use tonecheck_core::errors::{ApplicationError, RejectionKind};
use tonecheck_db::{ChannelConfigRepository, CorrelationRepository, RepositoryError};

use crate::blocks::Attachment;
use crate::notifier::Notifier;
use crate::oracle::SentimentOracle;
use crate::payloads::{
    ChallengeResponse, Endpoint, UrlVerificationRequest, VerifiedRequest, WebhookKind,
    VERIFICATION_PATH,
};

pub const DEFAULT_REPLY_MESSAGE: &str = "Please keep the conversation respectful and constructive.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouterSettings {
    /// Reply used for channels that never configured one.
    pub default_message: String,
    pub correlation_ttl: Duration,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            default_message: DEFAULT_REPLY_MESSAGE.to_owned(),
            correlation_ttl: Duration::from_secs(DEFAULT_CORRELATION_TTL_SECS),
        }
    }
}

impl RouterSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            default_message: config.sentiment.default_message.clone(),
            correlation_ttl: Duration::from_secs(config.correlation.ttl_secs),
        }
    }
}

/// Successful outcome of a webhook, before it becomes an HTTP response.
#[derive(Clone, Debug, PartialEq)]
pub enum WebhookReply {
    Redirect { location: &'static str },
    Json { status: u16, body: Value },
}

impl WebhookReply {
    pub fn ok(body: Value) -> Self {
        Self::Json { status: 200, body }
    }

    pub fn acknowledged() -> Self {
        Self::ok(json!({}))
    }

    pub fn clear() -> Self {
        Self::ok(json!({ "response_action": "clear" }))
    }
}

#[derive(Clone)]
pub struct WebhookRouter {
    pub(crate) channels: Arc<dyn ChannelConfigRepository>,
    pub(crate) correlations: Arc<dyn CorrelationRepository>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) oracle: Arc<dyn SentimentOracle>,
    pub(crate) settings: RouterSettings,
}

impl WebhookRouter {
    pub fn new(
        channels: Arc<dyn ChannelConfigRepository>,
        correlations: Arc<dyn CorrelationRepository>,
        notifier: Arc<dyn Notifier>,
        oracle: Arc<dyn SentimentOracle>,
        settings: RouterSettings,
    ) -> Self {
        Self { channels, correlations, notifier, oracle, settings }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    pub fn oracle(&self) -> &Arc<dyn SentimentOracle> {
        &self.oracle
    }

    pub async fn route(&self, request: &VerifiedRequest) -> Result<WebhookReply, ApplicationError> {
        let envelope = request.envelope();
        info!(
            event_name = "slack.router.dispatch",
            correlation_id = %request.correlation_id(),
            endpoint = envelope.endpoint().path(),
            kind = ?envelope.kind(),
            timestamp_delta_secs = request.timestamp_delta_secs(),
            "dispatching verified webhook"
        );

        match (envelope.endpoint(), envelope.kind()) {
            (Endpoint::Verification, _) => answer_challenge(envelope.raw_body()),
            (_, WebhookKind::UrlVerification) => {
                Ok(WebhookReply::Redirect { location: VERIFICATION_PATH })
            }
            (_, WebhookKind::EventCallback) => self.handle_event_callback(request).await,
            (_, WebhookKind::Command) => self.handle_command(request).await,
            (_, WebhookKind::Interaction) => self.handle_interaction(request).await,
            (_, WebhookKind::Unknown(declared)) => {
                warn!(
                    event_name = "slack.router.rejected",
                    correlation_id = %request.correlation_id(),
                    declared_type = %declared,
                    "unsupported event type"
                );
                Err(ApplicationError::Unsupported {
                    kind: RejectionKind::EventType,
                    value: declared.clone(),
                })
            }
        }
    }

    /// Posts a message and logs, rather than returns, any failure.
    pub(crate) async fn notify(
        &self,
        request: &VerifiedRequest,
        channel: &str,
        text: &str,
        attachments: &[Attachment],
    ) {
        if let Err(error) = self.notifier.post_message(channel, text, attachments).await {
            warn!(
                event_name = "slack.router.notify_failed",
                correlation_id = %request.correlation_id(),
                channel,
                error = %error,
                "slack notification failed"
            );
        }
    }
}

fn answer_challenge(raw_body: &[u8]) -> Result<WebhookReply, ApplicationError> {
    let request = UrlVerificationRequest::parse(raw_body)?;
    let body = serde_json::to_value(ChallengeResponse { challenge: request.challenge })
        .map_err(|error| ApplicationError::Infrastructure(error.to_string()))?;
    Ok(WebhookReply::ok(body))
}

/// Validation problems keep their field message; everything else is the store being unavailable.
pub(crate) fn store_error(error: RepositoryError) -> ApplicationError {
    match error {
        RepositoryError::Validation(domain) => ApplicationError::Domain(domain),
        other => ApplicationError::Infrastructure(other.to_string()),
    }
}
