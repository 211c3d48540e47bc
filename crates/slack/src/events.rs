use tracing::{debug, info};

use tonecheck_core::errors::{ApplicationError, ExternalService, EVENT_NOT_FOUND_MESSAGE};

use crate::blocks::{sentiment_attachments, truncate_quote, SENTIMENT_ANALYSIS_TEXT};
use crate::payloads::{EventCallback, VerifiedRequest};
use crate::router::{store_error, WebhookReply, WebhookRouter};

impl WebhookRouter {
    /// Scores a channel message and answers negative ones with the channel's reply.
    pub(crate) async fn handle_event_callback(
        &self,
        request: &VerifiedRequest,
    ) -> Result<WebhookReply, ApplicationError> {
        let callback: EventCallback = serde_json::from_slice(request.envelope().raw_body())
            .map_err(|_| ApplicationError::MalformedPayload(EVENT_NOT_FOUND_MESSAGE.to_owned()))?;
        let Some(event) = callback.event else {
            return Err(ApplicationError::MalformedPayload(EVENT_NOT_FOUND_MESSAGE.to_owned()));
        };

        if event.is_from_bot() {
            debug!(
                event_name = "slack.router.event_skipped",
                correlation_id = %request.correlation_id(),
                reason = "bot_message",
                "ignoring bot-authored message"
            );
            return Ok(WebhookReply::acknowledged());
        }

        let text = event.text.as_deref().map(str::trim).filter(|text| !text.is_empty());
        let channel = event.channel.as_deref().filter(|channel| !channel.is_empty());
        let (Some(text), Some(channel)) = (text, channel) else {
            debug!(
                event_name = "slack.router.event_skipped",
                correlation_id = %request.correlation_id(),
                reason = "missing_text_or_channel",
                "nothing to score"
            );
            return Ok(WebhookReply::acknowledged());
        };

        let scores = self.oracle.score(text).await.map_err(|error| ApplicationError::External {
            service: ExternalService::SentimentOracle,
            message: error.to_string(),
        })?;
        let classification = scores.classify().map_err(|error| ApplicationError::External {
            service: ExternalService::SentimentOracle,
            message: error.to_string(),
        })?;

        info!(
            event_name = "slack.router.event_scored",
            correlation_id = %request.correlation_id(),
            channel,
            classification = %classification,
            "channel message scored"
        );
        if !classification.is_negative() {
            return Ok(WebhookReply::acknowledged());
        }

        let reply = self
            .channels
            .read(channel)
            .await
            .map_err(store_error)?
            .unwrap_or_else(|| self.settings.default_message.clone());
        let attachments =
            sentiment_attachments(&truncate_quote(text), classification.as_str(), &reply);
        self.notify(request, channel, SENTIMENT_ANALYSIS_TEXT, &attachments).await;

        Ok(WebhookReply::acknowledged())
    }
}

#[cfg(test)]
mod tests {
    use tonecheck_core::domain::channel::ChannelRegistration;
    use tonecheck_core::errors::ApplicationError;
    use tonecheck_db::ChannelConfigRepository;

    use crate::blocks::AttachmentColor;
    use crate::notifier::RecordingNotifier;
    use crate::payloads::Endpoint;
    use crate::router::{WebhookReply, DEFAULT_REPLY_MESSAGE};
    use crate::test_support::{signed_request, Harness, HOSTILE_TEXT};

    fn message_event(text: &str, channel: &str) -> String {
        serde_json::json!({
            "type": "event_callback",
            "event": { "type": "message", "text": text, "channel": channel, "user": "U7" }
        })
        .to_string()
    }

    #[tokio::test]
    async fn negative_message_on_unconfigured_channel_uses_default_reply() {
        let harness = Harness::new();

        let reply = harness
            .router
            .route(&signed_request(Endpoint::Events, &message_event(HOSTILE_TEXT, "C1")))
            .await
            .expect("route");

        assert_eq!(reply, WebhookReply::acknowledged());
        let messages = harness.notifier.messages().await;
        assert_eq!(messages.len(), 1);
        let (channel, text, attachments) = &messages[0];
        assert_eq!(channel, "C1");
        assert_eq!(text, "Sentiment Analysis");
        assert_eq!(attachments[0].color, AttachmentColor::Red);
        assert_eq!(attachments[0].fields[0].value, format!("{} ...", &HOSTILE_TEXT[..30]));
        assert_eq!(attachments[0].fields[1].value, "definitely negative");
        assert_eq!(attachments[0].fields[2].value, DEFAULT_REPLY_MESSAGE);
    }

    #[tokio::test]
    async fn negative_message_uses_configured_reply() {
        let harness = Harness::new();
        harness
            .channels
            .upsert(ChannelRegistration {
                channel_id: "C1".to_owned(),
                team_id: "T0001".to_owned(),
                team_domain: "acme".to_owned(),
                channel_name: "general".to_owned(),
                reply_message: "Be nice".to_owned(),
            })
            .await
            .expect("seed channel");

        harness
            .router
            .route(&signed_request(Endpoint::Events, &message_event(HOSTILE_TEXT, "C1")))
            .await
            .expect("route");

        let messages = harness.notifier.messages().await;
        assert_eq!(messages[0].2[0].fields[2].value, "Be nice");
    }

    #[tokio::test]
    async fn friendly_message_is_not_answered() {
        let harness = Harness::new();

        harness
            .router
            .route(&signed_request(Endpoint::Events, &message_event("thanks team!", "C1")))
            .await
            .expect("route");

        assert!(harness.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn missing_event_is_bad_request() {
        let harness = Harness::new();

        let result = harness
            .router
            .route(&signed_request(Endpoint::Events, r#"{"type":"event_callback"}"#))
            .await;

        assert_eq!(result, Err(ApplicationError::MalformedPayload("Event not found.".to_owned())));
    }

    #[tokio::test]
    async fn bot_messages_and_empty_text_are_acknowledged_silently() {
        let harness = Harness::new();
        let bot = serde_json::json!({
            "type": "event_callback",
            "event": { "type": "message", "text": HOSTILE_TEXT, "channel": "C1", "bot_id": "B1" }
        })
        .to_string();
        let no_text = r#"{"type":"event_callback","event":{"type":"message","channel":"C1"}}"#;

        for body in [bot.as_str(), no_text] {
            let reply =
                harness.router.route(&signed_request(Endpoint::Events, body)).await.expect("route");
            assert_eq!(reply, WebhookReply::acknowledged());
        }
        assert!(harness.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn notification_failure_does_not_change_outcome() {
        let harness = Harness::with_notifier(RecordingNotifier::failing("channel_not_found"));

        let reply = harness
            .router
            .route(&signed_request(Endpoint::Events, &message_event(HOSTILE_TEXT, "C1")))
            .await
            .expect("route");

        assert_eq!(reply, WebhookReply::acknowledged());
        assert_eq!(harness.notifier.messages().await.len(), 1);
    }
}
