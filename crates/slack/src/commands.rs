use tracing::info;

use tonecheck_core::domain::correlation::CorrelationEntry;
use tonecheck_core::domain::{check_length, SHORT_FIELD_MAX_CHARS};
use tonecheck_core::errors::{ApplicationError, ExternalService, RejectionKind};

use crate::blocks::{
    message_attachments, reply_message_modal, NO_MESSAGE_FOUND, READ_MESSAGE_TITLE,
    SENTIMENT_ANALYSIS_TEXT, USER_DATA_NOT_FOUND,
};
use crate::payloads::{required, SlashCommandForm, VerifiedRequest};
use crate::router::{store_error, WebhookReply, WebhookRouter};

pub const ADD_MESSAGE_COMMAND: &str = "/tt-add-message";
pub const READ_MESSAGE_COMMAND: &str = "/tt-read-message";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlashCommand {
    AddMessage,
    ReadMessage,
}

impl SlashCommand {
    pub fn parse(command: &str) -> Option<Self> {
        match command.trim() {
            ADD_MESSAGE_COMMAND => Some(Self::AddMessage),
            READ_MESSAGE_COMMAND => Some(Self::ReadMessage),
            _ => None,
        }
    }
}

impl WebhookRouter {
    pub(crate) async fn handle_command(
        &self,
        request: &VerifiedRequest,
    ) -> Result<WebhookReply, ApplicationError> {
        let form = SlashCommandForm::parse(request.envelope().raw_body())?;
        let declared = form.command.clone().unwrap_or_default();

        match SlashCommand::parse(&declared) {
            Some(SlashCommand::AddMessage) => self.add_message(request, &form).await,
            Some(SlashCommand::ReadMessage) => self.read_message(request, &form).await,
            None => Err(ApplicationError::Unsupported {
                kind: RejectionKind::Command,
                value: declared,
            }),
        }
    }

    /// Remembers where the command came from, then opens the modal that collects the message.
    async fn add_message(
        &self,
        request: &VerifiedRequest,
        form: &SlashCommandForm,
    ) -> Result<WebhookReply, ApplicationError> {
        let user_id = required("user_id", &form.user_id)?;
        check_length("user_id", user_id, 1, SHORT_FIELD_MAX_CHARS)?;
        let entry = CorrelationEntry {
            team_id: required("team_id", &form.team_id)?.to_owned(),
            team_domain: required("team_domain", &form.team_domain)?.to_owned(),
            channel_id: required("channel_id", &form.channel_id)?.to_owned(),
            channel_name: required("channel_name", &form.channel_name)?.to_owned(),
        };
        entry.validate()?;
        let trigger_id = required("trigger_id", &form.trigger_id)?;
        let channel_id = entry.channel_id.clone();

        self.correlations
            .put(user_id, entry, self.settings.correlation_ttl)
            .await
            .map_err(store_error)?;

        self.notifier.open_modal(trigger_id, &reply_message_modal()).await.map_err(|error| {
            ApplicationError::External {
                service: ExternalService::SlackApi,
                message: error.to_string(),
            }
        })?;

        info!(
            event_name = "slack.router.modal_opened",
            correlation_id = %request.correlation_id(),
            user_id,
            channel_id = %channel_id,
            "reply message modal opened"
        );
        Ok(WebhookReply::acknowledged())
    }

    async fn read_message(
        &self,
        request: &VerifiedRequest,
        form: &SlashCommandForm,
    ) -> Result<WebhookReply, ApplicationError> {
        let channel_id = required("channel_id", &form.channel_id)?;

        if required("user_id", &form.user_id).is_err() {
            self.notify(request, channel_id, USER_DATA_NOT_FOUND, &[]).await;
            return Ok(WebhookReply::acknowledged());
        }

        let message = self.channels.read(channel_id).await.map_err(store_error)?;
        let attachments = message_attachments(
            READ_MESSAGE_TITLE,
            message.as_deref().unwrap_or(NO_MESSAGE_FOUND),
        );
        self.notify(request, channel_id, SENTIMENT_ANALYSIS_TEXT, &attachments).await;
        Ok(WebhookReply::acknowledged())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tonecheck_core::domain::channel::ChannelRegistration;
    use tonecheck_core::errors::{ApplicationError, DomainError, ExternalService, RejectionKind};
    use tonecheck_db::{ChannelConfigRepository, CorrelationRepository};

    use super::SlashCommand;
    use crate::notifier::{RecordingNotifier, SentNotification};
    use crate::payloads::Endpoint;
    use crate::router::WebhookReply;
    use crate::test_support::{add_command_form, form, signed_request, Harness};

    #[test]
    fn only_two_commands_are_known() {
        assert_eq!(SlashCommand::parse("/tt-add-message"), Some(SlashCommand::AddMessage));
        assert_eq!(SlashCommand::parse(" /tt-read-message "), Some(SlashCommand::ReadMessage));
        assert_eq!(SlashCommand::parse("/bogus"), None);
    }

    #[tokio::test]
    async fn add_stores_context_and_opens_modal() {
        let harness = Harness::new();

        let reply = harness
            .router
            .route(&signed_request(Endpoint::Commands, &add_command_form("U1", "C1")))
            .await
            .expect("route");

        assert_eq!(reply, WebhookReply::acknowledged());
        let entry = harness.correlations.get("U1").await.expect("get").expect("entry stored");
        assert_eq!(entry.channel_id, "C1");
        assert_eq!(entry.team_id, "T0001");
        assert_eq!(
            harness.correlations.ttl("U1").await.expect("ttl"),
            Some(Duration::from_secs(1800))
        );
        assert!(matches!(
            harness.notifier.sent().await.as_slice(),
            [SentNotification::Modal { trigger_id, callback_id }]
                if trigger_id.starts_with("13345224609") && callback_id == "modal-identifier"
        ));
    }

    #[tokio::test]
    async fn add_without_channel_is_rejected_before_any_write() {
        let harness = Harness::new();
        let body = form(&[
            ("command", "/tt-add-message"),
            ("user_id", "U1"),
            ("team_id", "T0001"),
            ("team_domain", "acme"),
            ("channel_name", "general"),
            ("trigger_id", "123.456"),
        ]);

        let result = harness.router.route(&signed_request(Endpoint::Commands, &body)).await;

        assert_eq!(
            result,
            Err(ApplicationError::Domain(DomainError::MissingField { field: "channel_id" }))
        );
        assert_eq!(harness.correlations.stored_keys().await, 0);
        assert!(harness.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn modal_open_failure_is_slack_api_error() {
        let harness = Harness::with_notifier(RecordingNotifier::failing("expired_trigger_id"));

        let result = harness
            .router
            .route(&signed_request(Endpoint::Commands, &add_command_form("U1", "C1")))
            .await;

        assert!(matches!(
            result,
            Err(ApplicationError::External { service: ExternalService::SlackApi, ref message })
                if message.contains("expired_trigger_id")
        ));
    }

    #[tokio::test]
    async fn read_posts_configured_message() {
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
        let body = form(&[("command", "/tt-read-message"), ("user_id", "U1"), ("channel_id", "C1")]);

        let reply =
            harness.router.route(&signed_request(Endpoint::Commands, &body)).await.expect("route");

        assert_eq!(reply, WebhookReply::acknowledged());
        let messages = harness.notifier.messages().await;
        assert_eq!(messages[0].0, "C1");
        assert_eq!(messages[0].2[0].fields[0].title, "Read Message");
        assert_eq!(messages[0].2[0].fields[0].value, "Be nice");
    }

    #[tokio::test]
    async fn read_without_configuration_says_so() {
        let harness = Harness::new();
        let body = form(&[("command", "/tt-read-message"), ("user_id", "U1"), ("channel_id", "C9")]);

        harness.router.route(&signed_request(Endpoint::Commands, &body)).await.expect("route");

        assert_eq!(harness.notifier.messages().await[0].2[0].fields[0].value, "No message found.");
    }

    #[tokio::test]
    async fn read_without_user_posts_user_data_not_found() {
        let harness = Harness::new();
        let body = form(&[("command", "/tt-read-message"), ("channel_id", "C1")]);

        harness.router.route(&signed_request(Endpoint::Commands, &body)).await.expect("route");

        let messages = harness.notifier.messages().await;
        assert_eq!(messages[0].1, "User data not found. Please try again.");
        assert!(messages[0].2.is_empty());
    }

    #[tokio::test]
    async fn unknown_command_is_rejected() {
        let harness = Harness::new();
        let body = form(&[("command", "/bogus"), ("user_id", "U1"), ("channel_id", "C1")]);

        let result = harness.router.route(&signed_request(Endpoint::Commands, &body)).await;

        assert_eq!(
            result,
            Err(ApplicationError::Unsupported {
                kind: RejectionKind::Command,
                value: "/bogus".to_owned()
            })
        );
    }
}
