use tracing::info;

use tonecheck_core::domain::channel::ChannelRegistration;
use tonecheck_core::errors::{ApplicationError, DomainError, RejectionKind};

use crate::blocks::{
    message_attachments, INVALID_FORM_FIELDS, MESSAGE_ACTION_ID, MESSAGE_BLOCK_ID,
    MODAL_CALLBACK_ID, SENTIMENT_ANALYSIS_TEXT, USER_DATA_NOT_FOUND,
};
use crate::payloads::{InteractionPayload, VerifiedRequest};
use crate::router::{store_error, WebhookReply, WebhookRouter};

impl WebhookRouter {
    /// Completes the add flow started by `/tt-add-message`.
    pub(crate) async fn handle_interaction(
        &self,
        request: &VerifiedRequest,
    ) -> Result<WebhookReply, ApplicationError> {
        let payload = InteractionPayload::parse(request.envelope().raw_body())?;
        let user_id = payload.user.id.trim();
        if user_id.is_empty() {
            return Err(DomainError::MissingField { field: "user.id" }.into());
        }

        if payload.view.callback_id != MODAL_CALLBACK_ID {
            self.notify(request, user_id, INVALID_FORM_FIELDS, &[]).await;
            return Err(ApplicationError::Unsupported {
                kind: RejectionKind::Interaction,
                value: payload.view.callback_id.clone(),
            });
        }

        let reply_message = payload
            .input_value(MESSAGE_BLOCK_ID, MESSAGE_ACTION_ID)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .ok_or(DomainError::MissingField { field: "reply_message" })?
            .to_owned();

        let Some(entry) = self.correlations.get(user_id).await.map_err(store_error)? else {
            self.notify(request, user_id, USER_DATA_NOT_FOUND, &[]).await;
            return Err(ApplicationError::NotFound(format!(
                "no pending interaction for user {user_id}"
            )));
        };

        let registration = ChannelRegistration {
            channel_id: entry.channel_id,
            team_id: entry.team_id,
            team_domain: entry.team_domain,
            channel_name: entry.channel_name,
            reply_message,
        };
        registration.validate()?;
        let channel_id = registration.channel_id.clone();
        let reply_message = registration.reply_message.clone();

        let outcome = self.channels.upsert(registration).await.map_err(store_error)?;
        self.correlations.delete(user_id).await.map_err(store_error)?;

        info!(
            event_name = "slack.router.channel_configured",
            correlation_id = %request.correlation_id(),
            channel_id = %channel_id,
            outcome = ?outcome,
            "channel reply message saved"
        );
        let attachments = message_attachments(outcome.title(), &reply_message);
        self.notify(request, &channel_id, SENTIMENT_ANALYSIS_TEXT, &attachments).await;

        Ok(WebhookReply::clear())
    }
}
