use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{check_length, REPLY_MESSAGE_MAX_CHARS, SHORT_FIELD_MAX_CHARS, TEAM_ID_MAX_CHARS};
use crate::errors::DomainError;

/// Stored reply configuration for one channel. `team_id_encrypted` is never plaintext.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfiguration {
    pub channel_id: String,
    pub team_id_encrypted: String,
    pub team_domain: String,
    pub channel_name: String,
    pub reply_message: String,
    pub registered_at: DateTime<Utc>,
}

/// Input to an upsert, before the team id is encrypted.
#[derive(Clone, PartialEq, Eq)]
pub struct ChannelRegistration {
    pub channel_id: String,
    pub team_id: String,
    pub team_domain: String,
    pub channel_name: String,
    pub reply_message: String,
}

impl std::fmt::Debug for ChannelRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistration")
            .field("channel_id", &self.channel_id)
            .field("team_id", &"[redacted]")
            .field("team_domain", &self.team_domain)
            .field("channel_name", &self.channel_name)
            .field("reply_message", &self.reply_message)
            .finish()
    }
}

impl ChannelRegistration {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_length("channel_id", &self.channel_id, 1, SHORT_FIELD_MAX_CHARS)?;
        check_length("team_id", &self.team_id, 1, TEAM_ID_MAX_CHARS)?;
        check_length("team_domain", &self.team_domain, 1, SHORT_FIELD_MAX_CHARS)?;
        check_length("channel_name", &self.channel_name, 1, SHORT_FIELD_MAX_CHARS)?;
        check_length("reply_message", &self.reply_message, 1, REPLY_MESSAGE_MAX_CHARS)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl UpsertOutcome {
    /// Title of the confirmation posted back to the channel.
    pub fn title(self) -> &'static str {
        match self {
            Self::Created => "Added",
            Self::Updated => "Updated",
        }
    }
}
