use serde::{Deserialize, Serialize};

use super::{check_length, SHORT_FIELD_MAX_CHARS, TEAM_ID_MAX_CHARS};
use crate::errors::DomainError;

pub const DEFAULT_CORRELATION_TTL_SECS: u64 = 1800;

/// Context captured by the add command and consumed by the modal submission.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationEntry {
    pub team_id: String,
    pub team_domain: String,
    pub channel_id: String,
    pub channel_name: String,
}

impl std::fmt::Debug for CorrelationEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorrelationEntry")
            .field("team_id", &"[redacted]")
            .field("team_domain", &self.team_domain)
            .field("channel_id", &self.channel_id)
            .field("channel_name", &self.channel_name)
            .finish()
    }
}

impl CorrelationEntry {
    pub fn validate(&self) -> Result<(), DomainError> {
        check_length("team_id", &self.team_id, 1, TEAM_ID_MAX_CHARS)?;
        check_length("team_domain", &self.team_domain, 1, SHORT_FIELD_MAX_CHARS)?;
        check_length("channel_id", &self.channel_id, 1, SHORT_FIELD_MAX_CHARS)?;
        check_length("channel_name", &self.channel_name, 1, SHORT_FIELD_MAX_CHARS)
    }
}

/// Storage key for a user's pending interaction.
pub fn correlation_key(user_id: &str) -> String {
    format!("user:{user_id}:event_data")
}
