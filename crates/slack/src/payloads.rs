//! Inbound webhook shapes.
//!
//! A [`WebhookEnvelope`] is built once per HTTP call from the raw body and headers. It becomes a
//! [`VerifiedRequest`] only by passing the signature check, and handlers accept nothing else.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use tonecheck_core::errors::{ApplicationError, DomainError};
use tonecheck_core::signature::{self, SignatureError, SIGNATURE_HEADER, TIMESTAMP_HEADER};

pub const EVENTS_PATH: &str = "/api/v1/slack/events";
pub const VERIFICATION_PATH: &str = "/api/v1/slack/verification";
pub const COMMANDS_PATH: &str = "/api/v1/slack/commands";
pub const INTERACTIONS_PATH: &str = "/api/v1/slack/interactions";

const MIN_VERIFICATION_FIELD_CHARS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Events,
    Verification,
    Commands,
    Interactions,
}

impl Endpoint {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            EVENTS_PATH => Some(Self::Events),
            VERIFICATION_PATH => Some(Self::Verification),
            COMMANDS_PATH => Some(Self::Commands),
            INTERACTIONS_PATH => Some(Self::Interactions),
            _ => None,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Events => EVENTS_PATH,
            Self::Verification => VERIFICATION_PATH,
            Self::Commands => COMMANDS_PATH,
            Self::Interactions => INTERACTIONS_PATH,
        }
    }
}

/// Declared payload type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookKind {
    UrlVerification,
    EventCallback,
    Command,
    Interaction,
    Unknown(String),
}

impl WebhookKind {
    fn classify(endpoint: Endpoint, raw_body: &[u8]) -> Self {
        match endpoint {
            Endpoint::Verification => Self::UrlVerification,
            Endpoint::Commands => Self::Command,
            Endpoint::Interactions => Self::Interaction,
            Endpoint::Events => {
                let declared = serde_json::from_slice::<Value>(raw_body)
                    .ok()
                    .and_then(|body| body.get("type").and_then(Value::as_str).map(str::to_owned))
                    .unwrap_or_default();
                match declared.as_str() {
                    "url_verification" => Self::UrlVerification,
                    "event_callback" => Self::EventCallback,
                    _ => Self::Unknown(declared),
                }
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct WebhookEnvelope {
    correlation_id: String,
    endpoint: Endpoint,
    kind: WebhookKind,
    headers: BTreeMap<String, String>,
    raw_body: Vec<u8>,
}

impl WebhookEnvelope {
    pub fn new<I, K, V>(endpoint: Endpoint, headers: I, raw_body: Vec<u8>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
            .collect();
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            kind: WebhookKind::classify(endpoint, &raw_body),
            endpoint,
            headers,
            raw_body,
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn kind(&self) -> &WebhookKind {
        &self.kind
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }
}

/// An envelope whose signature matched and whose timestamp was fresh.
#[derive(Clone, Debug)]
pub struct VerifiedRequest {
    envelope: WebhookEnvelope,
    timestamp_delta_secs: i64,
}

impl VerifiedRequest {
    pub fn verify(
        envelope: WebhookEnvelope,
        signing_secret: &[u8],
        now: i64,
    ) -> Result<Self, SignatureError> {
        let timestamp_delta_secs = signature::verify_detailed(
            signing_secret,
            envelope.header(TIMESTAMP_HEADER),
            envelope.header(SIGNATURE_HEADER),
            envelope.raw_body(),
            now,
        )?;
        Ok(Self { envelope, timestamp_delta_secs })
    }

    pub fn envelope(&self) -> &WebhookEnvelope {
        &self.envelope
    }

    pub fn timestamp_delta_secs(&self) -> i64 {
        self.timestamp_delta_secs
    }

    pub fn correlation_id(&self) -> &str {
        self.envelope.correlation_id()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct UrlVerificationRequest {
    pub token: String,
    pub challenge: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl UrlVerificationRequest {
    pub fn parse(raw_body: &[u8]) -> Result<Self, ApplicationError> {
        let request: Self = serde_json::from_slice(raw_body)
            .map_err(|error| ApplicationError::Validation(error.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ApplicationError> {
        for (field, value) in [("token", &self.token), ("challenge", &self.challenge)] {
            if value.chars().count() < MIN_VERIFICATION_FIELD_CHARS {
                return Err(ApplicationError::Validation(format!(
                    "`{field}` must be at least {MIN_VERIFICATION_FIELD_CHARS} characters"
                )));
            }
        }
        if self.kind.trim() != "url_verification" {
            return Err(ApplicationError::Validation(format!(
                "`type` must be `url_verification`, got `{}`",
                self.kind
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChallengeResponse {
    pub challenge: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EventCallback {
    #[serde(default)]
    pub event: Option<MessageEvent>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
}

impl MessageEvent {
    pub fn is_from_bot(&self) -> bool {
        self.bot_id.is_some() || self.subtype.as_deref() == Some("bot_message")
    }
}

/// Form fields Slack posts for a slash command.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SlashCommandForm {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub team_domain: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub trigger_id: Option<String>,
}

impl SlashCommandForm {
    pub fn parse(raw_body: &[u8]) -> Result<Self, ApplicationError> {
        serde_urlencoded::from_bytes(raw_body)
            .map_err(|error| ApplicationError::Validation(error.to_string()))
    }
}

#[derive(Clone, Debug, Deserialize)]
struct InteractionForm {
    #[serde(default)]
    payload: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub team: InteractionTeam,
    pub user: InteractionUser,
    #[serde(default)]
    pub api_app_id: Option<String>,
    #[serde(default)]
    pub trigger_id: Option<String>,
    pub view: InteractionView,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InteractionTeam {
    pub id: String,
    pub domain: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InteractionUser {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InteractionView {
    pub callback_id: String,
    pub state: ViewState,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, ElementInput>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ElementInput {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Option<String>,
}

impl InteractionPayload {
    /// Decodes the JSON carried in the `payload` form field.
    pub fn parse(raw_body: &[u8]) -> Result<Self, ApplicationError> {
        let form: InteractionForm = serde_urlencoded::from_bytes(raw_body)
            .map_err(|error| ApplicationError::Validation(error.to_string()))?;
        let payload = form
            .payload
            .filter(|payload| !payload.trim().is_empty())
            .ok_or(DomainError::MissingField { field: "payload" })?;
        serde_json::from_str(&payload).map_err(|error| ApplicationError::Validation(error.to_string()))
    }

    pub fn input_value(&self, block_id: &str, action_id: &str) -> Option<&str> {
        self.view
            .state
            .values
            .get(block_id)
            .and_then(|block| block.get(action_id))
            .and_then(|input| input.value.as_deref())
    }
}

/// Trims an optional form field and reports it missing when empty.
pub fn required<'a>(
    field: &'static str,
    value: &'a Option<String>,
) -> Result<&'a str, DomainError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(DomainError::MissingField { field })
}
