use std::sync::Arc;

use secrecy::SecretString;

use tonecheck_core::cipher::FieldCipher;
use tonecheck_core::clock::FixedClock;
use tonecheck_core::sentiment::SentimentScores;
use tonecheck_core::signature::{sign, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use tonecheck_db::{InMemoryChannelConfigRepository, InMemoryCorrelationRepository};

use crate::notifier::RecordingNotifier;
use crate::oracle::StaticSentimentOracle;
use crate::payloads::{Endpoint, VerifiedRequest, WebhookEnvelope};
use crate::router::{RouterSettings, WebhookRouter};

pub(crate) const SIGNING_SECRET: &[u8] = b"8f742231b10e8888abcd99yyyzzz85a5";
pub(crate) const NOW: i64 = 1_700_000_000;
pub(crate) const HOSTILE_TEXT: &str = "this is the worst idea anyone has ever had in here";

pub(crate) struct Harness {
    pub router: WebhookRouter,
    pub channels: Arc<InMemoryChannelConfigRepository>,
    pub correlations: Arc<InMemoryCorrelationRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_notifier(RecordingNotifier::new())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        let clock = Arc::new(FixedClock::at_unix(NOW));
        let cipher = FieldCipher::new(&SecretString::from("router-test-encryption".to_owned()));
        let channels = Arc::new(InMemoryChannelConfigRepository::new(cipher));
        let correlations = Arc::new(InMemoryCorrelationRepository::new(clock.clone()));
        let notifier = Arc::new(notifier);
        let oracle = StaticSentimentOracle::new(SentimentScores::new(Some(0.92), Some(0.6)))
            .with_text(HOSTILE_TEXT, SentimentScores::new(Some(0.08), Some(-0.74)));

        let router = WebhookRouter::new(
            channels.clone(),
            correlations.clone(),
            notifier.clone(),
            Arc::new(oracle),
            RouterSettings::default(),
        );
        Self { router, channels, correlations, notifier, clock }
    }
}

pub(crate) fn signed_request(endpoint: Endpoint, body: &str) -> VerifiedRequest {
    let timestamp = NOW.to_string();
    let signature = sign(SIGNING_SECRET, &timestamp, body.as_bytes());
    let envelope = WebhookEnvelope::new(
        endpoint,
        [(TIMESTAMP_HEADER, timestamp), (SIGNATURE_HEADER, signature)],
        body.as_bytes().to_vec(),
    );
    VerifiedRequest::verify(envelope, SIGNING_SECRET, NOW).expect("fixture signature verifies")
}

pub(crate) fn form(fields: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(fields).expect("encode form")
}

pub(crate) fn add_command_form(user_id: &str, channel_id: &str) -> String {
    form(&[
        ("command", "/tt-add-message"),
        ("user_id", user_id),
        ("team_id", "T0001"),
        ("team_domain", "acme"),
        ("channel_id", channel_id),
        ("channel_name", "general"),
        ("trigger_id", "13345224609.738474920.8088930838d88f008e0"),
    ])
}

pub(crate) fn submission_form(callback_id: &str, user_id: &str, message: &str) -> String {
    let payload = serde_json::json!({
        "type": "view_submission",
        "team": { "id": "T0001", "domain": "acme" },
        "user": { "id": user_id, "username": "dana" },
        "view": {
            "callback_id": callback_id,
            "state": { "values": {
                "sentiment_analysis_message_block": {
                    "sentiment_analysis_message_input": { "type": "plain_text_input", "value": message }
                }
            } }
        }
    });
    form(&[("payload", &payload.to_string())])
}
