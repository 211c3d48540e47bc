use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use tonecheck_core::cipher::FieldCipher;
use tonecheck_core::clock::FixedClock;
use tonecheck_core::sentiment::SentimentScores;
use tonecheck_core::signature::sign;
use tonecheck_db::{
    connect_with_settings, migrations, DbPool, SqlChannelConfigRepository, SqlCorrelationRepository,
};
use tonecheck_server::{app, AppState};
use tonecheck_slack::notifier::SentNotification;
use tonecheck_slack::{RecordingNotifier, RouterSettings, StaticSentimentOracle, WebhookRouter};

const SIGNING_SECRET: &str = "flow-signing-secret";
const NOW: i64 = 1_750_000_000;
const NEGATIVE_TEXT: &str = "this whole thread is garbage";

struct Flow {
    app: Router,
    pool: DbPool,
    notifier: Arc<RecordingNotifier>,
    clock: Arc<FixedClock>,
}

async fn flow() -> Flow {
    let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");

    let clock = Arc::new(FixedClock::at_unix(NOW));
    let notifier = Arc::new(RecordingNotifier::new());
    let oracle = StaticSentimentOracle::new(SentimentScores::new(Some(0.95), Some(0.7)))
        .with_text(NEGATIVE_TEXT, SentimentScores::new(Some(0.2), Some(-0.5)));
    let cipher = FieldCipher::new(&SecretString::from("flow-encryption-secret".to_owned()));

    let router = WebhookRouter::new(
        Arc::new(SqlChannelConfigRepository::new(pool.clone(), cipher)),
        Arc::new(SqlCorrelationRepository::new(pool.clone(), clock.clone())),
        notifier.clone(),
        Arc::new(oracle),
        RouterSettings::default(),
    );
    let state = AppState::new(
        router,
        clock.clone(),
        SecretString::from(SIGNING_SECRET.to_owned()),
        SecretString::from("flow-api-key".to_owned()),
    );

    Flow { app: app(state), pool, notifier, clock }
}

impl Flow {
    async fn post(&self, path: &str, body: &str) -> (StatusCode, Value) {
        let timestamp = self.clock_now().to_string();
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("X-Slack-Request-Timestamp", &timestamp)
            .header("X-Slack-Signature", sign(SIGNING_SECRET.as_bytes(), &timestamp, body.as_bytes()))
            .body(Body::from(body.to_owned()))
            .expect("request");

        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn clock_now(&self) -> i64 {
        use tonecheck_core::clock::Clock;
        self.clock.unix_timestamp()
    }

    async fn channel_rows(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM channel_configuration")
            .fetch_one(&self.pool)
            .await
            .expect("count channels")
    }
}

fn add_command(user_id: &str, channel_id: &str) -> String {
    serde_urlencoded::to_string([
        ("command", "/tt-add-message"),
        ("user_id", user_id),
        ("team_id", "T0001"),
        ("team_domain", "acme"),
        ("channel_id", channel_id),
        ("channel_name", "general"),
        ("trigger_id", "13345224609.738474920.8088930838d88f008e0"),
    ])
    .expect("encode command")
}

fn submission(user_id: &str, message: &str) -> String {
    let payload = json!({
        "type": "view_submission",
        "team": { "id": "T0001", "domain": "acme" },
        "user": { "id": user_id },
        "view": {
            "callback_id": "modal-identifier",
            "state": { "values": {
                "sentiment_analysis_message_block": {
                    "sentiment_analysis_message_input": { "type": "plain_text_input", "value": message }
                }
            } }
        }
    });
    serde_urlencoded::to_string([("payload", payload.to_string())]).expect("encode payload")
}

fn message_event(text: &str, channel: &str) -> String {
    json!({
        "type": "event_callback",
        "event": { "type": "message", "text": text, "channel": channel, "user": "U2" }
    })
    .to_string()
}

#[tokio::test]
async fn configured_reply_is_sent_for_negative_message() {
    let flow = flow().await;

    let (status, body) = flow.post("/api/v1/slack/commands", &add_command("U1", "C1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, body) = flow.post("/api/v1/slack/interactions", &submission("U1", "Be nice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "response_action": "clear" }));
    assert_eq!(flow.channel_rows().await, 1);

    let (status, _) = flow.post("/api/v1/slack/events", &message_event(NEGATIVE_TEXT, "C1")).await;
    assert_eq!(status, StatusCode::OK);

    let sent = flow.notifier.sent().await;
    assert!(matches!(sent.first(), Some(SentNotification::Modal { .. })));
    match sent.last() {
        Some(SentNotification::Message { channel, text, attachments }) => {
            assert_eq!(channel, "C1");
            assert_eq!(text, "Sentiment Analysis");
            assert_eq!(attachments[0].fields[1].value, "definitely negative");
            assert_eq!(attachments[0].fields[2].value, "Be nice");
        }
        other => panic!("expected a channel message, got {other:?}"),
    }
}

#[tokio::test]
async fn bogus_event_type_is_rejected_without_side_effects() {
    let flow = flow().await;

    let (status, body) = flow.post("/api/v1/slack/events", r#"{"type": "bogus"}"#).await;

    assert_eq!(status.as_u16(), 460);
    assert_eq!(body, json!({ "response_action": "clear" }));
    assert!(flow.notifier.sent().await.is_empty());
    assert_eq!(flow.channel_rows().await, 0);
}

#[tokio::test]
async fn submission_after_expiry_asks_user_to_retry() {
    let flow = flow().await;
    flow.post("/api/v1/slack/commands", &add_command("U1", "C1")).await;
    flow.clock.advance(chrono::Duration::seconds(1801));

    let (status, body) = flow.post("/api/v1/slack/interactions", &submission("U1", "Be nice")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "response_action": "clear" }));
    assert_eq!(flow.channel_rows().await, 0);
    let messages = flow.notifier.messages().await;
    let (channel, text, _) = messages.last().expect("user notified");
    assert_eq!(channel, "U1");
    assert_eq!(text, "User data not found. Please try again.");
}
