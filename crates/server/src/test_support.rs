use std::sync::Arc;

use axum::Router;
use secrecy::SecretString;

use tonecheck_core::cipher::FieldCipher;
use tonecheck_core::clock::FixedClock;
use tonecheck_core::sentiment::SentimentScores;
use tonecheck_db::{
    connect_with_settings, migrations, DbPool, SqlChannelConfigRepository, SqlCorrelationRepository,
};
use tonecheck_slack::{RecordingNotifier, RouterSettings, StaticSentimentOracle, WebhookRouter};

use crate::{app, AppState};

pub(crate) const SIGNING_SECRET: &[u8] = b"server-test-signing-secret";
pub(crate) const API_KEY: &str = "server-test-api-key";
pub(crate) const NOW: i64 = 1_700_000_000;
pub(crate) const HOSTILE_TEXT: &str = "nobody asked for your terrible opinion";

pub(crate) struct Fixture {
    pub notifier: Arc<RecordingNotifier>,
    pub pool: DbPool,
}

pub(crate) async fn test_app() -> (Router, Fixture) {
    let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");

    let clock = Arc::new(FixedClock::at_unix(NOW));
    let cipher = FieldCipher::new(&SecretString::from("server-test-encryption".to_owned()));
    let notifier = Arc::new(RecordingNotifier::new());
    let oracle = StaticSentimentOracle::new(SentimentScores::new(Some(0.9), Some(0.5)))
        .with_text(HOSTILE_TEXT, SentimentScores::new(Some(0.1), Some(-0.6)));

    let router = WebhookRouter::new(
        Arc::new(SqlChannelConfigRepository::new(pool.clone(), cipher)),
        Arc::new(SqlCorrelationRepository::new(pool.clone(), clock.clone())),
        notifier.clone(),
        Arc::new(oracle),
        RouterSettings::default(),
    );
    let state = AppState::new(
        router,
        clock,
        SecretString::from(String::from_utf8_lossy(SIGNING_SECRET).into_owned()),
        SecretString::from(API_KEY.to_owned()),
    );

    (app(state), Fixture { notifier, pool })
}
