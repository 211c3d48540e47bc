use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use tonecheck_core::cipher::FieldCipher;
use tonecheck_core::clock::SystemClock;
use tonecheck_core::config::{AppConfig, ConfigError, LoadOptions};
use tonecheck_db::{
    connect_with_config, migrations, DbPool, SqlChannelConfigRepository, SqlCorrelationRepository,
};
use tonecheck_slack::{
    HttpSentimentOracle, NotifierError, OracleError, RouterSettings, SlackNotifier, WebhookRouter,
};

use crate::state::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("slack client setup failed: {0}")]
    Notifier(#[source] NotifierError),
    #[error("sentiment oracle setup failed: {0}")]
    Oracle(#[source] OracleError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let clock = Arc::new(SystemClock);
    let cipher = FieldCipher::new(&config.security.encryption_key);
    let notifier = SlackNotifier::from_config(&config.slack).map_err(BootstrapError::Notifier)?;
    let oracle =
        HttpSentimentOracle::from_config(&config.sentiment).map_err(BootstrapError::Oracle)?;

    let router = WebhookRouter::new(
        Arc::new(SqlChannelConfigRepository::new(db_pool.clone(), cipher)),
        Arc::new(SqlCorrelationRepository::new(db_pool.clone(), clock.clone())),
        Arc::new(notifier),
        Arc::new(oracle),
        RouterSettings::from_config(&config),
    );
    let state = AppState::new(
        router,
        clock,
        config.slack.signing_secret.clone(),
        config.security.api_key.clone(),
    );

    Ok(Application { config, db_pool, state })
}
