use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use tonecheck_core::cipher::CipherError;
use tonecheck_core::domain::channel::{ChannelConfiguration, ChannelRegistration, UpsertOutcome};
use tonecheck_core::domain::correlation::CorrelationEntry;
use tonecheck_core::errors::DomainError;

pub mod channel_config;
pub mod correlation;
pub mod memory;

pub use channel_config::SqlChannelConfigRepository;
pub use correlation::SqlCorrelationRepository;
pub use memory::{InMemoryChannelConfigRepository, InMemoryCorrelationRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
    #[error(transparent)]
    Validation(#[from] DomainError),
}

/// Durable reply configuration, one row per channel.
#[async_trait]
pub trait ChannelConfigRepository: Send + Sync {
    /// Reply message configured for `channel_id`, if any.
    async fn read(&self, channel_id: &str) -> Result<Option<String>, RepositoryError>;

    /// Full record with the team id still encrypted.
    async fn find(&self, channel_id: &str)
        -> Result<Option<ChannelConfiguration>, RepositoryError>;

    /// Inserts a new row, or replaces only the reply message of an existing one.
    async fn upsert(
        &self,
        registration: ChannelRegistration,
    ) -> Result<UpsertOutcome, RepositoryError>;
}

/// Short-lived context keyed by the user who started an interaction.
#[async_trait]
pub trait CorrelationRepository: Send + Sync {
    /// Overwrites any existing entry and restarts its lifetime.
    async fn put(
        &self,
        user_id: &str,
        entry: CorrelationEntry,
        ttl: Duration,
    ) -> Result<(), RepositoryError>;

    async fn get(&self, user_id: &str) -> Result<Option<CorrelationEntry>, RepositoryError>;

    async fn delete(&self, user_id: &str) -> Result<(), RepositoryError>;

    /// Remaining lifetime, or `None` when there is no live entry.
    async fn ttl(&self, user_id: &str) -> Result<Option<Duration>, RepositoryError>;
}

pub(crate) fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)
}
