use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use tonecheck_core::cipher::FieldCipher;
use tonecheck_core::clock::{Clock, SystemClock};
use tonecheck_core::domain::channel::{ChannelConfiguration, ChannelRegistration, UpsertOutcome};
use tonecheck_core::domain::correlation::{correlation_key, CorrelationEntry};

use super::{ttl_secs, ChannelConfigRepository, CorrelationRepository, RepositoryError};

pub struct InMemoryChannelConfigRepository {
    cipher: FieldCipher,
    channels: RwLock<HashMap<String, ChannelConfiguration>>,
}

impl InMemoryChannelConfigRepository {
    pub fn new(cipher: FieldCipher) -> Self {
        Self { cipher, channels: RwLock::default() }
    }

    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl ChannelConfigRepository for InMemoryChannelConfigRepository {
    async fn read(&self, channel_id: &str) -> Result<Option<String>, RepositoryError> {
        let channels = self.channels.read().await;
        Ok(channels.get(channel_id).map(|channel| channel.reply_message.clone()))
    }

    async fn find(
        &self,
        channel_id: &str,
    ) -> Result<Option<ChannelConfiguration>, RepositoryError> {
        let channels = self.channels.read().await;
        Ok(channels.get(channel_id).cloned())
    }

    async fn upsert(
        &self,
        registration: ChannelRegistration,
    ) -> Result<UpsertOutcome, RepositoryError> {
        registration.validate()?;

        let mut channels = self.channels.write().await;
        if let Some(existing) = channels.get_mut(&registration.channel_id) {
            existing.reply_message = registration.reply_message;
            return Ok(UpsertOutcome::Updated);
        }

        let team_id_encrypted = self.cipher.encrypt(&registration.team_id)?;
        channels.insert(
            registration.channel_id.clone(),
            ChannelConfiguration {
                channel_id: registration.channel_id,
                team_id_encrypted,
                team_domain: registration.team_domain,
                channel_name: registration.channel_name,
                reply_message: registration.reply_message,
                registered_at: Utc::now(),
            },
        );
        Ok(UpsertOutcome::Created)
    }
}

pub struct InMemoryCorrelationRepository {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, (CorrelationEntry, i64)>>,
}

impl Default for InMemoryCorrelationRepository {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl InMemoryCorrelationRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, entries: RwLock::default() }
    }

    /// Number of stored keys, live or not.
    pub async fn stored_keys(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait::async_trait]
impl CorrelationRepository for InMemoryCorrelationRepository {
    async fn put(
        &self,
        user_id: &str,
        entry: CorrelationEntry,
        ttl: Duration,
    ) -> Result<(), RepositoryError> {
        let now = self.clock.unix_timestamp();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(correlation_key(user_id), (entry, now.saturating_add(ttl_secs(ttl))));
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<CorrelationEntry>, RepositoryError> {
        let now = self.clock.unix_timestamp();
        let entries = self.entries.read().await;
        Ok(entries
            .get(&correlation_key(user_id))
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(entry, _)| entry.clone()))
    }

    async fn delete(&self, user_id: &str) -> Result<(), RepositoryError> {
        self.entries.write().await.remove(&correlation_key(user_id));
        Ok(())
    }

    async fn ttl(&self, user_id: &str) -> Result<Option<Duration>, RepositoryError> {
        let now = self.clock.unix_timestamp();
        let entries = self.entries.read().await;
        Ok(entries
            .get(&correlation_key(user_id))
            .and_then(|(_, expires_at)| u64::try_from(expires_at.saturating_sub(now)).ok())
            .filter(|remaining| *remaining > 0)
            .map(Duration::from_secs))
    }
}
