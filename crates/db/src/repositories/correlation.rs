use std::sync::Arc;
use std::time::Duration;

use sqlx::Row;

use tonecheck_core::clock::{Clock, SystemClock};
use tonecheck_core::domain::correlation::{correlation_key, CorrelationEntry};

use super::{ttl_secs, CorrelationRepository, RepositoryError};
use crate::DbPool;

/// Rows whose `expires_at` is not in the future are treated as absent.
pub struct SqlCorrelationRepository {
    pool: DbPool,
    clock: Arc<dyn Clock>,
}

impl SqlCorrelationRepository {
    pub fn new(pool: DbPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    pub fn with_system_clock(pool: DbPool) -> Self {
        Self::new(pool, Arc::new(SystemClock))
    }
}

#[async_trait::async_trait]
impl CorrelationRepository for SqlCorrelationRepository {
    async fn put(
        &self,
        user_id: &str,
        entry: CorrelationEntry,
        ttl: Duration,
    ) -> Result<(), RepositoryError> {
        let now = self.clock.unix_timestamp();
        let expires_at = now.saturating_add(ttl_secs(ttl));

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM correlation_entry WHERE expires_at <= ?")
            .bind(now)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO correlation_entry (
                user_key, team_id, team_domain, channel_id, channel_name, expires_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_key) DO UPDATE SET
                team_id = excluded.team_id,
                team_domain = excluded.team_domain,
                channel_id = excluded.channel_id,
                channel_name = excluded.channel_name,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(correlation_key(user_id))
        .bind(&entry.team_id)
        .bind(&entry.team_domain)
        .bind(&entry.channel_id)
        .bind(&entry.channel_name)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<CorrelationEntry>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT team_id, team_domain, channel_id, channel_name
            FROM correlation_entry
            WHERE user_key = ? AND expires_at > ?
            "#,
        )
        .bind(correlation_key(user_id))
        .bind(self.clock.unix_timestamp())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(CorrelationEntry {
                team_id: row.try_get("team_id")?,
                team_domain: row.try_get("team_domain")?,
                channel_id: row.try_get("channel_id")?,
                channel_name: row.try_get("channel_name")?,
            })
        })
        .transpose()
    }

    async fn delete(&self, user_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM correlation_entry WHERE user_key = ?")
            .bind(correlation_key(user_id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ttl(&self, user_id: &str) -> Result<Option<Duration>, RepositoryError> {
        let now = self.clock.unix_timestamp();
        let expires_at = sqlx::query_scalar::<_, i64>(
            "SELECT expires_at FROM correlation_entry WHERE user_key = ? AND expires_at > ?",
        )
        .bind(correlation_key(user_id))
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expires_at
            .and_then(|expires_at| u64::try_from(expires_at.saturating_sub(now)).ok())
            .map(Duration::from_secs))
    }
}
