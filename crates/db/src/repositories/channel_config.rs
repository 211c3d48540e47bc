use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use tonecheck_core::cipher::FieldCipher;
use tonecheck_core::domain::channel::{ChannelConfiguration, ChannelRegistration, UpsertOutcome};

use super::{ChannelConfigRepository, RepositoryError};
use crate::DbPool;

pub struct SqlChannelConfigRepository {
    pool: DbPool,
    cipher: FieldCipher,
}

impl SqlChannelConfigRepository {
    pub fn new(pool: DbPool, cipher: FieldCipher) -> Self {
        Self { pool, cipher }
    }
}

#[async_trait::async_trait]
impl ChannelConfigRepository for SqlChannelConfigRepository {
    async fn read(&self, channel_id: &str) -> Result<Option<String>, RepositoryError> {
        let message = sqlx::query_scalar::<_, String>(
            "SELECT reply_message FROM channel_configuration WHERE channel_id = ?",
        )
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    async fn find(
        &self,
        channel_id: &str,
    ) -> Result<Option<ChannelConfiguration>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT channel_id, team_id_encrypted, team_domain, channel_name, reply_message,
                   registered_at
            FROM channel_configuration
            WHERE channel_id = ?
            "#,
        )
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(configuration_from_row).transpose()
    }

    async fn upsert(
        &self,
        registration: ChannelRegistration,
    ) -> Result<UpsertOutcome, RepositoryError> {
        registration.validate()?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let team_id_encrypted = self.cipher.encrypt(&registration.team_id)?;

        // The conflict branch keeps the original row id, which tells the two outcomes apart.
        let stored_id = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO channel_configuration (
                id, channel_id, team_id_encrypted, team_domain, channel_name, reply_message,
                registered_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(channel_id) DO UPDATE SET
                reply_message = excluded.reply_message,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(&id)
        .bind(&registration.channel_id)
        .bind(&team_id_encrypted)
        .bind(&registration.team_domain)
        .bind(&registration.channel_name)
        .bind(&registration.reply_message)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        Ok(if stored_id == id { UpsertOutcome::Created } else { UpsertOutcome::Updated })
    }
}

fn configuration_from_row(row: SqliteRow) -> Result<ChannelConfiguration, RepositoryError> {
    Ok(ChannelConfiguration {
        channel_id: row.try_get("channel_id")?,
        team_id_encrypted: row.try_get("team_id_encrypted")?,
        team_domain: row.try_get("team_domain")?,
        channel_name: row.try_get("channel_name")?,
        reply_message: row.try_get("reply_message")?,
        registered_at: parse_timestamp("registered_at", row.try_get("registered_at")?)?,
    })
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use tonecheck_core::cipher::FieldCipher;
    use tonecheck_core::domain::channel::{ChannelRegistration, UpsertOutcome};

    use super::SqlChannelConfigRepository;
    use crate::repositories::{ChannelConfigRepository, RepositoryError};
    use crate::{connect_with_settings, migrations, DbPool};

    fn cipher() -> FieldCipher {
        FieldCipher::new(&SecretString::from("channel-config-test-key".to_owned()))
    }

    fn registration(channel_id: &str, reply_message: &str) -> ChannelRegistration {
        ChannelRegistration {
            channel_id: channel_id.to_owned(),
            team_id: "T0001".to_owned(),
            team_domain: "acme".to_owned(),
            channel_name: "general".to_owned(),
            reply_message: reply_message.to_owned(),
        }
    }

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    async fn row_count(pool: &DbPool) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM channel_configuration")
            .fetch_one(pool)
            .await
            .expect("count rows")
    }

    #[tokio::test]
    async fn upsert_creates_then_updates_without_duplicates() {
        let pool = setup_pool().await;
        let repo = SqlChannelConfigRepository::new(pool.clone(), cipher());

        let created = repo.upsert(registration("C1", "Be nice")).await.expect("create");
        let updated = repo.upsert(registration("C1", "Be kind")).await.expect("update");

        assert_eq!(created, UpsertOutcome::Created);
        assert_eq!(updated, UpsertOutcome::Updated);
        assert_eq!(repo.read("C1").await.expect("read"), Some("Be kind".to_owned()));
        assert_eq!(row_count(&pool).await, 1);

        pool.close().await;
    }

    #[tokio::test]
    async fn update_only_touches_reply_message() {
        let pool = setup_pool().await;
        let repo = SqlChannelConfigRepository::new(pool.clone(), cipher());

        repo.upsert(registration("C1", "Be nice")).await.expect("create");
        let before = repo.find("C1").await.expect("find").expect("row exists");

        let mut renamed = registration("C1", "Be kind");
        renamed.channel_name = "renamed".to_owned();
        renamed.team_domain = "other".to_owned();
        repo.upsert(renamed).await.expect("update");
        let after = repo.find("C1").await.expect("find").expect("row exists");

        assert_eq!(after.reply_message, "Be kind");
        assert_eq!(after.channel_name, before.channel_name);
        assert_eq!(after.team_domain, before.team_domain);
        assert_eq!(after.team_id_encrypted, before.team_id_encrypted);
        assert_eq!(after.registered_at, before.registered_at);

        pool.close().await;
    }

    #[tokio::test]
    async fn team_id_is_stored_encrypted() {
        let pool = setup_pool().await;
        let repo = SqlChannelConfigRepository::new(pool.clone(), cipher());

        repo.upsert(registration("C1", "Be nice")).await.expect("create");
        let stored = repo.find("C1").await.expect("find").expect("row exists");

        assert_ne!(stored.team_id_encrypted, "T0001");
        assert!(!stored.team_id_encrypted.contains("T0001"));
        assert_eq!(cipher().decrypt(&stored.team_id_encrypted), "T0001");

        pool.close().await;
    }

    #[tokio::test]
    async fn read_of_unknown_channel_is_absent() {
        let pool = setup_pool().await;
        let repo = SqlChannelConfigRepository::new(pool.clone(), cipher());

        assert_eq!(repo.read("C404").await.expect("read"), None);
        assert_eq!(repo.find("C404").await.expect("find"), None);

        pool.close().await;
    }

    #[tokio::test]
    async fn invalid_registration_is_rejected_before_writing() {
        let pool = setup_pool().await;
        let repo = SqlChannelConfigRepository::new(pool.clone(), cipher());

        let error = repo
            .upsert(registration("C1", &"x".repeat(101)))
            .await
            .expect_err("oversized message should fail");

        assert!(matches!(error, RepositoryError::Validation(_)));
        assert_eq!(row_count(&pool).await, 0);

        pool.close().await;
    }
}
