//! PostgreSQL implementation of LockRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use warden_core::entities::Lock;
use warden_core::traits::{LockRepository, RepoResult};
use warden_core::value_objects::Snowflake;

use crate::mappers::LockRow;
use crate::models::LockModel;

use super::error::map_db_error;

/// PostgreSQL implementation of LockRepository
#[derive(Clone)]
pub struct PgLockRepository {
    pool: PgPool,
}

impl PgLockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LockRepository for PgLockRepository {
    #[instrument(skip(self))]
    async fn find(&self, channel_id: Snowflake) -> RepoResult<Option<Lock>> {
        let result = sqlx::query_as::<_, LockModel>(
            r"
            SELECT channel_id, previous_value, moderator_id, moderator_name, guild_id, reason, end_time
            FROM locks
            WHERE channel_id = $1
            ",
        )
        .bind(channel_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Lock::from))
    }

    #[instrument(skip(self))]
    async fn find_expired(&self, now: DateTime<Utc>) -> RepoResult<Vec<Lock>> {
        let results = sqlx::query_as::<_, LockModel>(
            r"
            SELECT channel_id, previous_value, moderator_id, moderator_name, guild_id, reason, end_time
            FROM locks
            WHERE end_time <= $1
            ORDER BY end_time ASC
            ",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Lock::from).collect())
    }

    /// Re-locking keeps `previous_value` from the first lock
    #[instrument(skip(self, lock), fields(channel_id = %lock.channel_id))]
    async fn save(&self, lock: &Lock) -> RepoResult<()> {
        let row = LockRow::new(lock);

        sqlx::query(
            r"
            INSERT INTO locks (channel_id, previous_value, moderator_id, moderator_name, guild_id, reason, end_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (channel_id) DO UPDATE SET
                moderator_id = EXCLUDED.moderator_id,
                moderator_name = EXCLUDED.moderator_name,
                reason = EXCLUDED.reason,
                end_time = EXCLUDED.end_time
            ",
        )
        .bind(row.channel_id)
        .bind(lock.previous_value)
        .bind(row.moderator_id)
        .bind(row.moderator_name)
        .bind(row.guild_id)
        .bind(row.reason)
        .bind(lock.end_time)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, channel_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM locks WHERE channel_id = $1")
            .bind(channel_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
