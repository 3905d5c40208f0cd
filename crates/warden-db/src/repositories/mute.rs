//! PostgreSQL implementation of MuteRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use warden_core::entities::Mute;
use warden_core::traits::{MuteRepository, RepoResult};
use warden_core::value_objects::{InfractionId, Snowflake};

use crate::mappers::MuteRow;
use crate::models::MuteModel;

use super::error::map_db_error;

/// PostgreSQL implementation of MuteRepository
#[derive(Clone)]
pub struct PgMuteRepository {
    pool: PgPool,
}

impl PgMuteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MuteRepository for PgMuteRepository {
    #[instrument(skip(self))]
    async fn find(&self, infraction_id: InfractionId) -> RepoResult<Option<Mute>> {
        let result = sqlx::query_as::<_, MuteModel>(
            r"
            SELECT infraction_id, guild_id, user_id, user_name, end_time
            FROM mutes
            WHERE infraction_id = $1
            ",
        )
        .bind(infraction_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Mute::from))
    }

    #[instrument(skip(self))]
    async fn find_for_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<Mute>> {
        let result = sqlx::query_as::<_, MuteModel>(
            r"
            SELECT infraction_id, guild_id, user_id, user_name, end_time
            FROM mutes
            WHERE guild_id = $1 AND user_id = $2
            ",
        )
        .bind(guild_id.into_inner())
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Mute::from))
    }

    #[instrument(skip(self))]
    async fn find_active(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Mute>> {
        let result = sqlx::query_as::<_, MuteModel>(
            r"
            SELECT infraction_id, guild_id, user_id, user_name, end_time
            FROM mutes
            WHERE guild_id = $1 AND user_id = $2 AND end_time > $3
            ",
        )
        .bind(guild_id.into_inner())
        .bind(user_id.into_inner())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Mute::from))
    }

    #[instrument(skip(self))]
    async fn find_expired(&self, now: DateTime<Utc>) -> RepoResult<Vec<Mute>> {
        let results = sqlx::query_as::<_, MuteModel>(
            r"
            SELECT infraction_id, guild_id, user_id, user_name, end_time
            FROM mutes
            WHERE end_time <= $1
            ORDER BY end_time ASC
            ",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Mute::from).collect())
    }

    /// The unique `(guild_id, user_id)` constraint makes a new mute replace the old one
    #[instrument(skip(self, mute), fields(guild_id = %mute.guild_id, user_id = %mute.user.id))]
    async fn create(&self, mute: &Mute) -> RepoResult<()> {
        let row = MuteRow::new(mute);

        sqlx::query(
            r"
            INSERT INTO mutes (infraction_id, guild_id, user_id, user_name, end_time)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (guild_id, user_id) DO UPDATE SET
                infraction_id = EXCLUDED.infraction_id,
                user_name = EXCLUDED.user_name,
                end_time = EXCLUDED.end_time
            ",
        )
        .bind(row.infraction_id)
        .bind(row.guild_id)
        .bind(row.user_id)
        .bind(row.user_name)
        .bind(mute.end_time)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, infraction_id: InfractionId) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM mutes WHERE infraction_id = $1")
            .bind(infraction_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_for_member(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM mutes WHERE guild_id = $1 AND user_id = $2")
            .bind(guild_id.into_inner())
            .bind(user_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
