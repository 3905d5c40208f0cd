//! PostgreSQL implementation of GuildSettingsRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warden_core::entities::GuildSettings;
use warden_core::traits::{GuildSettingsRepository, RepoResult};
use warden_core::value_objects::Snowflake;

use crate::mappers::GuildSettingsRow;
use crate::models::GuildSettingsModel;

use super::error::map_db_error;

/// PostgreSQL implementation of GuildSettingsRepository
#[derive(Clone)]
pub struct PgGuildSettingsRepository {
    pool: PgPool,
}

impl PgGuildSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GuildSettingsRepository for PgGuildSettingsRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, guild_id: Snowflake) -> RepoResult<Option<GuildSettings>> {
        let result = sqlx::query_as::<_, GuildSettingsModel>(
            r"
            SELECT id, mod_log_channel, public_log_channel, duration_type, duration, mute_role
            FROM guilds
            WHERE id = $1
            ",
        )
        .bind(guild_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(GuildSettings::try_from).transpose()
    }

    #[instrument(skip(self, settings), fields(guild_id = %settings.id))]
    async fn save(&self, settings: &GuildSettings) -> RepoResult<()> {
        let row = GuildSettingsRow::new(settings)?;

        sqlx::query(
            r"
            INSERT INTO guilds (id, mod_log_channel, public_log_channel, duration_type, duration, mute_role)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                mod_log_channel = EXCLUDED.mod_log_channel,
                public_log_channel = EXCLUDED.public_log_channel,
                duration_type = EXCLUDED.duration_type,
                duration = EXCLUDED.duration,
                mute_role = EXCLUDED.mute_role
            ",
        )
        .bind(row.id)
        .bind(row.mod_log_channel)
        .bind(row.public_log_channel)
        .bind(row.duration_type)
        .bind(row.duration)
        .bind(row.mute_role)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, guild_id: Snowflake) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM guilds WHERE id = $1")
            .bind(guild_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
