//! PostgreSQL implementation of InfractionRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use warden_core::entities::{Infraction, InfractionKind, ModActionCounts};
use warden_core::traits::{InfractionRepository, RepoResult};
use warden_core::value_objects::{InfractionId, Snowflake};
use warden_core::DomainError;

use crate::mappers::InfractionRow;
use crate::models::{InfractionModel, ModActionCountsModel};

use super::error::map_db_error;

const SELECT_COLUMNS: &str = r"
    SELECT id, user_id, user_name, moderator_id, moderator_name, guild_id, reason, issued_at, kind
    FROM infractions
";

/// PostgreSQL implementation of InfractionRepository
#[derive(Clone)]
pub struct PgInfractionRepository {
    pool: PgPool,
}

impl PgInfractionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InfractionRepository for PgInfractionRepository {
    #[instrument(skip(self, infraction), fields(guild_id = %infraction.guild_id, kind = %infraction.kind))]
    async fn insert(&self, infraction: &Infraction) -> RepoResult<InfractionId> {
        if infraction.is_saved() {
            return Err(DomainError::Internal(
                "insert called with an infraction that already has an id".to_string(),
            ));
        }
        let row = InfractionRow::new(infraction);

        let id = sqlx::query_scalar::<_, i64>(
            r"
            INSERT INTO infractions
                (user_id, user_name, moderator_id, moderator_name, guild_id, reason, issued_at, kind)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(row.user_id)
        .bind(row.user_name)
        .bind(row.moderator_id)
        .bind(row.moderator_name)
        .bind(row.guild_id)
        .bind(row.reason)
        .bind(infraction.issued_at)
        .bind(row.kind)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(InfractionId::new(id))
    }

    #[instrument(skip(self, infraction), fields(infraction_id = ?infraction.id))]
    async fn update(&self, infraction: &Infraction) -> RepoResult<()> {
        let id = infraction.id.ok_or_else(|| {
            DomainError::Internal("update called with an unsaved infraction".to_string())
        })?;
        let row = InfractionRow::new(infraction);

        let result = sqlx::query(
            r"
            UPDATE infractions
            SET reason = $2, moderator_id = $3, moderator_name = $4
            WHERE id = $1
            ",
        )
        .bind(id.into_inner())
        .bind(row.reason)
        .bind(row.moderator_id)
        .bind(row.moderator_name)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::InfractionNotFound(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(
        &self,
        id: InfractionId,
        guild_id: Snowflake,
    ) -> RepoResult<Option<Infraction>> {
        let query = format!("{SELECT_COLUMNS} WHERE id = $1 AND guild_id = $2");
        let result = sqlx::query_as::<_, InfractionModel>(&query)
            .bind(id.into_inner())
            .bind(guild_id.into_inner())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        result.map(Infraction::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: InfractionId) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM infractions WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn find_recent_ban(
        &self,
        user_id: Snowflake,
        guild_id: Snowflake,
        since: Option<DateTime<Utc>>,
    ) -> RepoResult<Option<Infraction>> {
        let query = format!(
            "{SELECT_COLUMNS}
            WHERE user_id = $1 AND guild_id = $2 AND kind = $3
              AND ($4::timestamptz IS NULL OR issued_at >= $4)
            ORDER BY issued_at DESC, id DESC
            LIMIT 1"
        );
        let result = sqlx::query_as::<_, InfractionModel>(&query)
            .bind(user_id.into_inner())
            .bind(guild_id.into_inner())
            .bind(InfractionKind::Ban.code())
            .bind(since)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        result.map(Infraction::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_for_user(
        &self,
        user_id: Snowflake,
        guild_id: Snowflake,
        kind: Option<InfractionKind>,
        issued_after: DateTime<Utc>,
    ) -> RepoResult<Vec<Infraction>> {
        let query = format!(
            "{SELECT_COLUMNS}
            WHERE user_id = $1 AND guild_id = $2
              AND ($3::smallint IS NULL OR kind = $3)
              AND issued_at > $4
            ORDER BY issued_at ASC, id ASC"
        );
        let results = sqlx::query_as::<_, InfractionModel>(&query)
            .bind(user_id.into_inner())
            .bind(guild_id.into_inner())
            .bind(kind.map(InfractionKind::code))
            .bind(issued_after)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        results.into_iter().map(Infraction::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn count_by_moderator(
        &self,
        moderator_id: Snowflake,
        guild_id: Snowflake,
    ) -> RepoResult<ModActionCounts> {
        let counts = sqlx::query_as::<_, ModActionCountsModel>(
            r"
            SELECT
                COUNT(*) FILTER (WHERE kind = 1) AS warns,
                COUNT(*) FILTER (WHERE kind = 2) AS mutes,
                COUNT(*) FILTER (WHERE kind = 3) AS bans
            FROM infractions
            WHERE moderator_id = $1 AND guild_id = $2
            ",
        )
        .bind(moderator_id.into_inner())
        .bind(guild_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(counts.into())
    }
}
