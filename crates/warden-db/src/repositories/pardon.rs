//! PostgreSQL implementation of PardonRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warden_core::entities::Pardon;
use warden_core::traits::{PardonRepository, RepoResult};
use warden_core::value_objects::InfractionId;

use crate::mappers::PardonRow;
use crate::models::PardonModel;

use super::error::map_db_error;

/// PostgreSQL implementation of PardonRepository
#[derive(Clone)]
pub struct PgPardonRepository {
    pool: PgPool,
}

impl PgPardonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PardonRepository for PgPardonRepository {
    #[instrument(skip(self))]
    async fn find(&self, infraction_id: InfractionId) -> RepoResult<Option<Pardon>> {
        let result = sqlx::query_as::<_, PardonModel>(
            r"
            SELECT infraction_id, moderator_id, moderator_name, pardon_on, reason
            FROM pardons
            WHERE infraction_id = $1
            ",
        )
        .bind(infraction_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Pardon::from))
    }

    /// A second pardon keeps the original moderator and date
    #[instrument(skip(self, pardon), fields(infraction_id = %pardon.infraction_id))]
    async fn save(&self, pardon: &Pardon) -> RepoResult<()> {
        let row = PardonRow::new(pardon);

        sqlx::query(
            r"
            INSERT INTO pardons (infraction_id, moderator_id, moderator_name, pardon_on, reason)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (infraction_id) DO UPDATE SET reason = EXCLUDED.reason
            ",
        )
        .bind(row.infraction_id)
        .bind(row.moderator_id)
        .bind(row.moderator_name)
        .bind(pardon.pardon_on)
        .bind(row.reason)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, infraction_id: InfractionId) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM pardons WHERE infraction_id = $1")
            .bind(infraction_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
