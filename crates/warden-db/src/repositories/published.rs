//! PostgreSQL implementation of PublishedMessageRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use warden_core::entities::{PublishType, PublishedMessage};
use warden_core::traits::{PublishedMessageRepository, RepoResult};
use warden_core::value_objects::InfractionId;

use crate::models::PublishedMessageModel;

use super::error::map_db_error;

/// PostgreSQL implementation of PublishedMessageRepository
#[derive(Clone)]
pub struct PgPublishedMessageRepository {
    pool: PgPool,
}

impl PgPublishedMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PublishedMessageRepository for PgPublishedMessageRepository {
    #[instrument(skip(self))]
    async fn find(
        &self,
        infraction_id: InfractionId,
        publish_type: PublishType,
    ) -> RepoResult<Option<PublishedMessage>> {
        let result = sqlx::query_as::<_, PublishedMessageModel>(
            r"
            SELECT infraction_id, publish_type, channel_id, message_id
            FROM published_messages
            WHERE infraction_id = $1 AND publish_type = $2
            ",
        )
        .bind(infraction_id.into_inner())
        .bind(publish_type.code())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(PublishedMessage::try_from).transpose()
    }

    #[instrument(skip(self, message), fields(infraction_id = %message.infraction_id))]
    async fn save(&self, message: &PublishedMessage) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO published_messages (infraction_id, publish_type, channel_id, message_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (infraction_id, publish_type) DO UPDATE SET
                channel_id = EXCLUDED.channel_id,
                message_id = EXCLUDED.message_id
            ",
        )
        .bind(message.infraction_id.into_inner())
        .bind(message.publish_type.code())
        .bind(message.channel_id.into_inner())
        .bind(message.message_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(
        &self,
        infraction_id: InfractionId,
        publish_type: PublishType,
    ) -> RepoResult<bool> {
        let result = sqlx::query(
            "DELETE FROM published_messages WHERE infraction_id = $1 AND publish_type = $2",
        )
        .bind(infraction_id.into_inner())
        .bind(publish_type.code())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_all(&self, infraction_id: InfractionId) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM published_messages WHERE infraction_id = $1")
            .bind(infraction_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
