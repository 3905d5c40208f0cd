//! Infraction ledger
//!
//! Owns every write to infractions, pardons and publication records. Loads
//! always return the hydrated aggregate: the infraction row plus its pardon
//! and both publications, read fresh from storage.

use chrono::{Duration, Utc};
use tracing::{debug, info, instrument, warn};

use warden_core::entities::{
    DbUser, Infraction, InfractionKind, ModActionCounts, Pardon, PublishType, PublishedMessage,
};
use warden_core::value_objects::{InfractionId, Snowflake};
use warden_core::DomainError;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::policy::PolicyService;
use super::render;

/// Outcome of editing a published message
enum Rerender {
    Updated,
    /// The message (or its guild) no longer exists
    Gone,
    Failed(String),
}

/// Ledger service
pub struct LedgerService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> LedgerService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Build an unsaved infraction stamped now; nothing is written
    pub fn create(
        &self,
        user: DbUser,
        moderator: DbUser,
        guild_id: Snowflake,
        reason: impl Into<String>,
        kind: InfractionKind,
    ) -> Infraction {
        Infraction::new(user, moderator, guild_id, reason, kind)
    }

    /// Insert an unsaved infraction, or write reason and moderator of a saved one
    #[instrument(skip(self, infraction), fields(guild_id = %infraction.guild_id, infraction_id = ?infraction.id))]
    pub async fn save(&self, infraction: &Infraction) -> ServiceResult<Infraction> {
        let id = match infraction.id {
            None => {
                let id = self.ctx.infraction_repo().insert(infraction).await?;
                info!(
                    infraction_id = %id,
                    kind = %infraction.kind,
                    user_id = %infraction.user.id,
                    "Infraction recorded"
                );
                id
            }
            Some(id) => {
                self.ctx.infraction_repo().update(infraction).await?;
                debug!(infraction_id = %id, "Infraction updated");
                id
            }
        };

        self.find_by_id(id, infraction.guild_id)
            .await?
            .ok_or_else(|| ServiceError::Domain(DomainError::InfractionNotFound(id)))
    }

    /// Guild-scoped lookup: an id from another guild is not found
    #[instrument(skip(self))]
    pub async fn find_by_id(
        &self,
        id: InfractionId,
        guild_id: Snowflake,
    ) -> ServiceResult<Option<Infraction>> {
        match self.ctx.infraction_repo().find_by_id(id, guild_id).await? {
            Some(infraction) => Ok(Some(self.hydrate(infraction).await?)),
            None => Ok(None),
        }
    }

    async fn hydrate(&self, mut infraction: Infraction) -> ServiceResult<Infraction> {
        let Some(id) = infraction.id else {
            return Ok(infraction);
        };
        infraction.pardon = self.ctx.pardon_repo().find(id).await?;
        infraction.published_ban = self.ctx.published_repo().find(id, PublishType::Ban).await?;
        infraction.published_unban = self
            .ctx
            .published_repo()
            .find(id, PublishType::Unban)
            .await?;
        Ok(infraction)
    }

    /// Forget an infraction: pardon, then publications, then the row itself
    ///
    /// Deleting an unknown id is a no-op. A running mute is not cancelled.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: InfractionId) -> ServiceResult<()> {
        self.ctx.pardon_repo().delete(id).await?;
        self.ctx.published_repo().delete_all(id).await?;
        if self.ctx.infraction_repo().delete(id).await? {
            info!(infraction_id = %id, "Infraction forgotten");
        }
        Ok(())
    }

    /// Newest BAN for the user, optionally only within a trailing window
    #[instrument(skip(self))]
    pub async fn find_recent_ban_by_id(
        &self,
        user_id: Snowflake,
        guild_id: Snowflake,
        within: Option<Duration>,
    ) -> ServiceResult<Option<Infraction>> {
        let since = within.and_then(|window| Utc::now().checked_sub_signed(window));
        match self
            .ctx
            .infraction_repo()
            .find_recent_ban(user_id, guild_id, since)
            .await?
        {
            Some(infraction) => Ok(Some(self.hydrate(infraction).await?)),
            None => Ok(None),
        }
    }

    // === History views ===

    pub async fn find_all_for_user(
        &self,
        user_id: Snowflake,
        guild_id: Snowflake,
    ) -> ServiceResult<Vec<Infraction>> {
        self.history(user_id, guild_id, None).await
    }

    pub async fn find_warns_for_user(
        &self,
        user_id: Snowflake,
        guild_id: Snowflake,
    ) -> ServiceResult<Vec<Infraction>> {
        self.history(user_id, guild_id, Some(InfractionKind::Warn)).await
    }

    pub async fn find_mutes_for_user(
        &self,
        user_id: Snowflake,
        guild_id: Snowflake,
    ) -> ServiceResult<Vec<Infraction>> {
        self.history(user_id, guild_id, Some(InfractionKind::Mute)).await
    }

    pub async fn find_bans_for_user(
        &self,
        user_id: Snowflake,
        guild_id: Snowflake,
    ) -> ServiceResult<Vec<Infraction>> {
        self.history(user_id, guild_id, Some(InfractionKind::Ban)).await
    }

    /// Infractions newer than the guild's retention cutoff, oldest first
    #[instrument(skip(self))]
    async fn history(
        &self,
        user_id: Snowflake,
        guild_id: Snowflake,
        kind: Option<InfractionKind>,
    ) -> ServiceResult<Vec<Infraction>> {
        let settings = PolicyService::new(self.ctx).resolve(guild_id).await?;
        let cutoff = settings.infraction_expired_time(Utc::now());

        let rows = self
            .ctx
            .infraction_repo()
            .find_for_user(user_id, guild_id, kind, cutoff)
            .await?;

        let mut infractions = Vec::with_capacity(rows.len());
        for row in rows {
            infractions.push(self.hydrate(row).await?);
        }
        Ok(infractions)
    }

    #[instrument(skip(self))]
    pub async fn find_mod_actions(
        &self,
        moderator_id: Snowflake,
        guild_id: Snowflake,
    ) -> ServiceResult<ModActionCounts> {
        Ok(self
            .ctx
            .infraction_repo()
            .count_by_moderator(moderator_id, guild_id)
            .await?)
    }

    // === Pardons ===

    /// Pardon a warn or mute; bans are only pardoned by unbanning
    #[instrument(skip(self, infraction, moderator), fields(infraction_id = ?infraction.id))]
    pub async fn pardon(
        &self,
        infraction: &Infraction,
        moderator: &DbUser,
        reason: Option<String>,
    ) -> ServiceResult<Infraction> {
        if !infraction.can_be_pardoned_directly() {
            return Err(ServiceError::invalid_operation(
                "Cannot pardon bans, please use unban",
            ));
        }
        self.apply_pardon(infraction, moderator, reason).await
    }

    /// The unban path: pardon a BAN and refresh its published unban
    #[instrument(skip(self, infraction, moderator), fields(infraction_id = ?infraction.id))]
    pub async fn pardon_ban(
        &self,
        infraction: &Infraction,
        moderator: &DbUser,
        reason: Option<String>,
    ) -> ServiceResult<Infraction> {
        if infraction.kind != InfractionKind::Ban {
            return Err(ServiceError::invalid_operation(
                "Only bans are pardoned by unbanning",
            ));
        }
        self.apply_pardon(infraction, moderator, reason).await
    }

    async fn apply_pardon(
        &self,
        infraction: &Infraction,
        moderator: &DbUser,
        reason: Option<String>,
    ) -> ServiceResult<Infraction> {
        let id = infraction
            .id
            .ok_or_else(|| ServiceError::invalid_operation("Infraction has not been saved"))?;

        self.ctx
            .pardon_repo()
            .save(&Pardon::new(id, moderator.clone(), reason))
            .await?;
        info!(infraction_id = %id, moderator_id = %moderator.id, "Infraction pardoned");

        let refreshed = self
            .find_by_id(id, infraction.guild_id)
            .await?
            .ok_or(DomainError::InfractionNotFound(id))?;
        Ok(self
            .refresh_publications(refreshed, &[PublishType::Unban])
            .await)
    }

    // === Reasons and publications ===

    /// Change the reason, optionally attributing it to a new moderator
    ///
    /// Published messages are re-rendered afterwards. A message that is gone
    /// has its record purged; re-render failures never reach the caller.
    #[instrument(skip(self, infraction, reason, moderator), fields(infraction_id = ?infraction.id))]
    pub async fn update_reason(
        &self,
        infraction: &Infraction,
        reason: impl Into<String>,
        moderator: Option<&DbUser>,
    ) -> ServiceResult<Infraction> {
        let mut updated = infraction.clone();
        updated.reason = reason.into();
        if let Some(moderator) = moderator {
            updated.moderator = moderator.clone();
        }

        let saved = self.save(&updated).await?;
        Ok(self
            .refresh_publications(saved, &[PublishType::Ban, PublishType::Unban])
            .await)
    }

    /// Post the announcement and record where it went, replacing any earlier one
    #[instrument(skip(self, infraction), fields(infraction_id = ?infraction.id))]
    pub async fn publish(
        &self,
        infraction: &Infraction,
        channel_id: Snowflake,
        publish_type: PublishType,
    ) -> ServiceResult<PublishedMessage> {
        if !infraction.can_publish(publish_type) {
            return Err(ServiceError::invalid_operation(match publish_type {
                PublishType::Ban => "Only bans can be published",
                PublishType::Unban => "Only a pardoned ban can have its unban published",
            }));
        }
        let id = infraction
            .id
            .ok_or_else(|| ServiceError::invalid_operation("Infraction has not been saved"))?;

        let actor = self.ctx.actor();
        let guild = actor
            .resolve_guild(infraction.guild_id)
            .await?
            .ok_or(DomainError::GuildNotFound(infraction.guild_id))?;
        let message_id = actor
            .post_message(
                &guild,
                channel_id,
                &render::publication(infraction, publish_type),
            )
            .await?;

        let record = PublishedMessage {
            infraction_id: id,
            channel_id,
            message_id,
            publish_type,
        };
        self.ctx.published_repo().save(&record).await?;
        info!(infraction_id = %id, publish_type = publish_type.as_str(), "Infraction published");
        Ok(record)
    }

    async fn refresh_publications(
        &self,
        mut infraction: Infraction,
        types: &[PublishType],
    ) -> Infraction {
        for &publish_type in types {
            let Some(published) = infraction.publication(publish_type).cloned() else {
                continue;
            };
            match self.rerender(&infraction, &published).await {
                Rerender::Updated => {}
                Rerender::Gone => {
                    if let Err(e) = self
                        .ctx
                        .published_repo()
                        .delete(published.infraction_id, publish_type)
                        .await
                    {
                        warn!(error = %e, "Failed to purge stale publication record");
                    }
                    info!(
                        infraction_id = %published.infraction_id,
                        publish_type = publish_type.as_str(),
                        "Published message is gone, record purged"
                    );
                    infraction.set_publication(publish_type, None);
                }
                Rerender::Failed(error) => {
                    warn!(
                        infraction_id = %published.infraction_id,
                        publish_type = publish_type.as_str(),
                        error = %error,
                        "Could not re-render published message"
                    );
                }
            }
        }
        infraction
    }

    async fn rerender(&self, infraction: &Infraction, published: &PublishedMessage) -> Rerender {
        let actor = self.ctx.actor();
        let guild = match actor.resolve_guild(infraction.guild_id).await {
            Ok(Some(guild)) => guild,
            Ok(None) => return Rerender::Gone,
            Err(e) if e.is_not_found() => return Rerender::Gone,
            Err(e) => return Rerender::Failed(e.to_string()),
        };

        let message = render::publication(infraction, published.publish_type);
        match actor
            .edit_message(&guild, published.channel_id, published.message_id, &message)
            .await
        {
            Ok(()) => Rerender::Updated,
            Err(e) if e.is_not_found() => Rerender::Gone,
            Err(e) => Rerender::Failed(e.to_string()),
        }
    }
}
