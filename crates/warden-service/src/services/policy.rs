//! Guild policy resolver
//!
//! Per-guild settings: where to log, which role mutes, how long history
//! stays visible. Missing settings degrade to first-contact defaults.

use tracing::{debug, info, instrument, warn};

use warden_core::entities::GuildSettings;
use warden_core::traits::{LogMessage, LogSeverity};
use warden_core::value_objects::{DurationType, Snowflake, Subject};
use warden_core::DomainError;

use crate::dto::ActingModerator;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::render;

/// Policy service
pub struct PolicyService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PolicyService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, guild_id: Snowflake) -> ServiceResult<Option<GuildSettings>> {
        Ok(self.ctx.guild_repo().find_by_id(guild_id).await?)
    }

    /// Validate and upsert
    #[instrument(skip(self, settings), fields(guild_id = %settings.id))]
    pub async fn save(&self, settings: &GuildSettings) -> ServiceResult<GuildSettings> {
        settings.validate()?;
        self.ctx.guild_repo().save(settings).await?;
        Ok(settings.clone())
    }

    /// Stored settings, or first-contact defaults without writing them
    #[instrument(skip(self))]
    pub async fn resolve(&self, guild_id: Snowflake) -> ServiceResult<GuildSettings> {
        Ok(self
            .find_by_id(guild_id)
            .await?
            .unwrap_or_else(|| GuildSettings::new(guild_id)))
    }

    /// Insert defaults for a guild seen for the first time
    #[instrument(skip(self))]
    pub async fn ensure(&self, guild_id: Snowflake) -> ServiceResult<GuildSettings> {
        if let Some(settings) = self.find_by_id(guild_id).await? {
            return Ok(settings);
        }
        let settings = self.save(&GuildSettings::new(guild_id)).await?;
        info!(guild_id = %guild_id, "Created default settings for new guild");
        Ok(settings)
    }

    // === Setters ===

    #[instrument(skip(self, moderator))]
    pub async fn set_mod_log(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        channel_id: Snowflake,
    ) -> ServiceResult<GuildSettings> {
        moderator.require(&Subject::Guild(guild_id))?;
        let mut settings = self.resolve(guild_id).await?;
        settings.mod_log_channel = Some(channel_id);
        let settings = self.save(&settings).await?;

        self.post_mod_log(
            guild_id,
            &LogMessage::new(
                format!(
                    "{} updated mod log channel to {}",
                    moderator.user.name,
                    render::channel_mention(channel_id)
                ),
                LogSeverity::Automatic,
            ),
        )
        .await;
        Ok(settings)
    }

    #[instrument(skip(self, moderator))]
    pub async fn set_public_log(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        channel_id: Snowflake,
    ) -> ServiceResult<GuildSettings> {
        moderator.require(&Subject::Guild(guild_id))?;
        let mut settings = self.resolve(guild_id).await?;
        settings.public_log_channel = Some(channel_id);
        let settings = self.save(&settings).await?;

        self.post_mod_log(
            guild_id,
            &LogMessage::new(
                format!(
                    "{} updated public log channel to {}",
                    moderator.user.name,
                    render::channel_mention(channel_id)
                ),
                LogSeverity::Automatic,
            ),
        )
        .await;
        Ok(settings)
    }

    /// Point muting at an existing role
    #[instrument(skip(self, moderator))]
    pub async fn set_mute_role(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        role_id: Snowflake,
    ) -> ServiceResult<GuildSettings> {
        moderator.require(&Subject::Guild(guild_id))?;

        let actor = self.ctx.actor();
        let guild = actor
            .resolve_guild(guild_id)
            .await?
            .ok_or(DomainError::GuildNotFound(guild_id))?;
        let role = actor
            .resolve_role(&guild, role_id)
            .await?
            .ok_or(DomainError::RoleNotFound(role_id))?;
        if role.is_everyone() {
            return Err(ServiceError::invalid_operation(
                "The @everyone role cannot be used for muting",
            ));
        }

        let mut settings = self.resolve(guild_id).await?;
        settings.mute_role = Some(role.id);
        let settings = self.save(&settings).await?;

        self.post_mod_log(
            guild_id,
            &LogMessage::new(
                format!("{} updated mute role to {}", moderator.user.name, role.name),
                LogSeverity::Automatic,
            ),
        )
        .await;
        Ok(settings)
    }

    /// Change how long infractions stay visible in history views
    #[instrument(skip(self, moderator))]
    pub async fn set_retention(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        duration_type: DurationType,
        duration: u32,
    ) -> ServiceResult<GuildSettings> {
        moderator.require(&Subject::Guild(guild_id))?;

        let mut settings = self.resolve(guild_id).await?;
        settings.duration_type = duration_type;
        settings.duration = duration;
        let settings = self.save(&settings).await?;

        self.post_mod_log(
            guild_id,
            &LogMessage::new(
                format!(
                    "{} updated auto pardon to {}{}",
                    moderator.user.name,
                    duration,
                    duration_type.suffix()
                ),
                LogSeverity::Automatic,
            ),
        )
        .await;
        Ok(settings)
    }

    // === Logging ===

    /// Post to the guild's mod log; every failure is logged and swallowed
    #[instrument(skip(self, message))]
    pub async fn post_mod_log(&self, guild_id: Snowflake, message: &LogMessage) {
        let settings = match self.find_by_id(guild_id).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(guild_id = %guild_id, error = %e, "Could not read settings for mod log");
                return;
            }
        };
        let Some(channel_id) = settings.and_then(|s| s.mod_log_channel) else {
            debug!(guild_id = %guild_id, "No mod log channel configured");
            return;
        };

        let actor = self.ctx.actor();
        let guild = match actor.resolve_guild(guild_id).await {
            Ok(Some(guild)) => guild,
            Ok(None) => {
                debug!(guild_id = %guild_id, "Guild unavailable for mod log");
                return;
            }
            Err(e) => {
                warn!(guild_id = %guild_id, error = %e, "Could not resolve guild for mod log");
                return;
            }
        };

        if let Err(e) = actor.post_message(&guild, channel_id, message).await {
            warn!(
                guild_id = %guild_id,
                channel_id = %channel_id,
                error = %e,
                "Failed to post mod log entry"
            );
        }
    }
}
