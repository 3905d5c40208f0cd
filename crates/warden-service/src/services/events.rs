//! Platform event handling
//!
//! Reconciles the ledger with things that happened on the platform: bans
//! issued from the client, unbans, guilds coming online and members
//! rejoining while muted.

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use warden_core::entities::{DbUser, InfractionKind};
use warden_core::events::PlatformEvent;
use warden_core::traits::{LogMessage, LogSeverity};
use warden_core::value_objects::{InfractionId, Snowflake};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::ledger::LedgerService;
use super::policy::PolicyService;
use super::render;

/// Event service
pub struct EventService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> EventService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Route an event to its handler
    #[instrument(skip(self, event), fields(event_type = event.event_type(), guild_id = %event.guild_id()))]
    pub async fn dispatch(&self, event: &PlatformEvent) -> ServiceResult<()> {
        match event {
            PlatformEvent::GuildAvailable { guild_id } => {
                self.on_guild_available(*guild_id).await?;
            }
            PlatformEvent::MemberBanned { guild_id, user } => {
                self.on_member_banned(*guild_id, user).await?;
            }
            PlatformEvent::MemberUnbanned { guild_id, user } => {
                self.on_member_unbanned(*guild_id, user).await?;
            }
            PlatformEvent::MemberJoined { guild_id, user } => {
                self.on_member_joined(*guild_id, user).await?;
            }
        }
        Ok(())
    }

    /// Parse a gateway payload and dispatch it
    pub async fn dispatch_json(&self, payload: &str) -> ServiceResult<()> {
        let event: PlatformEvent = serde_json::from_str(payload)
            .map_err(|e| ServiceError::validation(format!("Invalid event payload: {e}")))?;
        self.dispatch(&event).await
    }

    pub async fn on_guild_available(&self, guild_id: Snowflake) -> ServiceResult<()> {
        PolicyService::new(self.ctx).ensure(guild_id).await?;
        Ok(())
    }

    /// Record a ban issued outside the bot
    ///
    /// Waits for the settle delay so a ban issued through the bot has its
    /// infraction committed first; a recent enough BAN is then treated as
    /// the same ban. Returns whether a new infraction was recorded.
    pub async fn on_member_banned(&self, guild_id: Snowflake, user: &DbUser) -> ServiceResult<bool> {
        tokio::time::sleep(self.ctx.ban_settle_delay()).await;

        let ledger = LedgerService::new(self.ctx);
        if let Some(existing) = ledger
            .find_recent_ban_by_id(user.id, guild_id, self.ctx.ban_dedup_window())
            .await?
        {
            debug!(infraction_id = ?existing.id, user_id = %user.id, "Ban already recorded");
            return Ok(false);
        }

        let infraction = ledger
            .save(&ledger.create(
                user.clone(),
                DbUser::unknown(),
                guild_id,
                "",
                InfractionKind::Ban,
            ))
            .await?;
        info!(infraction_id = ?infraction.id, user_id = %user.id, "Recorded ban issued outside the bot");

        PolicyService::new(self.ctx)
            .post_mod_log(guild_id, &render::ban_log(&infraction))
            .await;
        Ok(true)
    }

    /// Pardon the newest ban of a user unbanned on the platform
    ///
    /// Returns whether a ban was pardoned. An unban with no recorded ban,
    /// or one already pardoned by the unban command, changes nothing.
    pub async fn on_member_unbanned(
        &self,
        guild_id: Snowflake,
        user: &DbUser,
    ) -> ServiceResult<bool> {
        tokio::time::sleep(self.ctx.ban_settle_delay()).await;

        let ledger = LedgerService::new(self.ctx);
        let Some(ban) = ledger.find_recent_ban_by_id(user.id, guild_id, None).await? else {
            debug!(user_id = %user.id, "Unban with no recorded ban");
            return Ok(false);
        };
        if ban.is_pardoned() {
            debug!(infraction_id = ?ban.id, "Ban already pardoned");
            return Ok(false);
        }

        let pardoned = ledger.pardon_ban(&ban, &DbUser::unknown(), None).await?;
        info!(infraction_id = ?pardoned.id, user_id = %user.id, "Pardoned ban lifted outside the bot");

        PolicyService::new(self.ctx)
            .post_mod_log(
                guild_id,
                &LogMessage::new(
                    format!("{} (ID {}) was unbanned", user.name, user.id),
                    LogSeverity::Automatic,
                )
                .with_footer(format!("Infraction {}", id_label(pardoned.id))),
            )
            .await;
        Ok(true)
    }

    /// Re-apply the mute role to a member rejoining during a mute
    ///
    /// Returns whether the role was applied.
    pub async fn on_member_joined(&self, guild_id: Snowflake, user: &DbUser) -> ServiceResult<bool> {
        let Some(mute) = self
            .ctx
            .mute_repo()
            .find_active(guild_id, user.id, Utc::now())
            .await?
        else {
            return Ok(false);
        };

        let settings = PolicyService::new(self.ctx).resolve(guild_id).await?;
        let Some(role_id) = settings.mute_role else {
            warn!(guild_id = %guild_id, "Muted member rejoined but no mute role is configured");
            return Ok(false);
        };

        let actor = self.ctx.actor();
        let Some(guild) = actor.resolve_guild(guild_id).await? else {
            return Ok(false);
        };
        let (Some(role), Some(member)) = (
            actor.resolve_role(&guild, role_id).await?,
            actor.resolve_member(&guild, user.id).await?,
        ) else {
            warn!(guild_id = %guild_id, user_id = %user.id, "Could not resolve mute role or member");
            return Ok(false);
        };

        actor.set_member_role(&member, &role, true).await?;
        info!(
            infraction_id = %mute.infraction_id,
            user_id = %user.id,
            "Re-applied mute to rejoining member"
        );
        Ok(true)
    }
}

fn id_label(id: Option<InfractionId>) -> String {
    id.map_or_else(|| "unsaved".to_string(), |id| id.to_string())
}
