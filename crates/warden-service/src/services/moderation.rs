//! Moderation commands
//!
//! Presentation-free versions of the moderator commands. Each one records
//! through the ledger first, then applies the platform effect, and rolls the
//! record back if the platform refuses. Multi-subject commands report per
//! subject; one failure never stops the rest.

use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};

use warden_core::entities::{DbUser, Infraction, InfractionKind, Lock, Mute, PublishType, PublishedMessage};
use warden_core::traits::{GuildHandle, LogMessage, LogSeverity, MemberHandle, RoleHandle};
use warden_core::value_objects::{InfractionId, Snowflake, Subject};
use warden_core::DomainError;

use crate::dto::{ActingModerator, BatchOutcome};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::ledger::LedgerService;
use super::policy::PolicyService;
use super::render;

/// Moderation service
pub struct ModerationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ModerationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    fn ledger(&self) -> LedgerService<'a> {
        LedgerService::new(self.ctx)
    }

    fn policy(&self) -> PolicyService<'a> {
        PolicyService::new(self.ctx)
    }

    async fn guild(&self, guild_id: Snowflake) -> ServiceResult<GuildHandle> {
        Ok(self
            .ctx
            .actor()
            .resolve_guild(guild_id)
            .await?
            .ok_or(DomainError::GuildNotFound(guild_id))?)
    }

    /// The configured mute role, or a rejection the moderator can act on
    async fn mute_role(&self, guild: &GuildHandle) -> ServiceResult<RoleHandle> {
        let settings = self.policy().resolve(guild.id).await?;
        let role_id = settings.mute_role.ok_or_else(|| {
            ServiceError::invalid_operation("No mute role is configured for this guild")
        })?;
        self.ctx
            .actor()
            .resolve_role(guild, role_id)
            .await?
            .ok_or_else(|| ServiceError::invalid_operation("The configured mute role no longer exists"))
    }

    async fn log(&self, guild_id: Snowflake, message: LogMessage) {
        self.policy().post_mod_log(guild_id, &message).await;
    }

    // === Warns ===

    #[instrument(skip(self, moderator, members), fields(moderator_id = %moderator.user.id, count = members.len()))]
    pub async fn warn(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        members: &[MemberHandle],
        reason: &str,
    ) -> ServiceResult<BatchOutcome<Infraction>> {
        let ledger = self.ledger();
        let mut outcome = BatchOutcome::new();

        for member in members {
            let subject = render::user_mention(member.user_id);
            if let Err(e) = moderator.require(&Subject::Member(member.user_id)) {
                outcome.fail(subject, &e);
                continue;
            }
            let infraction = ledger.create(
                member_user(member),
                moderator.user.clone(),
                guild_id,
                reason,
                InfractionKind::Warn,
            );
            match ledger.save(&infraction).await {
                Ok(saved) => outcome.succeed(saved),
                Err(e) => outcome.fail(subject, &e),
            }
        }

        if outcome.has_successes() {
            let mentions = mentions(outcome.succeeded.iter().map(|i| i.user.id));
            self.log(
                guild_id,
                LogMessage::new(
                    format!(
                        "{} warned {mentions} for {}",
                        moderator.user.name,
                        render::reason_or_default(reason)
                    ),
                    LogSeverity::Caution,
                ),
            )
            .await;
        }
        Ok(outcome)
    }

    // === Mutes ===

    /// Mute members for `duration`; a member's previous mute is superseded
    #[instrument(skip(self, moderator, members), fields(moderator_id = %moderator.user.id, count = members.len()))]
    pub async fn mute(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        members: &[MemberHandle],
        duration: Duration,
        reason: &str,
    ) -> ServiceResult<BatchOutcome<Mute>> {
        if duration <= Duration::zero() {
            return Err(ServiceError::validation("Mute duration must be positive"));
        }
        let guild = self.guild(guild_id).await?;
        let role = self.mute_role(&guild).await?;

        let mut outcome = BatchOutcome::new();
        for member in members {
            let subject = render::user_mention(member.user_id);
            if let Err(e) = moderator.require(&Subject::Member(member.user_id)) {
                outcome.fail(subject, &e);
                continue;
            }
            match self.mute_one(moderator, member, &role, duration, reason).await {
                Ok(mute) => outcome.succeed(mute),
                Err(e) => {
                    warn!(user_id = %member.user_id, error = %e, "Mute failed");
                    outcome.fail(subject, &e);
                }
            }
        }

        if outcome.has_successes() {
            let mentions = mentions(outcome.succeeded.iter().map(|m| m.user.id));
            self.log(
                guild_id,
                LogMessage::new(
                    format!(
                        "{} muted {mentions} for {}",
                        moderator.user.name,
                        render::reason_or_default(reason)
                    ),
                    LogSeverity::Bad,
                ),
            )
            .await;
        }
        Ok(outcome)
    }

    async fn mute_one(
        &self,
        moderator: &ActingModerator,
        member: &MemberHandle,
        role: &RoleHandle,
        duration: Duration,
        reason: &str,
    ) -> ServiceResult<Mute> {
        let ledger = self.ledger();
        let mutes = self.ctx.mute_repo();
        let end_time = Utc::now()
            .checked_add_signed(duration)
            .ok_or_else(|| ServiceError::validation("Mute duration is too long"))?;

        // Replaced by `create`, restored if the new mute cannot be applied
        let previous = mutes
            .find_for_member(member.guild_id, member.user_id)
            .await?;

        let infraction = ledger
            .save(&ledger.create(
                member_user(member),
                moderator.user.clone(),
                member.guild_id,
                reason,
                InfractionKind::Mute,
            ))
            .await?;
        let id = infraction
            .id
            .ok_or_else(|| ServiceError::internal("saved infraction has no id"))?;

        let mute = Mute {
            infraction_id: id,
            guild_id: member.guild_id,
            user: infraction.user.clone(),
            end_time,
        };
        if let Err(e) = mutes.create(&mute).await {
            self.rollback(id, false).await;
            return Err(e.into());
        }

        if let Err(e) = self.ctx.actor().set_member_role(member, role, true).await {
            self.rollback(id, true).await;
            if let Some(previous) = &previous {
                if let Err(restore) = mutes.create(previous).await {
                    warn!(
                        infraction_id = %previous.infraction_id,
                        error = %restore,
                        "Rollback could not restore superseded mute"
                    );
                }
            }
            return Err(e.into());
        }

        info!(infraction_id = %id, user_id = %member.user_id, %end_time, "Member muted");
        Ok(mute)
    }

    /// Undo a half-applied sanction; failures here are only logged
    async fn rollback(&self, id: InfractionId, mute_row: bool) {
        if mute_row {
            if let Err(e) = self.ctx.mute_repo().delete(id).await {
                warn!(infraction_id = %id, error = %e, "Rollback could not delete mute row");
            }
        }
        if let Err(e) = self.ledger().delete(id).await {
            warn!(infraction_id = %id, error = %e, "Rollback could not delete infraction");
        }
    }

    /// Lift mutes; a member without the role counts as unmuted
    #[instrument(skip(self, moderator, members), fields(moderator_id = %moderator.user.id, count = members.len()))]
    pub async fn unmute(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        members: &[MemberHandle],
    ) -> ServiceResult<BatchOutcome<Snowflake>> {
        let guild = self.guild(guild_id).await?;
        let role = self.mute_role(&guild).await?;

        let mut outcome = BatchOutcome::new();
        for member in members {
            let subject = render::user_mention(member.user_id);
            if let Err(e) = moderator.require(&Subject::Member(member.user_id)) {
                outcome.fail(subject, &e);
                continue;
            }
            if let Err(e) = self
                .ctx
                .mute_repo()
                .delete_for_member(guild_id, member.user_id)
                .await
            {
                outcome.fail(subject, &ServiceError::from(e));
                continue;
            }
            match self.ctx.actor().set_member_role(member, &role, false).await {
                Ok(()) => outcome.succeed(member.user_id),
                Err(e) => outcome.fail(subject, &ServiceError::from(e)),
            }
        }

        if outcome.has_successes() {
            let mentions = mentions(outcome.succeeded.iter().copied());
            self.log(
                guild_id,
                LogMessage::new(
                    format!("{} unmuted {mentions}", moderator.user.name),
                    LogSeverity::Automatic,
                ),
            )
            .await;
        }
        Ok(outcome)
    }

    // === Bans ===

    #[instrument(skip(self, moderator, user), fields(moderator_id = %moderator.user.id, user_id = %user.id))]
    pub async fn ban(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        user: &DbUser,
        reason: &str,
    ) -> ServiceResult<Infraction> {
        moderator.require(&Subject::Member(user.id))?;
        let guild = self.guild(guild_id).await?;

        let ledger = self.ledger();
        let infraction = ledger
            .save(&ledger.create(
                user.clone(),
                moderator.user.clone(),
                guild_id,
                reason,
                InfractionKind::Ban,
            ))
            .await?;
        let id = infraction
            .id
            .ok_or_else(|| ServiceError::internal("saved infraction has no id"))?;

        if let Err(e) = self
            .ctx
            .actor()
            .set_ban(&guild, user.id, true, reason)
            .await
        {
            self.rollback(id, false).await;
            return Err(e.into());
        }

        self.log(guild_id, render::ban_log(&infraction)).await;
        Ok(infraction)
    }

    /// Lift a platform ban and pardon the newest ban infraction, if any
    #[instrument(skip(self, moderator, user, reason), fields(moderator_id = %moderator.user.id, user_id = %user.id))]
    pub async fn unban(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        user: &DbUser,
        reason: Option<String>,
    ) -> ServiceResult<Option<Infraction>> {
        moderator.require(&Subject::Member(user.id))?;
        let guild = self.guild(guild_id).await?;

        self.ctx
            .actor()
            .set_ban(&guild, user.id, false, reason.as_deref().unwrap_or(""))
            .await?;

        let ledger = self.ledger();
        let pardoned = match ledger.find_recent_ban_by_id(user.id, guild_id, None).await? {
            Some(ban) => Some(ledger.pardon_ban(&ban, &moderator.user, reason).await?),
            None => None,
        };

        self.log(
            guild_id,
            LogMessage::new(
                format!(
                    "{} unbanned {} (ID {})",
                    moderator.user.name, user.name, user.id
                ),
                LogSeverity::Good,
            ),
        )
        .await;
        Ok(pardoned)
    }

    // === Locks ===

    /// Stop `@everyone` from sending in a channel until `duration` elapses
    #[instrument(skip(self, moderator), fields(moderator_id = %moderator.user.id))]
    pub async fn lock(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        channel_id: Snowflake,
        duration: Duration,
        reason: &str,
    ) -> ServiceResult<Lock> {
        moderator.require(&Subject::Channel(channel_id))?;
        if duration <= Duration::zero() {
            return Err(ServiceError::validation("Lock duration must be positive"));
        }
        let end_time = Utc::now()
            .checked_add_signed(duration)
            .ok_or_else(|| ServiceError::validation("Lock duration is too long"))?;

        let actor = self.ctx.actor();
        let guild = self.guild(guild_id).await?;
        let channel = actor
            .resolve_channel(&guild, channel_id)
            .await?
            .ok_or(DomainError::ChannelNotFound(channel_id))?;
        let everyone = actor
            .resolve_role(&guild, guild.id)
            .await?
            .ok_or(DomainError::RoleNotFound(guild.id))?;

        let locks = self.ctx.lock_repo();
        let existing = locks.find(channel_id).await?;
        let previous_value = actor.channel_send_permission(&channel, &everyone).await?;

        let requested = Lock {
            channel_id,
            previous_value,
            moderator: moderator.user.clone(),
            guild_id,
            reason: reason.to_string(),
            end_time,
        };
        locks.save(&requested).await?;

        if let Err(e) = actor
            .set_channel_send_permission(&channel, &everyone, false)
            .await
        {
            let restored = match &existing {
                Some(lock) => locks.save(lock).await,
                None => locks.delete(channel_id).await.map(|_| ()),
            };
            if let Err(e) = restored {
                warn!(channel_id = %channel_id, error = %e, "Rollback could not restore lock");
            }
            return Err(e.into());
        }

        self.log(
            guild_id,
            LogMessage::new(
                format!(
                    "{} locked {} for {} for {}",
                    moderator.user.name,
                    channel.mention(),
                    format_duration(duration),
                    render::reason_or_default(reason)
                ),
                LogSeverity::Caution,
            ),
        )
        .await;

        Ok(locks.find(channel_id).await?.unwrap_or(requested))
    }

    /// Restore the channel's send permission and delete the lock
    #[instrument(skip(self, moderator), fields(moderator_id = %moderator.user.id))]
    pub async fn unlock(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        channel_id: Snowflake,
    ) -> ServiceResult<Lock> {
        moderator.require(&Subject::Channel(channel_id))?;

        let locks = self.ctx.lock_repo();
        let lock = locks
            .find(channel_id)
            .await?
            .filter(|lock| lock.guild_id == guild_id)
            .ok_or(DomainError::LockNotFound(channel_id))?;

        let actor = self.ctx.actor();
        let guild = self.guild(guild_id).await?;
        let channel = actor
            .resolve_channel(&guild, channel_id)
            .await?
            .ok_or(DomainError::ChannelNotFound(channel_id))?;
        let everyone = actor
            .resolve_role(&guild, guild.id)
            .await?
            .ok_or(DomainError::RoleNotFound(guild.id))?;

        actor
            .set_channel_send_permission(&channel, &everyone, lock.previous_value)
            .await?;
        locks.delete(channel_id).await?;

        self.log(
            guild_id,
            LogMessage::new(
                format!("{} unlocked {}", moderator.user.name, channel.mention()),
                LogSeverity::Good,
            ),
        )
        .await;
        Ok(lock)
    }

    // === Infraction administration ===

    async fn find_for_admin(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        id: InfractionId,
    ) -> ServiceResult<Infraction> {
        let infraction = self
            .ledger()
            .find_by_id(id, guild_id)
            .await?
            .ok_or(DomainError::InfractionNotFound(id))?;
        moderator.require(&Subject::Member(infraction.user.id))?;
        Ok(infraction)
    }

    /// Pardon warns and mutes; ban ids are rejected
    #[instrument(skip(self, moderator, reason), fields(moderator_id = %moderator.user.id))]
    pub async fn pardon(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        ids: &[InfractionId],
        reason: Option<String>,
    ) -> ServiceResult<BatchOutcome<Infraction>> {
        let ledger = self.ledger();
        let mut outcome = BatchOutcome::new();

        for &id in ids {
            let result = match self.find_for_admin(moderator, guild_id, id).await {
                Ok(infraction) => ledger.pardon(&infraction, &moderator.user, reason.clone()).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(pardoned) => outcome.succeed(pardoned),
                Err(e) => outcome.fail(id.to_string(), &e),
            }
        }

        if outcome.has_successes() {
            self.log(
                guild_id,
                LogMessage::new(
                    format!(
                        "{} pardoned {}",
                        moderator.user.name,
                        id_list(outcome.succeeded.iter().filter_map(|i| i.id))
                    ),
                    LogSeverity::Good,
                ),
            )
            .await;
        }
        Ok(outcome)
    }

    /// Permanently remove infractions with their pardons and publications
    #[instrument(skip(self, moderator), fields(moderator_id = %moderator.user.id))]
    pub async fn forget(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        ids: &[InfractionId],
    ) -> ServiceResult<BatchOutcome<InfractionId>> {
        let ledger = self.ledger();
        let mut outcome = BatchOutcome::new();

        for &id in ids {
            let result = match self.find_for_admin(moderator, guild_id, id).await {
                Ok(_) => ledger.delete(id).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(()) => outcome.succeed(id),
                Err(e) => outcome.fail(id.to_string(), &e),
            }
        }

        if outcome.has_successes() {
            self.log(
                guild_id,
                LogMessage::new(
                    format!(
                        "{} forgot {}",
                        moderator.user.name,
                        id_list(outcome.succeeded.iter().copied())
                    ),
                    LogSeverity::Caution,
                ),
            )
            .await;
        }
        Ok(outcome)
    }

    /// Set the reason of several infractions at once
    ///
    /// An infraction recorded without a known moderator is attributed to the
    /// moderator supplying the reason.
    #[instrument(skip(self, moderator, reason), fields(moderator_id = %moderator.user.id))]
    pub async fn update_reason(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        ids: &[InfractionId],
        reason: &str,
    ) -> ServiceResult<BatchOutcome<Infraction>> {
        let ledger = self.ledger();
        let mut outcome = BatchOutcome::new();

        for &id in ids {
            let result = match self.find_for_admin(moderator, guild_id, id).await {
                Ok(infraction) => {
                    let attribute = infraction
                        .moderator
                        .is_unknown()
                        .then_some(&moderator.user);
                    ledger.update_reason(&infraction, reason, attribute).await
                }
                Err(e) => Err(e),
            };
            match result {
                Ok(updated) => outcome.succeed(updated),
                Err(e) => outcome.fail(id.to_string(), &e),
            }
        }

        if outcome.has_successes() {
            self.log(
                guild_id,
                LogMessage::new(
                    format!(
                        "{} updated reason to {} for {}",
                        moderator.user.name,
                        render::reason_or_default(reason),
                        id_list(outcome.succeeded.iter().filter_map(|i| i.id))
                    ),
                    LogSeverity::Automatic,
                ),
            )
            .await;
        }
        Ok(outcome)
    }

    /// Announce a ban or unban in the guild's public log channel
    #[instrument(skip(self, moderator), fields(moderator_id = %moderator.user.id))]
    pub async fn publish(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        id: InfractionId,
        publish_type: PublishType,
    ) -> ServiceResult<PublishedMessage> {
        let infraction = self.find_for_admin(moderator, guild_id, id).await?;
        let settings = self.policy().resolve(guild_id).await?;
        let channel_id = settings.public_log_channel.ok_or_else(|| {
            ServiceError::invalid_operation("No public log channel is configured for this guild")
        })?;
        self.ledger()
            .publish(&infraction, channel_id, publish_type)
            .await
    }

    // === History ===

    /// A user's infractions inside the guild's retention window, paged
    ///
    /// `kind` narrows the view to one kind of infraction.
    #[instrument(skip(self, moderator), fields(moderator_id = %moderator.user.id))]
    pub async fn history(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        user: &DbUser,
        kind: Option<InfractionKind>,
    ) -> ServiceResult<Vec<LogMessage>> {
        moderator.require(&Subject::Member(user.id))?;
        let ledger = self.ledger();
        let (label, infractions) = match kind {
            None => ("Infractions", ledger.find_all_for_user(user.id, guild_id).await?),
            Some(InfractionKind::Warn) => ("Warnings", ledger.find_warns_for_user(user.id, guild_id).await?),
            Some(InfractionKind::Mute) => ("Mutes", ledger.find_mutes_for_user(user.id, guild_id).await?),
            Some(InfractionKind::Ban) => ("Bans", ledger.find_bans_for_user(user.id, guild_id).await?),
        };

        let title = format!("{label} for {}", user.name);
        if infractions.is_empty() {
            return Ok(vec![LogMessage::new(
                format!("No {} on record", label.to_lowercase()),
                LogSeverity::Automatic,
            )
            .with_title(title)]);
        }
        Ok(render::history(&title, &infractions))
    }

    /// Totals of actions issued by one moderator in this guild
    #[instrument(skip(self, moderator), fields(moderator_id = %moderator.user.id))]
    pub async fn mod_actions(
        &self,
        moderator: &ActingModerator,
        guild_id: Snowflake,
        subject: &DbUser,
    ) -> ServiceResult<LogMessage> {
        moderator.require(&Subject::Member(subject.id))?;
        let counts = self.ledger().find_mod_actions(subject.id, guild_id).await?;
        Ok(render::mod_actions(subject, &counts))
    }
}

fn member_user(member: &MemberHandle) -> DbUser {
    DbUser::new(member.user_id, member.name.clone())
}

fn mentions(ids: impl Iterator<Item = Snowflake>) -> String {
    ids.map(render::user_mention).collect::<Vec<_>>().join(" ")
}

fn id_list(ids: impl Iterator<Item = InfractionId>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(" ")
}

/// Compact `1d 2h 3m 4s` form, omitting zero units
fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    let parts = [
        (total / 86_400, 'd'),
        (total % 86_400 / 3_600, 'h'),
        (total % 3_600 / 60, 'm'),
        (total % 60, 's'),
    ];
    let text = parts
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| format!("{n}{unit}"))
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        "0s".to_string()
    } else {
        text
    }
}
