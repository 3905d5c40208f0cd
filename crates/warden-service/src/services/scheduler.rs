//! Expiry scheduler
//!
//! A recurring sweep that reverses mutes and channel locks whose end time
//! has passed. Records are processed one at a time, each inside its own
//! timeout. A record that cannot be reversed because its guild, role or
//! channel is gone is dropped; one that times out or hits a storage error
//! stays in place for the next tick.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use warden_common::SchedulerSettings;
use warden_core::entities::{Lock, Mute};
use warden_core::traits::{LogMessage, LogSeverity};

use crate::dto::SweepReport;

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::policy::PolicyService;
use super::render;

/// How a single record left the sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reversal {
    Reversed,
    Dropped,
}

/// Periodic expiry sweep over mutes and locks
pub struct Scheduler {
    ctx: Arc<ServiceContext>,
    settings: SchedulerSettings,
}

impl Scheduler {
    pub fn new(ctx: Arc<ServiceContext>, settings: SchedulerSettings) -> Self {
        Self { ctx, settings }
    }

    /// Run one sweep over everything due at `now`
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        self.sweep_until(now, None).await
    }

    /// Sweep, stopping between records once `shutdown` flips to true
    #[instrument(skip(self, shutdown))]
    async fn sweep_until(
        &self,
        now: DateTime<Utc>,
        shutdown: Option<&watch::Receiver<bool>>,
    ) -> SweepReport {
        let stopping = || shutdown.is_some_and(|rx| *rx.borrow());
        let timeout = self.settings.reversal_timeout();
        let mut report = SweepReport::default();

        match self.ctx.mute_repo().find_expired(now).await {
            Ok(mutes) => {
                for mute in mutes {
                    if stopping() {
                        return report;
                    }
                    match tokio::time::timeout(timeout, self.reverse_mute(&mute)).await {
                        Ok(Ok(Reversal::Reversed)) => report.mutes_reversed += 1,
                        Ok(Ok(Reversal::Dropped)) => report.mutes_dropped += 1,
                        Ok(Err(e)) => {
                            error!(infraction_id = %mute.infraction_id, error = %e, "Mute reversal failed, retrying next tick");
                            report.deferred += 1;
                        }
                        Err(_) => {
                            warn!(infraction_id = %mute.infraction_id, ?timeout, "Mute reversal timed out, retrying next tick");
                            report.deferred += 1;
                        }
                    }
                }
            }
            Err(e) => error!(error = %e, "Failed to query expired mutes"),
        }

        match self.ctx.lock_repo().find_expired(now).await {
            Ok(locks) => {
                for lock in locks {
                    if stopping() {
                        return report;
                    }
                    match tokio::time::timeout(timeout, self.reverse_lock(&lock)).await {
                        Ok(Ok(Reversal::Reversed)) => report.locks_reversed += 1,
                        Ok(Ok(Reversal::Dropped)) => report.locks_dropped += 1,
                        Ok(Err(e)) => {
                            error!(channel_id = %lock.channel_id, error = %e, "Lock reversal failed, retrying next tick");
                            report.deferred += 1;
                        }
                        Err(_) => {
                            warn!(channel_id = %lock.channel_id, ?timeout, "Lock reversal timed out, retrying next tick");
                            report.deferred += 1;
                        }
                    }
                }
            }
            Err(e) => error!(error = %e, "Failed to query expired locks"),
        }

        report
    }

    // === Mutes ===

    async fn reverse_mute(&self, mute: &Mute) -> ServiceResult<Reversal> {
        let settings = self.ctx.guild_repo().find_by_id(mute.guild_id).await?;
        let Some(role_id) = settings.and_then(|s| s.mute_role) else {
            return self.drop_mute(mute, "no mute role configured").await;
        };

        let actor = self.ctx.actor();
        let guild = match actor.resolve_guild(mute.guild_id).await {
            Ok(Some(guild)) => guild,
            Ok(None) => return self.drop_mute(mute, "guild is gone").await,
            Err(e) => return self.drop_mute(mute, &e.to_string()).await,
        };
        let role = match actor.resolve_role(&guild, role_id).await {
            Ok(Some(role)) => role,
            Ok(None) => return self.drop_mute(mute, "mute role is gone").await,
            Err(e) => return self.drop_mute(mute, &e.to_string()).await,
        };

        match actor.resolve_member(&guild, mute.user.id).await {
            Ok(Some(member)) => {
                if let Err(e) = actor.set_member_role(&member, &role, false).await {
                    return self.drop_mute(mute, &e.to_string()).await;
                }
            }
            // Left the guild; nothing to remove
            Ok(None) => debug!(user_id = %mute.user.id, "Muted member is no longer in the guild"),
            Err(e) => return self.drop_mute(mute, &e.to_string()).await,
        }

        if let Err(e) = actor
            .direct_notify(
                mute.user.id,
                &format!("Your mute in {} has expired.", guild.name),
            )
            .await
        {
            debug!(user_id = %mute.user.id, error = %e, "Could not notify member");
        }

        PolicyService::new(&self.ctx)
            .post_mod_log(
                mute.guild_id,
                &LogMessage::new(
                    format!("{} mute expired.", mute.user.name),
                    LogSeverity::Automatic,
                ),
            )
            .await;

        self.ctx.mute_repo().delete(mute.infraction_id).await?;
        info!(infraction_id = %mute.infraction_id, user_id = %mute.user.id, "Mute expired");
        Ok(Reversal::Reversed)
    }

    async fn drop_mute(&self, mute: &Mute, why: &str) -> ServiceResult<Reversal> {
        warn!(
            infraction_id = %mute.infraction_id,
            guild_id = %mute.guild_id,
            reason = why,
            "Dropping expired mute without reversal"
        );
        self.ctx.mute_repo().delete(mute.infraction_id).await?;
        Ok(Reversal::Dropped)
    }

    // === Locks ===

    async fn reverse_lock(&self, lock: &Lock) -> ServiceResult<Reversal> {
        let actor = self.ctx.actor();
        let guild = match actor.resolve_guild(lock.guild_id).await {
            Ok(Some(guild)) => guild,
            Ok(None) => return self.drop_lock(lock, "guild is gone").await,
            Err(e) => return self.drop_lock(lock, &e.to_string()).await,
        };
        let channel = match actor.resolve_channel(&guild, lock.channel_id).await {
            Ok(Some(channel)) => channel,
            Ok(None) => return self.drop_lock(lock, "channel is gone").await,
            Err(e) => return self.drop_lock(lock, &e.to_string()).await,
        };
        let everyone = match actor.resolve_role(&guild, guild.id).await {
            Ok(Some(role)) => role,
            Ok(None) => return self.drop_lock(lock, "@everyone role unavailable").await,
            Err(e) => return self.drop_lock(lock, &e.to_string()).await,
        };

        if let Err(e) = actor
            .set_channel_send_permission(&channel, &everyone, lock.previous_value)
            .await
        {
            return self.drop_lock(lock, &e.to_string()).await;
        }

        PolicyService::new(&self.ctx)
            .post_mod_log(
                lock.guild_id,
                &LogMessage::new(
                    format!("{} was unlocked by {}", channel.mention(), self.ctx.bot_name()),
                    LogSeverity::Good,
                ),
            )
            .await;

        self.ctx.lock_repo().delete(lock.channel_id).await?;
        info!(channel_id = %lock.channel_id, "Lock expired");
        Ok(Reversal::Reversed)
    }

    async fn drop_lock(&self, lock: &Lock, why: &str) -> ServiceResult<Reversal> {
        warn!(
            channel_id = %lock.channel_id,
            guild_id = %lock.guild_id,
            reason = why,
            "Dropping expired lock without restoring the channel"
        );
        PolicyService::new(&self.ctx)
            .post_mod_log(
                lock.guild_id,
                &LogMessage::new(
                    format!(
                        "Lock on {} expired but the channel could not be restored",
                        render::channel_mention(lock.channel_id)
                    ),
                    LogSeverity::Automatic,
                ),
            )
            .await;
        self.ctx.lock_repo().delete(lock.channel_id).await?;
        Ok(Reversal::Dropped)
    }

    // === Lifecycle ===

    /// Sweep on every tick until `shutdown` becomes true
    ///
    /// A sweep in progress finishes its current record before stopping.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.settings.sweep_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.settings.sweep_interval(), "Expiry scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.sweep_until(Utc::now(), Some(&shutdown)).await;
                    if !report.is_empty() {
                        info!(
                            mutes_reversed = report.mutes_reversed,
                            mutes_dropped = report.mutes_dropped,
                            locks_reversed = report.locks_reversed,
                            locks_dropped = report.locks_dropped,
                            deferred = report.deferred,
                            "Sweep finished"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            if *shutdown.borrow() {
                break;
            }
        }

        info!("Expiry scheduler stopped");
    }

    /// Run on its own task
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(self.run(rx));
        SchedulerHandle { shutdown, task }
    }
}

/// Handle to a spawned scheduler
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal shutdown and wait for the current record to finish
    pub async fn shutdown(self) {
        // Err only when the loop is already gone
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "Expiry scheduler task panicked");
        }
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
