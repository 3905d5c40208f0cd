//! Service context - dependency container for services
//!
//! Holds every storage port, the platform actor and the moderation settings.
//! Nothing here is global; the runtime builds one context and hands it out.

use std::sync::Arc;
use std::time::Duration;

use warden_common::ModerationSettings;
use warden_core::traits::{
    GuildActor, GuildSettingsRepository, InfractionRepository, LockRepository, MuteRepository,
    PardonRepository, PublishedMessageRepository,
};
use warden_db::{
    MemoryStore, PgGuildSettingsRepository, PgInfractionRepository, PgLockRepository,
    PgMuteRepository, PgPardonRepository, PgPublishedMessageRepository, PgPool,
};

use super::error::{ServiceError, ServiceResult};

/// Name used in automatic log entries when none is configured
pub const DEFAULT_BOT_NAME: &str = "Warden";

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    guild_repo: Arc<dyn GuildSettingsRepository>,
    infraction_repo: Arc<dyn InfractionRepository>,
    pardon_repo: Arc<dyn PardonRepository>,
    mute_repo: Arc<dyn MuteRepository>,
    lock_repo: Arc<dyn LockRepository>,
    published_repo: Arc<dyn PublishedMessageRepository>,

    // Platform
    actor: Arc<dyn GuildActor>,

    // Settings
    moderation: ModerationSettings,
    bot_name: String,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        guild_repo: Arc<dyn GuildSettingsRepository>,
        infraction_repo: Arc<dyn InfractionRepository>,
        pardon_repo: Arc<dyn PardonRepository>,
        mute_repo: Arc<dyn MuteRepository>,
        lock_repo: Arc<dyn LockRepository>,
        published_repo: Arc<dyn PublishedMessageRepository>,
        actor: Arc<dyn GuildActor>,
        moderation: ModerationSettings,
        bot_name: String,
    ) -> Self {
        Self {
            guild_repo,
            infraction_repo,
            pardon_repo,
            mute_repo,
            lock_repo,
            published_repo,
            actor,
            moderation,
            bot_name,
        }
    }

    // === Repositories ===

    pub fn guild_repo(&self) -> &dyn GuildSettingsRepository {
        self.guild_repo.as_ref()
    }

    pub fn infraction_repo(&self) -> &dyn InfractionRepository {
        self.infraction_repo.as_ref()
    }

    pub fn pardon_repo(&self) -> &dyn PardonRepository {
        self.pardon_repo.as_ref()
    }

    pub fn mute_repo(&self) -> &dyn MuteRepository {
        self.mute_repo.as_ref()
    }

    pub fn lock_repo(&self) -> &dyn LockRepository {
        self.lock_repo.as_ref()
    }

    pub fn published_repo(&self) -> &dyn PublishedMessageRepository {
        self.published_repo.as_ref()
    }

    // === Platform ===

    /// Get the platform actor
    pub fn actor(&self) -> &dyn GuildActor {
        self.actor.as_ref()
    }

    // === Settings ===

    /// Trailing window for matching platform bans to recorded ones; `None` is unbounded
    pub fn ban_dedup_window(&self) -> Option<chrono::Duration> {
        self.moderation.ban_dedup_window()
    }

    /// How long ban and unban events wait before reconciling
    pub fn ban_settle_delay(&self) -> Duration {
        self.moderation.ban_settle_delay()
    }

    /// Display name of the bot in automatic log entries
    pub fn bot_name(&self) -> &str {
        &self.bot_name
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("actor", &"dyn GuildActor")
            .field("moderation", &self.moderation)
            .field("bot_name", &self.bot_name)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
pub struct ServiceContextBuilder {
    guild_repo: Option<Arc<dyn GuildSettingsRepository>>,
    infraction_repo: Option<Arc<dyn InfractionRepository>>,
    pardon_repo: Option<Arc<dyn PardonRepository>>,
    mute_repo: Option<Arc<dyn MuteRepository>>,
    lock_repo: Option<Arc<dyn LockRepository>>,
    published_repo: Option<Arc<dyn PublishedMessageRepository>>,
    actor: Option<Arc<dyn GuildActor>>,
    moderation: ModerationSettings,
    bot_name: String,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self {
            guild_repo: None,
            infraction_repo: None,
            pardon_repo: None,
            mute_repo: None,
            lock_repo: None,
            published_repo: None,
            actor: None,
            moderation: ModerationSettings::default(),
            bot_name: DEFAULT_BOT_NAME.to_string(),
        }
    }

    /// Use the PostgreSQL repositories for every port
    pub fn postgres(self, pool: PgPool) -> Self {
        self.guild_repo(Arc::new(PgGuildSettingsRepository::new(pool.clone())))
            .infraction_repo(Arc::new(PgInfractionRepository::new(pool.clone())))
            .pardon_repo(Arc::new(PgPardonRepository::new(pool.clone())))
            .mute_repo(Arc::new(PgMuteRepository::new(pool.clone())))
            .lock_repo(Arc::new(PgLockRepository::new(pool.clone())))
            .published_repo(Arc::new(PgPublishedMessageRepository::new(pool)))
    }

    /// Use the repositories of an in-memory store for every port
    pub fn memory(self, store: &MemoryStore) -> Self {
        self.guild_repo(store.guilds.clone())
            .infraction_repo(store.infractions.clone())
            .pardon_repo(store.pardons.clone())
            .mute_repo(store.mutes.clone())
            .lock_repo(store.locks.clone())
            .published_repo(store.published.clone())
    }

    pub fn guild_repo(mut self, repo: Arc<dyn GuildSettingsRepository>) -> Self {
        self.guild_repo = Some(repo);
        self
    }

    pub fn infraction_repo(mut self, repo: Arc<dyn InfractionRepository>) -> Self {
        self.infraction_repo = Some(repo);
        self
    }

    pub fn pardon_repo(mut self, repo: Arc<dyn PardonRepository>) -> Self {
        self.pardon_repo = Some(repo);
        self
    }

    pub fn mute_repo(mut self, repo: Arc<dyn MuteRepository>) -> Self {
        self.mute_repo = Some(repo);
        self
    }

    pub fn lock_repo(mut self, repo: Arc<dyn LockRepository>) -> Self {
        self.lock_repo = Some(repo);
        self
    }

    pub fn published_repo(mut self, repo: Arc<dyn PublishedMessageRepository>) -> Self {
        self.published_repo = Some(repo);
        self
    }

    pub fn actor(mut self, actor: Arc<dyn GuildActor>) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn moderation(mut self, settings: ModerationSettings) -> Self {
        self.moderation = settings;
        self
    }

    pub fn bot_name(mut self, name: impl Into<String>) -> Self {
        self.bot_name = name.into();
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.guild_repo
                .ok_or_else(|| ServiceError::validation("guild_repo is required"))?,
            self.infraction_repo
                .ok_or_else(|| ServiceError::validation("infraction_repo is required"))?,
            self.pardon_repo
                .ok_or_else(|| ServiceError::validation("pardon_repo is required"))?,
            self.mute_repo
                .ok_or_else(|| ServiceError::validation("mute_repo is required"))?,
            self.lock_repo
                .ok_or_else(|| ServiceError::validation("lock_repo is required"))?,
            self.published_repo
                .ok_or_else(|| ServiceError::validation("published_repo is required"))?,
            self.actor
                .ok_or_else(|| ServiceError::validation("actor is required"))?,
            self.moderation,
            self.bot_name,
        ))
    }
}

impl Default for ServiceContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
