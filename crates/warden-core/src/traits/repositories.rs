//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Absence is `Ok(None)` or an empty `Vec`,
//! and deletes are idempotent: removing nothing returns `Ok(false)` / `Ok(0)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    GuildSettings, Infraction, InfractionKind, Lock, ModActionCounts, Mute, Pardon, PublishType,
    PublishedMessage,
};
use crate::error::DomainError;
use crate::value_objects::{InfractionId, Snowflake};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Guild Settings Repository
// ============================================================================

#[async_trait]
pub trait GuildSettingsRepository: Send + Sync {
    async fn find_by_id(&self, guild_id: Snowflake) -> RepoResult<Option<GuildSettings>>;

    /// Insert or replace the row for `settings.id`
    async fn save(&self, settings: &GuildSettings) -> RepoResult<()>;

    async fn delete(&self, guild_id: Snowflake) -> RepoResult<bool>;
}

// ============================================================================
// Infraction Repository
// ============================================================================

/// Infraction rows only; pardons and publications have their own ports
#[async_trait]
pub trait InfractionRepository: Send + Sync {
    /// Insert an unsaved infraction, returning the assigned id
    async fn insert(&self, infraction: &Infraction) -> RepoResult<InfractionId>;

    /// Write the mutable columns (reason, moderator) of a saved infraction
    async fn update(&self, infraction: &Infraction) -> RepoResult<()>;

    /// Find by id, scoped to a guild
    async fn find_by_id(
        &self,
        id: InfractionId,
        guild_id: Snowflake,
    ) -> RepoResult<Option<Infraction>>;

    async fn delete(&self, id: InfractionId) -> RepoResult<bool>;

    /// Newest BAN for the user, optionally only those issued after `since`
    async fn find_recent_ban(
        &self,
        user_id: Snowflake,
        guild_id: Snowflake,
        since: Option<DateTime<Utc>>,
    ) -> RepoResult<Option<Infraction>>;

    /// Infractions issued strictly after `issued_after`, oldest first
    async fn find_for_user(
        &self,
        user_id: Snowflake,
        guild_id: Snowflake,
        kind: Option<InfractionKind>,
        issued_after: DateTime<Utc>,
    ) -> RepoResult<Vec<Infraction>>;

    async fn count_by_moderator(
        &self,
        moderator_id: Snowflake,
        guild_id: Snowflake,
    ) -> RepoResult<ModActionCounts>;
}

// ============================================================================
// Pardon Repository
// ============================================================================

#[async_trait]
pub trait PardonRepository: Send + Sync {
    async fn find(&self, infraction_id: InfractionId) -> RepoResult<Option<Pardon>>;

    /// Insert, or update only the reason when a pardon already exists
    async fn save(&self, pardon: &Pardon) -> RepoResult<()>;

    async fn delete(&self, infraction_id: InfractionId) -> RepoResult<bool>;
}

// ============================================================================
// Mute Repository
// ============================================================================

#[async_trait]
pub trait MuteRepository: Send + Sync {
    async fn find(&self, infraction_id: InfractionId) -> RepoResult<Option<Mute>>;

    async fn find_for_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<Mute>>;

    /// The member's mute if it ends after `now`
    async fn find_active(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Mute>>;

    /// All mutes with `end_time <= now`, soonest first
    async fn find_expired(&self, now: DateTime<Utc>) -> RepoResult<Vec<Mute>>;

    async fn create(&self, mute: &Mute) -> RepoResult<()>;

    async fn delete(&self, infraction_id: InfractionId) -> RepoResult<bool>;

    /// Remove every mute row for the member, returning how many went
    async fn delete_for_member(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<u64>;
}

// ============================================================================
// Lock Repository
// ============================================================================

#[async_trait]
pub trait LockRepository: Send + Sync {
    async fn find(&self, channel_id: Snowflake) -> RepoResult<Option<Lock>>;

    /// All locks with `end_time <= now`, soonest first
    async fn find_expired(&self, now: DateTime<Utc>) -> RepoResult<Vec<Lock>>;

    /// Upsert by channel; an existing row keeps its `previous_value`
    async fn save(&self, lock: &Lock) -> RepoResult<()>;

    async fn delete(&self, channel_id: Snowflake) -> RepoResult<bool>;
}

// ============================================================================
// Published Message Repository
// ============================================================================

#[async_trait]
pub trait PublishedMessageRepository: Send + Sync {
    async fn find(
        &self,
        infraction_id: InfractionId,
        publish_type: PublishType,
    ) -> RepoResult<Option<PublishedMessage>>;

    /// Replace the row for `(infraction_id, publish_type)`
    async fn save(&self, message: &PublishedMessage) -> RepoResult<()>;

    async fn delete(
        &self,
        infraction_id: InfractionId,
        publish_type: PublishType,
    ) -> RepoResult<bool>;

    async fn delete_all(&self, infraction_id: InfractionId) -> RepoResult<u64>;
}
