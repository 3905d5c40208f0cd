//! # warden-core
//!
//! Domain layer for the moderation ledger: infractions and their pardon /
//! publication sub-records, time-bound sanctions (mutes, channel locks),
//! per-guild settings, storage ports and the `GuildActor` port.
//! This crate has zero dependencies on infrastructure (database, platform client, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    DbUser, GuildSettings, Infraction, InfractionKind, Lock, ModActionCounts, Mute,
    Pardon, PublishType, PublishedMessage, RetentionUpdate,
};
pub use error::{ActorError, DomainError};
pub use events::PlatformEvent;
pub use traits::{
    ActorResult, ChannelHandle, GuildActor, GuildHandle, GuildSettingsRepository,
    InfractionRepository, LockRepository, LogMessage, LogSeverity, MemberHandle, MuteRepository,
    PardonRepository, PublishedMessageRepository, RepoResult, RoleHandle,
};
pub use value_objects::{
    parse_retention, parse_sanction_duration, DurationType, InfractionId, ModeratorContext, Permissions,
    Snowflake, SnowflakeParseError, Subject,
};
