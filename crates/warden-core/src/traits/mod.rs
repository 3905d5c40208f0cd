//! Ports - storage repositories and the platform actor

mod actor;
mod repositories;

pub use actor::{
    ActorResult, ChannelHandle, GuildActor, GuildHandle, LogMessage, LogSeverity, MemberHandle,
    RoleHandle,
};
pub use repositories::{
    GuildSettingsRepository, InfractionRepository, LockRepository, MuteRepository,
    PardonRepository, PublishedMessageRepository, RepoResult,
};
