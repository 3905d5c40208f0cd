//! The platform side of moderation
//!
//! `GuildActor` is implemented by the chat-platform client. It resolves ids to
//! live handles and applies or reverts real-world effects. It holds no state
//! the ledger depends on; storage stays the single source of truth.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ActorError;
use crate::value_objects::Snowflake;

pub type ActorResult<T> = Result<T, ActorError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildHandle {
    pub id: Snowflake,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberHandle {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    /// `name#discriminator`
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHandle {
    pub guild_id: Snowflake,
    pub id: Snowflake,
    pub name: String,
    pub position: i32,
}

impl RoleHandle {
    /// The `@everyone` role shares its id with the guild
    #[inline]
    pub fn is_everyone(&self) -> bool {
        self.id == self.guild_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub guild_id: Snowflake,
    pub id: Snowflake,
    pub name: String,
}

impl ChannelHandle {
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

/// Severity of a log entry, rendered as the embed color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSeverity {
    Good,
    Caution,
    Bad,
    /// Actions the bot took on its own (expiry, platform events)
    Automatic,
}

impl LogSeverity {
    pub const fn color(self) -> u32 {
        match self {
            Self::Good => 0x7D_B3_58,
            Self::Caution => 0xF9_AE_36,
            Self::Bad => 0xD5_2D_48,
            Self::Automatic => 0x1C_66_9B,
        }
    }
}

/// A message for a log channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub title: Option<String>,
    pub body: String,
    pub footer: Option<String>,
    pub severity: LogSeverity,
}

impl LogMessage {
    pub fn new(body: impl Into<String>, severity: LogSeverity) -> Self {
        Self {
            title: None,
            body: body.into(),
            footer: None,
            severity,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

#[async_trait]
pub trait GuildActor: Send + Sync {
    async fn resolve_guild(&self, guild_id: Snowflake) -> ActorResult<Option<GuildHandle>>;

    async fn resolve_member(
        &self,
        guild: &GuildHandle,
        user_id: Snowflake,
    ) -> ActorResult<Option<MemberHandle>>;

    async fn resolve_role(
        &self,
        guild: &GuildHandle,
        role_id: Snowflake,
    ) -> ActorResult<Option<RoleHandle>>;

    async fn resolve_channel(
        &self,
        guild: &GuildHandle,
        channel_id: Snowflake,
    ) -> ActorResult<Option<ChannelHandle>>;

    /// Add or remove a role; already being in the desired state is success
    async fn set_member_role(
        &self,
        member: &MemberHandle,
        role: &RoleHandle,
        present: bool,
    ) -> ActorResult<()>;

    /// Whether `role` may currently send messages in the channel
    async fn channel_send_permission(
        &self,
        channel: &ChannelHandle,
        role: &RoleHandle,
    ) -> ActorResult<bool>;

    async fn set_channel_send_permission(
        &self,
        channel: &ChannelHandle,
        role: &RoleHandle,
        allowed: bool,
    ) -> ActorResult<()>;

    /// Apply or lift a platform ban
    async fn set_ban(
        &self,
        guild: &GuildHandle,
        user_id: Snowflake,
        banned: bool,
        reason: &str,
    ) -> ActorResult<()>;

    /// Post to a channel, returning the new message id
    async fn post_message(
        &self,
        guild: &GuildHandle,
        channel_id: Snowflake,
        message: &LogMessage,
    ) -> ActorResult<Snowflake>;

    /// Replace a posted message; `NotFound` when it was deleted
    async fn edit_message(
        &self,
        guild: &GuildHandle,
        channel_id: Snowflake,
        message_id: Snowflake,
        message: &LogMessage,
    ) -> ActorResult<()>;

    /// Direct message a user; callers treat failure as best-effort
    async fn direct_notify(&self, user_id: Snowflake, text: &str) -> ActorResult<()>;
}
