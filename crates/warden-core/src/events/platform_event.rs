//! Platform events - gateway notifications relevant to moderation
//!
//! The gateway client translates its own payloads into these and hands them
//! to the event service. Bans and unbans arrive here whether or not the bot
//! issued them.

use serde::{Deserialize, Serialize};

use crate::entities::DbUser;
use crate::value_objects::Snowflake;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlatformEvent {
    /// The bot joined a guild or the guild became available on startup
    GuildAvailable { guild_id: Snowflake },

    MemberBanned { guild_id: Snowflake, user: DbUser },

    MemberUnbanned { guild_id: Snowflake, user: DbUser },

    MemberJoined { guild_id: Snowflake, user: DbUser },
}

impl PlatformEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::GuildAvailable { .. } => "GUILD_AVAILABLE",
            Self::MemberBanned { .. } => "MEMBER_BANNED",
            Self::MemberUnbanned { .. } => "MEMBER_UNBANNED",
            Self::MemberJoined { .. } => "MEMBER_JOINED",
        }
    }

    pub fn guild_id(&self) -> Snowflake {
        match self {
            Self::GuildAvailable { guild_id }
            | Self::MemberBanned { guild_id, .. }
            | Self::MemberUnbanned { guild_id, .. }
            | Self::MemberJoined { guild_id, .. } => *guild_id,
        }
    }
}
