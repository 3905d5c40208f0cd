//! Infraction aggregate - the central moderation record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::published::{PublishType, PublishedMessage};
use super::user::DbUser;
use crate::value_objects::{InfractionId, Snowflake};

/// Kind of infraction (stored as smallint, codes are stable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InfractionKind {
    Warn = 1,
    Mute = 2,
    Ban = 3,
}

impl InfractionKind {
    #[inline]
    pub const fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Warn),
            2 => Some(Self::Mute),
            3 => Some(Self::Ban),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Warn => "WARN",
            Self::Mute => "MUTE",
            Self::Ban => "BAN",
        }
    }
}

impl std::fmt::Display for InfractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Forgiveness attached to an infraction (1:1)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pardon {
    pub infraction_id: InfractionId,
    pub moderator: DbUser,
    pub pardon_on: DateTime<Utc>,
    pub reason: Option<String>,
}

impl Pardon {
    pub fn new(infraction_id: InfractionId, moderator: DbUser, reason: Option<String>) -> Self {
        Self {
            infraction_id,
            moderator,
            pardon_on: Utc::now(),
            reason,
        }
    }
}

/// A recorded warn, mute or ban
///
/// `id` is `None` until storage assigns one. After that `kind`, `issued_at`,
/// `user` and `guild_id` never change; updates only write `reason` and
/// `moderator`. The sub-records are hydrated on every load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Infraction {
    pub id: Option<InfractionId>,
    pub user: DbUser,
    pub moderator: DbUser,
    pub guild_id: Snowflake,
    pub reason: String,
    pub issued_at: DateTime<Utc>,
    pub kind: InfractionKind,
    pub pardon: Option<Pardon>,
    pub published_ban: Option<PublishedMessage>,
    pub published_unban: Option<PublishedMessage>,
}

impl Infraction {
    /// Build an unsaved infraction stamped with the current time
    pub fn new(
        user: DbUser,
        moderator: DbUser,
        guild_id: Snowflake,
        reason: impl Into<String>,
        kind: InfractionKind,
    ) -> Self {
        Self {
            id: None,
            user,
            moderator,
            guild_id,
            reason: reason.into(),
            issued_at: Utc::now(),
            kind,
            pardon: None,
            published_ban: None,
            published_unban: None,
        }
    }

    #[inline]
    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    #[inline]
    pub fn is_pardoned(&self) -> bool {
        self.pardon.is_some()
    }

    /// Bans are only pardoned through the unban flow
    #[inline]
    pub fn can_be_pardoned_directly(&self) -> bool {
        matches!(self.kind, InfractionKind::Warn | InfractionKind::Mute)
    }

    /// Whether a publication of the given type is valid for this infraction
    pub fn can_publish(&self, publish_type: PublishType) -> bool {
        match publish_type {
            PublishType::Ban => self.kind == InfractionKind::Ban,
            PublishType::Unban => self.kind == InfractionKind::Ban && self.is_pardoned(),
        }
    }

    pub fn publication(&self, publish_type: PublishType) -> Option<&PublishedMessage> {
        match publish_type {
            PublishType::Ban => self.published_ban.as_ref(),
            PublishType::Unban => self.published_unban.as_ref(),
        }
    }

    pub fn set_publication(&mut self, publish_type: PublishType, value: Option<PublishedMessage>) {
        match publish_type {
            PublishType::Ban => self.published_ban = value,
            PublishType::Unban => self.published_unban = value,
        }
    }
}

/// Per-moderator action totals within a guild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModActionCounts {
    pub warns: i64,
    pub mutes: i64,
    pub bans: i64,
}

impl ModActionCounts {
    pub fn total(&self) -> i64 {
        self.warns + self.mutes + self.bans
    }
}
