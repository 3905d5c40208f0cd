//! Permission bitflags mirrored from the chat platform
//!
//! Bit positions follow the platform's own permission integer so a member's
//! computed permissions can be passed through untouched.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::snowflake::Snowflake;

bitflags! {
    /// Platform permission flags relevant to moderation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u64 {
        const KICK_MEMBERS     = 1 << 1;
        const BAN_MEMBERS      = 1 << 2;
        /// Bypass all permission checks
        const ADMINISTRATOR    = 1 << 3;
        const MANAGE_CHANNELS  = 1 << 4;
        const MANAGE_GUILD     = 1 << 5;
        const VIEW_CHANNEL     = 1 << 10;
        const SEND_MESSAGES    = 1 << 11;
        /// Delete other users' messages; also gates channel locks
        const MANAGE_MESSAGES  = 1 << 13;
        const MANAGE_ROLES     = 1 << 28;
    }
}

impl Permissions {
    /// Check if the permission set contains a required permission
    ///
    /// Administrators bypass all permission checks.
    #[inline]
    pub fn has(&self, permission: Permissions) -> bool {
        if self.contains(Permissions::ADMINISTRATOR) {
            return true;
        }
        self.contains(permission)
    }

    /// Create from raw i64 bits (platform payloads, database)
    #[inline]
    pub fn from_i64(bits: i64) -> Self {
        Permissions::from_bits_truncate(bits as u64)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Permissions::empty()
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}

// Serialize as string, the platform sends permission integers as strings
impl Serialize for Permissions {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.bits().to_string())
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct PermissionsVisitor;

        impl Visitor<'_> for PermissionsVisitor {
            type Value = Permissions;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing permission bits")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_bits_truncate(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                Ok(Permissions::from_i64(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Permissions, E>
            where
                E: de::Error,
            {
                value
                    .parse::<u64>()
                    .map(Permissions::from_bits_truncate)
                    .map_err(|_| de::Error::custom("invalid permissions string"))
            }
        }

        deserializer.deserialize_any(PermissionsVisitor)
    }
}

/// What a moderation command acts upon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Channel(Snowflake),
    Member(Snowflake),
    Guild(Snowflake),
    /// A role, carrying its position in the guild hierarchy
    Role { id: Snowflake, position: i32 },
}

/// The invoking moderator, as seen by permission checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeratorContext {
    pub user_id: Snowflake,
    pub permissions: Permissions,
    pub top_role_position: i32,
    pub is_guild_owner: bool,
    pub is_bot_owner: bool,
}

impl ModeratorContext {
    /// Check whether this moderator may perform privileged actions on `subject`
    pub fn can_modify(&self, subject: &Subject) -> bool {
        if self.is_bot_owner {
            return true;
        }

        match subject {
            Subject::Channel(_) => self.permissions.has(Permissions::MANAGE_MESSAGES),
            Subject::Member(_) => self.permissions.has(Permissions::BAN_MEMBERS),
            Subject::Guild(_) => self.permissions.has(Permissions::MANAGE_GUILD),
            Subject::Role { position, .. } => {
                self.permissions.has(Permissions::MANAGE_ROLES)
                    && (self.top_role_position > *position || self.is_guild_owner)
            }
        }
    }
}
