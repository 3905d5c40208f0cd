//! Publication records for ban / unban announcements

use serde::{Deserialize, Serialize};

use crate::value_objects::{InfractionId, Snowflake};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishType {
    Ban = 1,
    Unban = 2,
}

impl PublishType {
    #[inline]
    pub const fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(Self::Ban),
            2 => Some(Self::Unban),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ban => "BAN",
            Self::Unban => "UNBAN",
        }
    }
}

/// A message posted to a public log channel, kept so it can be edited later
///
/// At most one per `(infraction_id, publish_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedMessage {
    pub infraction_id: InfractionId,
    pub channel_id: Snowflake,
    pub message_id: Snowflake,
    pub publish_type: PublishType,
}
