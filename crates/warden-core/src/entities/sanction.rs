//! Time-bound sanctions reversed by the expiry sweep

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::DbUser;
use crate::value_objects::{InfractionId, Snowflake};

/// An active mute, one per `(guild_id, user)`
///
/// `infraction_id` is a plain reference. Forgetting the infraction does not
/// cancel the mute, and the guild is stored here so expiry never needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mute {
    pub infraction_id: InfractionId,
    pub guild_id: Snowflake,
    pub user: DbUser,
    pub end_time: DateTime<Utc>,
}

impl Mute {
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.end_time <= now
    }
}

/// A locked channel, keyed by channel id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub channel_id: Snowflake,
    /// Send permission of `@everyone` before the first lock, restored on unlock
    pub previous_value: bool,
    pub moderator: DbUser,
    pub guild_id: Snowflake,
    pub reason: String,
    pub end_time: DateTime<Utc>,
}

impl Lock {
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.end_time <= now
    }
}
