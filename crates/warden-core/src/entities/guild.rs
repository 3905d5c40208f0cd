//! Per-guild moderation settings

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::DomainError;
use crate::value_objects::{DurationType, Snowflake};

/// Guild settings, one row per guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildSettings {
    pub id: Snowflake,
    pub mod_log_channel: Option<Snowflake>,
    pub public_log_channel: Option<Snowflake>,
    /// Unit of the retention window used by history views
    pub duration_type: DurationType,
    /// Retention window length, always >= 1
    pub duration: u32,
    pub mute_role: Option<Snowflake>,
}

impl GuildSettings {
    pub const DEFAULT_DURATION_TYPE: DurationType = DurationType::Years;
    pub const DEFAULT_DURATION: u32 = 30;

    /// First-contact defaults for a guild
    pub fn new(id: Snowflake) -> Self {
        Self {
            id,
            mod_log_channel: None,
            public_log_channel: None,
            duration_type: Self::DEFAULT_DURATION_TYPE,
            duration: Self::DEFAULT_DURATION,
            mute_role: None,
        }
    }

    /// How long infractions stay visible in history views
    pub fn retention(&self) -> Duration {
        let days = self.duration_type.unit_days() * i64::from(self.duration);
        Duration::try_days(days).unwrap_or(Duration::MAX)
    }

    /// Cutoff for history views: infractions issued at or before it are hidden
    pub fn infraction_expired_time(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.retention())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Reject settings that cannot be stored
    pub fn validate(&self) -> Result<(), DomainError> {
        RetentionUpdate {
            duration_type: self.duration_type,
            duration: self.duration,
        }
        .validate()
        .map_err(|e| DomainError::Validation(e.to_string()))
    }
}

/// Input for changing a guild's retention window
#[derive(Debug, Clone, Copy, Validate, Serialize, Deserialize)]
pub struct RetentionUpdate {
    pub duration_type: DurationType,
    #[validate(range(
        min = 1,
        max = 2_147_483_647,
        message = "retention must be between 1 and 2147483647 units"
    ))]
    pub duration: u32,
}
