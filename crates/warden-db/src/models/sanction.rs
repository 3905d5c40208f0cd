//! Mute and lock database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for mutes table
#[derive(Debug, Clone, FromRow)]
pub struct MuteModel {
    pub infraction_id: i64,
    pub guild_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub end_time: DateTime<Utc>,
}

/// Database model for locks table
#[derive(Debug, Clone, FromRow)]
pub struct LockModel {
    pub channel_id: i64,
    pub previous_value: bool,
    pub moderator_id: i64,
    pub moderator_name: String,
    pub guild_id: i64,
    pub reason: String,
    pub end_time: DateTime<Utc>,
}
