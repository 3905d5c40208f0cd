//! Infraction, pardon and publication database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for infractions table
#[derive(Debug, Clone, FromRow)]
pub struct InfractionModel {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub moderator_id: i64,
    pub moderator_name: String,
    pub guild_id: i64,
    pub reason: String,
    pub issued_at: DateTime<Utc>,
    pub kind: i16,
}

/// Database model for pardons table
#[derive(Debug, Clone, FromRow)]
pub struct PardonModel {
    pub infraction_id: i64,
    pub moderator_id: i64,
    pub moderator_name: String,
    pub pardon_on: DateTime<Utc>,
    pub reason: Option<String>,
}

/// Database model for published_messages table
#[derive(Debug, Clone, FromRow)]
pub struct PublishedMessageModel {
    pub infraction_id: i64,
    pub publish_type: i16,
    pub channel_id: i64,
    pub message_id: i64,
}

/// Aggregate row for per-moderator counts
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ModActionCountsModel {
    pub warns: i64,
    pub mutes: i64,
    pub bans: i64,
}
