//! Guild settings database model

use sqlx::FromRow;

/// Database model for guilds table
#[derive(Debug, Clone, FromRow)]
pub struct GuildSettingsModel {
    pub id: i64,
    pub mod_log_channel: Option<i64>,
    pub public_log_channel: Option<i64>,
    pub duration_type: i16,
    pub duration: i32,
    pub mute_role: Option<i64>,
}
