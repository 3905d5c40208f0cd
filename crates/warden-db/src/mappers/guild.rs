//! GuildSettings entity <-> model mapper

use warden_core::entities::GuildSettings;
use warden_core::value_objects::{DurationType, Snowflake};
use warden_core::DomainError;

use super::corrupt;
use crate::models::GuildSettingsModel;

impl TryFrom<GuildSettingsModel> for GuildSettings {
    type Error = DomainError;

    fn try_from(model: GuildSettingsModel) -> Result<Self, Self::Error> {
        let duration_type = DurationType::from_code(model.duration_type)
            .ok_or_else(|| corrupt("guilds.duration_type", model.duration_type))?;
        let duration =
            u32::try_from(model.duration).map_err(|_| corrupt("guilds.duration", model.duration))?;

        Ok(GuildSettings {
            id: Snowflake::new(model.id),
            mod_log_channel: model.mod_log_channel.map(Snowflake::new),
            public_log_channel: model.public_log_channel.map(Snowflake::new),
            duration_type,
            duration,
            mute_role: model.mute_role.map(Snowflake::new),
        })
    }
}

/// GuildSettings flattened for an upsert
pub struct GuildSettingsRow {
    pub id: i64,
    pub mod_log_channel: Option<i64>,
    pub public_log_channel: Option<i64>,
    pub duration_type: i16,
    pub duration: i32,
    pub mute_role: Option<i64>,
}

impl GuildSettingsRow {
    /// Fails with `Validation` when the retention does not fit the column
    pub fn new(settings: &GuildSettings) -> Result<Self, DomainError> {
        let duration = i32::try_from(settings.duration).map_err(|_| {
            DomainError::Validation(format!(
                "retention of {} units is too long to store",
                settings.duration
            ))
        })?;
        Ok(Self {
            id: settings.id.into_inner(),
            mod_log_channel: settings.mod_log_channel.map(Snowflake::into_inner),
            public_log_channel: settings.public_log_channel.map(Snowflake::into_inner),
            duration_type: settings.duration_type.code(),
            duration,
            mute_role: settings.mute_role.map(Snowflake::into_inner),
        })
    }
}
