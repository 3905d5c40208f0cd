//! Mute / Lock entity <-> model mappers

use warden_core::entities::{DbUser, Lock, Mute};
use warden_core::value_objects::{InfractionId, Snowflake};

use crate::models::{LockModel, MuteModel};

impl From<MuteModel> for Mute {
    fn from(model: MuteModel) -> Self {
        Mute {
            infraction_id: InfractionId::new(model.infraction_id),
            guild_id: Snowflake::new(model.guild_id),
            user: DbUser::new(Snowflake::new(model.user_id), model.user_name),
            end_time: model.end_time,
        }
    }
}

impl From<LockModel> for Lock {
    fn from(model: LockModel) -> Self {
        Lock {
            channel_id: Snowflake::new(model.channel_id),
            previous_value: model.previous_value,
            moderator: DbUser::new(Snowflake::new(model.moderator_id), model.moderator_name),
            guild_id: Snowflake::new(model.guild_id),
            reason: model.reason,
            end_time: model.end_time,
        }
    }
}

pub struct MuteRow<'a> {
    pub infraction_id: i64,
    pub guild_id: i64,
    pub user_id: i64,
    pub user_name: &'a str,
}

impl<'a> MuteRow<'a> {
    pub fn new(mute: &'a Mute) -> Self {
        Self {
            infraction_id: mute.infraction_id.into_inner(),
            guild_id: mute.guild_id.into_inner(),
            user_id: mute.user.id.into_inner(),
            user_name: &mute.user.name,
        }
    }
}

pub struct LockRow<'a> {
    pub channel_id: i64,
    pub moderator_id: i64,
    pub moderator_name: &'a str,
    pub guild_id: i64,
    pub reason: &'a str,
}

impl<'a> LockRow<'a> {
    pub fn new(lock: &'a Lock) -> Self {
        Self {
            channel_id: lock.channel_id.into_inner(),
            moderator_id: lock.moderator.id.into_inner(),
            moderator_name: &lock.moderator.name,
            guild_id: lock.guild_id.into_inner(),
            reason: &lock.reason,
        }
    }
}
