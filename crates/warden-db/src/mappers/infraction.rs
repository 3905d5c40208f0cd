//! Infraction / Pardon / PublishedMessage entity <-> model mappers

use warden_core::entities::{
    DbUser, Infraction, InfractionKind, ModActionCounts, Pardon, PublishType, PublishedMessage,
};
use warden_core::value_objects::{InfractionId, Snowflake};
use warden_core::DomainError;

use super::corrupt;
use crate::models::{InfractionModel, ModActionCountsModel, PardonModel, PublishedMessageModel};

/// Sub-records are left empty; the ledger hydrates them
impl TryFrom<InfractionModel> for Infraction {
    type Error = DomainError;

    fn try_from(model: InfractionModel) -> Result<Self, Self::Error> {
        let kind = InfractionKind::from_code(model.kind)
            .ok_or_else(|| corrupt("infractions.kind", model.kind))?;

        Ok(Infraction {
            id: Some(InfractionId::new(model.id)),
            user: DbUser::new(Snowflake::new(model.user_id), model.user_name),
            moderator: DbUser::new(Snowflake::new(model.moderator_id), model.moderator_name),
            guild_id: Snowflake::new(model.guild_id),
            reason: model.reason,
            issued_at: model.issued_at,
            kind,
            pardon: None,
            published_ban: None,
            published_unban: None,
        })
    }
}

impl From<PardonModel> for Pardon {
    fn from(model: PardonModel) -> Self {
        Pardon {
            infraction_id: InfractionId::new(model.infraction_id),
            moderator: DbUser::new(Snowflake::new(model.moderator_id), model.moderator_name),
            pardon_on: model.pardon_on,
            reason: model.reason,
        }
    }
}

impl TryFrom<PublishedMessageModel> for PublishedMessage {
    type Error = DomainError;

    fn try_from(model: PublishedMessageModel) -> Result<Self, Self::Error> {
        let publish_type = PublishType::from_code(model.publish_type)
            .ok_or_else(|| corrupt("published_messages.publish_type", model.publish_type))?;

        Ok(PublishedMessage {
            infraction_id: InfractionId::new(model.infraction_id),
            channel_id: Snowflake::new(model.channel_id),
            message_id: Snowflake::new(model.message_id),
            publish_type,
        })
    }
}

impl From<ModActionCountsModel> for ModActionCounts {
    fn from(model: ModActionCountsModel) -> Self {
        ModActionCounts {
            warns: model.warns,
            mutes: model.mutes,
            bans: model.bans,
        }
    }
}

/// Infraction values for insert / update
pub struct InfractionRow<'a> {
    pub user_id: i64,
    pub user_name: &'a str,
    pub moderator_id: i64,
    pub moderator_name: &'a str,
    pub guild_id: i64,
    pub reason: &'a str,
    pub kind: i16,
}

impl<'a> InfractionRow<'a> {
    pub fn new(infraction: &'a Infraction) -> Self {
        Self {
            user_id: infraction.user.id.into_inner(),
            user_name: &infraction.user.name,
            moderator_id: infraction.moderator.id.into_inner(),
            moderator_name: &infraction.moderator.name,
            guild_id: infraction.guild_id.into_inner(),
            reason: &infraction.reason,
            kind: infraction.kind.code(),
        }
    }
}

pub struct PardonRow<'a> {
    pub infraction_id: i64,
    pub moderator_id: i64,
    pub moderator_name: &'a str,
    pub reason: Option<&'a str>,
}

impl<'a> PardonRow<'a> {
    pub fn new(pardon: &'a Pardon) -> Self {
        Self {
            infraction_id: pardon.infraction_id.into_inner(),
            moderator_id: pardon.moderator.id.into_inner(),
            moderator_name: &pardon.moderator.name,
            reason: pardon.reason.as_deref(),
        }
    }
}
