//! Domain entities - core business objects

mod guild;
mod infraction;
mod published;
mod sanction;
mod user;

pub use guild::{GuildSettings, RetentionUpdate};
pub use infraction::{Infraction, InfractionKind, ModActionCounts, Pardon};
pub use published::{PublishType, PublishedMessage};
pub use sanction::{Lock, Mute};
pub use user::DbUser;
