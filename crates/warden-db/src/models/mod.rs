//! Database models - SQLx-compatible structs for PostgreSQL tables

mod guild;
mod infraction;
mod sanction;

pub use guild::GuildSettingsModel;
pub use infraction::{InfractionModel, ModActionCountsModel, PardonModel, PublishedMessageModel};
pub use sanction::{LockModel, MuteModel};
