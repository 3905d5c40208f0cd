//! Entity to model mappers
//!
//! - `TryFrom<Model> for Entity` where a stored code must be decoded, `From` otherwise
//! - `*Row` structs: entity data flattened for binding

mod guild;
mod infraction;
mod sanction;

pub use guild::GuildSettingsRow;
pub use infraction::{InfractionRow, PardonRow};
pub use sanction::{LockRow, MuteRow};

use warden_core::DomainError;

/// A stored code that no longer decodes means the schema and code disagree
pub(crate) fn corrupt(column: &'static str, value: impl std::fmt::Display) -> DomainError {
    DomainError::DatabaseError(format!("unrecognised {column} value in storage: {value}"))
}
