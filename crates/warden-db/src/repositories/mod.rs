//! Repository implementations
//!
//! PostgreSQL implementations of the storage ports defined in warden-core.
//! Each row operation is its own statement; nothing spans a transaction.

mod error;
mod guild;
mod infraction;
mod lock;
mod mute;
mod pardon;
mod published;

pub use guild::PgGuildSettingsRepository;
pub use infraction::PgInfractionRepository;
pub use lock::PgLockRepository;
pub use mute::PgMuteRepository;
pub use pardon::PgPardonRepository;
pub use published::PgPublishedMessageRepository;
