//! In-memory storage adapters
//!
//! Every storage port backed by `HashMap`s behind `parking_lot` locks. Used by
//! tests and by embedders that do not want a database. Data is lost on drop.

mod repositories;

pub use repositories::{
    MemoryGuildSettingsRepository, MemoryInfractionRepository, MemoryLockRepository,
    MemoryMuteRepository, MemoryPardonRepository, MemoryPublishedMessageRepository,
};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use warden_core::DomainError;

/// Shared switch that makes every repository of a store fail like a lost connection
#[derive(Debug, Clone, Default)]
pub struct Outage(Arc<AtomicBool>);

impl Outage {
    pub fn set(&self, down: bool) {
        self.0.store(down, Ordering::SeqCst);
    }

    pub(crate) fn check(&self) -> Result<(), DomainError> {
        if self.0.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError(
                "in-memory store is unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

/// One repository per port, sharing a single outage switch
#[derive(Clone)]
pub struct MemoryStore {
    pub guilds: Arc<MemoryGuildSettingsRepository>,
    pub infractions: Arc<MemoryInfractionRepository>,
    pub pardons: Arc<MemoryPardonRepository>,
    pub mutes: Arc<MemoryMuteRepository>,
    pub locks: Arc<MemoryLockRepository>,
    pub published: Arc<MemoryPublishedMessageRepository>,
    outage: Outage,
}

impl MemoryStore {
    pub fn new() -> Self {
        let outage = Outage::default();
        Self {
            guilds: Arc::new(MemoryGuildSettingsRepository::new(outage.clone())),
            infractions: Arc::new(MemoryInfractionRepository::new(outage.clone())),
            pardons: Arc::new(MemoryPardonRepository::new(outage.clone())),
            mutes: Arc::new(MemoryMuteRepository::new(outage.clone())),
            locks: Arc::new(MemoryLockRepository::new(outage.clone())),
            published: Arc::new(MemoryPublishedMessageRepository::new(outage.clone())),
            outage,
        }
    }

    /// Simulate the store going down (or coming back)
    pub fn set_unavailable(&self, down: bool) {
        self.outage.set(down);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("infractions", &self.infractions.len())
            .field("mutes", &self.mutes.len())
            .field("locks", &self.locks.len())
            .finish_non_exhaustive()
    }
}
