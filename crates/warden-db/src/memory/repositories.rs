//! HashMap-backed implementations of the storage ports

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use warden_core::entities::{
    GuildSettings, Infraction, InfractionKind, Lock, ModActionCounts, Mute, Pardon, PublishType,
    PublishedMessage,
};
use warden_core::traits::{
    GuildSettingsRepository, InfractionRepository, LockRepository, MuteRepository,
    PardonRepository, PublishedMessageRepository, RepoResult,
};
use warden_core::value_objects::{InfractionId, Snowflake};
use warden_core::DomainError;

use super::Outage;

// ============================================================================
// Guild settings
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryGuildSettingsRepository {
    rows: RwLock<HashMap<Snowflake, GuildSettings>>,
    outage: Outage,
}

impl MemoryGuildSettingsRepository {
    pub(crate) fn new(outage: Outage) -> Self {
        Self {
            rows: RwLock::default(),
            outage,
        }
    }
}

#[async_trait]
impl GuildSettingsRepository for MemoryGuildSettingsRepository {
    async fn find_by_id(&self, guild_id: Snowflake) -> RepoResult<Option<GuildSettings>> {
        self.outage.check()?;
        Ok(self.rows.read().get(&guild_id).cloned())
    }

    async fn save(&self, settings: &GuildSettings) -> RepoResult<()> {
        self.outage.check()?;
        self.rows.write().insert(settings.id, settings.clone());
        Ok(())
    }

    async fn delete(&self, guild_id: Snowflake) -> RepoResult<bool> {
        self.outage.check()?;
        Ok(self.rows.write().remove(&guild_id).is_some())
    }
}

// ============================================================================
// Infractions
// ============================================================================

#[derive(Debug, Default)]
struct InfractionTable {
    rows: HashMap<InfractionId, Infraction>,
    next_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryInfractionRepository {
    table: RwLock<InfractionTable>,
    outage: Outage,
}

impl MemoryInfractionRepository {
    pub(crate) fn new(outage: Outage) -> Self {
        Self {
            table: RwLock::default(),
            outage,
        }
    }

    pub fn len(&self) -> usize {
        self.table.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rows are stored bare, like a table would hold them
fn strip_sub_records(infraction: &Infraction) -> Infraction {
    Infraction {
        pardon: None,
        published_ban: None,
        published_unban: None,
        ..infraction.clone()
    }
}

#[async_trait]
impl InfractionRepository for MemoryInfractionRepository {
    async fn insert(&self, infraction: &Infraction) -> RepoResult<InfractionId> {
        self.outage.check()?;
        if infraction.is_saved() {
            return Err(DomainError::Internal(
                "insert called with an infraction that already has an id".to_string(),
            ));
        }

        let mut table = self.table.write();
        table.next_id += 1;
        let id = InfractionId::new(table.next_id);

        let mut row = strip_sub_records(infraction);
        row.id = Some(id);
        table.rows.insert(id, row);
        Ok(id)
    }

    async fn update(&self, infraction: &Infraction) -> RepoResult<()> {
        self.outage.check()?;
        let id = infraction.id.ok_or_else(|| {
            DomainError::Internal("update called with an unsaved infraction".to_string())
        })?;

        let mut table = self.table.write();
        let row = table
            .rows
            .get_mut(&id)
            .ok_or(DomainError::InfractionNotFound(id))?;
        row.reason.clone_from(&infraction.reason);
        row.moderator = infraction.moderator.clone();
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: InfractionId,
        guild_id: Snowflake,
    ) -> RepoResult<Option<Infraction>> {
        self.outage.check()?;
        Ok(self
            .table
            .read()
            .rows
            .get(&id)
            .filter(|row| row.guild_id == guild_id)
            .cloned())
    }

    async fn delete(&self, id: InfractionId) -> RepoResult<bool> {
        self.outage.check()?;
        Ok(self.table.write().rows.remove(&id).is_some())
    }

    async fn find_recent_ban(
        &self,
        user_id: Snowflake,
        guild_id: Snowflake,
        since: Option<DateTime<Utc>>,
    ) -> RepoResult<Option<Infraction>> {
        self.outage.check()?;
        Ok(self
            .table
            .read()
            .rows
            .values()
            .filter(|row| {
                row.user.id == user_id
                    && row.guild_id == guild_id
                    && row.kind == InfractionKind::Ban
                    && since.is_none_or(|since| row.issued_at >= since)
            })
            .max_by_key(|row| (row.issued_at, row.id))
            .cloned())
    }

    async fn find_for_user(
        &self,
        user_id: Snowflake,
        guild_id: Snowflake,
        kind: Option<InfractionKind>,
        issued_after: DateTime<Utc>,
    ) -> RepoResult<Vec<Infraction>> {
        self.outage.check()?;
        let mut rows: Vec<Infraction> = self
            .table
            .read()
            .rows
            .values()
            .filter(|row| {
                row.user.id == user_id
                    && row.guild_id == guild_id
                    && kind.is_none_or(|kind| row.kind == kind)
                    && row.issued_at > issued_after
            })
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.issued_at, row.id));
        Ok(rows)
    }

    async fn count_by_moderator(
        &self,
        moderator_id: Snowflake,
        guild_id: Snowflake,
    ) -> RepoResult<ModActionCounts> {
        self.outage.check()?;
        let table = self.table.read();
        let mut counts = ModActionCounts::default();
        for row in table
            .rows
            .values()
            .filter(|row| row.moderator.id == moderator_id && row.guild_id == guild_id)
        {
            match row.kind {
                InfractionKind::Warn => counts.warns += 1,
                InfractionKind::Mute => counts.mutes += 1,
                InfractionKind::Ban => counts.bans += 1,
            }
        }
        Ok(counts)
    }
}

// ============================================================================
// Pardons
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryPardonRepository {
    rows: RwLock<HashMap<InfractionId, Pardon>>,
    outage: Outage,
}

impl MemoryPardonRepository {
    pub(crate) fn new(outage: Outage) -> Self {
        Self {
            rows: RwLock::default(),
            outage,
        }
    }
}

#[async_trait]
impl PardonRepository for MemoryPardonRepository {
    async fn find(&self, infraction_id: InfractionId) -> RepoResult<Option<Pardon>> {
        self.outage.check()?;
        Ok(self.rows.read().get(&infraction_id).cloned())
    }

    async fn save(&self, pardon: &Pardon) -> RepoResult<()> {
        self.outage.check()?;
        self.rows
            .write()
            .entry(pardon.infraction_id)
            .and_modify(|existing| existing.reason.clone_from(&pardon.reason))
            .or_insert_with(|| pardon.clone());
        Ok(())
    }

    async fn delete(&self, infraction_id: InfractionId) -> RepoResult<bool> {
        self.outage.check()?;
        Ok(self.rows.write().remove(&infraction_id).is_some())
    }
}

// ============================================================================
// Mutes
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryMuteRepository {
    rows: RwLock<HashMap<InfractionId, Mute>>,
    outage: Outage,
}

impl MemoryMuteRepository {
    pub(crate) fn new(outage: Outage) -> Self {
        Self {
            rows: RwLock::default(),
            outage,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of rows held for one member; the supersede rule keeps this at most 1
    pub fn count_for_member(&self, guild_id: Snowflake, user_id: Snowflake) -> usize {
        self.rows
            .read()
            .values()
            .filter(|m| m.guild_id == guild_id && m.user.id == user_id)
            .count()
    }
}

#[async_trait]
impl MuteRepository for MemoryMuteRepository {
    async fn find(&self, infraction_id: InfractionId) -> RepoResult<Option<Mute>> {
        self.outage.check()?;
        Ok(self.rows.read().get(&infraction_id).cloned())
    }

    async fn find_for_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<Mute>> {
        self.outage.check()?;
        Ok(self
            .rows
            .read()
            .values()
            .find(|m| m.guild_id == guild_id && m.user.id == user_id)
            .cloned())
    }

    async fn find_active(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        now: DateTime<Utc>,
    ) -> RepoResult<Option<Mute>> {
        self.outage.check()?;
        Ok(self
            .rows
            .read()
            .values()
            .find(|m| m.guild_id == guild_id && m.user.id == user_id && m.end_time > now)
            .cloned())
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> RepoResult<Vec<Mute>> {
        self.outage.check()?;
        let mut due: Vec<Mute> = self
            .rows
            .read()
            .values()
            .filter(|m| m.is_expired(now))
            .cloned()
            .collect();
        due.sort_by_key(|m| (m.end_time, m.infraction_id));
        Ok(due)
    }

    async fn create(&self, mute: &Mute) -> RepoResult<()> {
        self.outage.check()?;
        let mut rows = self.rows.write();
        rows.retain(|_, m| !(m.guild_id == mute.guild_id && m.user.id == mute.user.id));
        rows.insert(mute.infraction_id, mute.clone());
        Ok(())
    }

    async fn delete(&self, infraction_id: InfractionId) -> RepoResult<bool> {
        self.outage.check()?;
        Ok(self.rows.write().remove(&infraction_id).is_some())
    }

    async fn delete_for_member(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<u64> {
        self.outage.check()?;
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|_, m| !(m.guild_id == guild_id && m.user.id == user_id));
        Ok((before - rows.len()) as u64)
    }
}

// ============================================================================
// Locks
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryLockRepository {
    rows: RwLock<HashMap<Snowflake, Lock>>,
    outage: Outage,
}

impl MemoryLockRepository {
    pub(crate) fn new(outage: Outage) -> Self {
        Self {
            rows: RwLock::default(),
            outage,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LockRepository for MemoryLockRepository {
    async fn find(&self, channel_id: Snowflake) -> RepoResult<Option<Lock>> {
        self.outage.check()?;
        Ok(self.rows.read().get(&channel_id).cloned())
    }

    async fn find_expired(&self, now: DateTime<Utc>) -> RepoResult<Vec<Lock>> {
        self.outage.check()?;
        let mut due: Vec<Lock> = self
            .rows
            .read()
            .values()
            .filter(|l| l.is_expired(now))
            .cloned()
            .collect();
        due.sort_by_key(|l| (l.end_time, l.channel_id));
        Ok(due)
    }

    async fn save(&self, lock: &Lock) -> RepoResult<()> {
        self.outage.check()?;
        self.rows
            .write()
            .entry(lock.channel_id)
            .and_modify(|existing| {
                existing.moderator = lock.moderator.clone();
                existing.reason.clone_from(&lock.reason);
                existing.end_time = lock.end_time;
            })
            .or_insert_with(|| lock.clone());
        Ok(())
    }

    async fn delete(&self, channel_id: Snowflake) -> RepoResult<bool> {
        self.outage.check()?;
        Ok(self.rows.write().remove(&channel_id).is_some())
    }
}

// ============================================================================
// Published messages
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryPublishedMessageRepository {
    rows: RwLock<HashMap<(InfractionId, PublishType), PublishedMessage>>,
    outage: Outage,
}

impl MemoryPublishedMessageRepository {
    pub(crate) fn new(outage: Outage) -> Self {
        Self {
            rows: RwLock::default(),
            outage,
        }
    }

    pub fn count_for(&self, infraction_id: InfractionId) -> usize {
        self.rows
            .read()
            .keys()
            .filter(|(id, _)| *id == infraction_id)
            .count()
    }
}

#[async_trait]
impl PublishedMessageRepository for MemoryPublishedMessageRepository {
    async fn find(
        &self,
        infraction_id: InfractionId,
        publish_type: PublishType,
    ) -> RepoResult<Option<PublishedMessage>> {
        self.outage.check()?;
        Ok(self.rows.read().get(&(infraction_id, publish_type)).cloned())
    }

    async fn save(&self, message: &PublishedMessage) -> RepoResult<()> {
        self.outage.check()?;
        self.rows
            .write()
            .insert((message.infraction_id, message.publish_type), message.clone());
        Ok(())
    }

    async fn delete(
        &self,
        infraction_id: InfractionId,
        publish_type: PublishType,
    ) -> RepoResult<bool> {
        self.outage.check()?;
        Ok(self.rows.write().remove(&(infraction_id, publish_type)).is_some())
    }

    async fn delete_all(&self, infraction_id: InfractionId) -> RepoResult<u64> {
        self.outage.check()?;
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|(id, _), _| *id != infraction_id);
        Ok((before - rows.len()) as u64)
    }
}
