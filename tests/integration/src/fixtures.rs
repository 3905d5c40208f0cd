//! Test fixtures and data generators
//!
//! Provides reusable ids, users and moderators for integration tests.

use std::sync::atomic::{AtomicI64, Ordering};

use warden_core::entities::DbUser;
use warden_core::value_objects::{ModeratorContext, Permissions, Snowflake};
use warden_service::ActingModerator;

/// Counter for unique test ids
static COUNTER: AtomicI64 = AtomicI64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> i64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A snowflake no other test in this process uses
///
/// Offset by the clock so reruns against the same database don't collide.
pub fn unique_snowflake() -> Snowflake {
    let base = chrono::Utc::now().timestamp_millis() << 16;
    Snowflake::new(base + unique_suffix())
}

pub const GUILD_ID: Snowflake = Snowflake::new(100);
pub const MUTE_ROLE_ID: Snowflake = Snowflake::new(200);
pub const MOD_LOG_ID: Snowflake = Snowflake::new(300);
pub const PUBLIC_LOG_ID: Snowflake = Snowflake::new(301);
pub const GENERAL_ID: Snowflake = Snowflake::new(302);

pub fn user(id: i64) -> DbUser {
    DbUser::new(Snowflake::new(id), format!("user{id}#{:04}", id % 10_000))
}

/// A moderator holding exactly `permissions`
pub fn moderator_with(id: i64, permissions: Permissions) -> ActingModerator {
    ActingModerator::new(
        DbUser::new(Snowflake::new(id), format!("mod{id}#0001")),
        ModeratorContext {
            user_id: Snowflake::new(id),
            permissions,
            top_role_position: 10,
            is_guild_owner: false,
            is_bot_owner: false,
        },
    )
}

/// A moderator allowed to do everything
pub fn admin() -> ActingModerator {
    moderator_with(1, Permissions::ADMINISTRATOR)
}

/// Only allowed to manage messages (and so lock channels)
pub fn helper() -> ActingModerator {
    moderator_with(2, Permissions::MANAGE_MESSAGES)
}
