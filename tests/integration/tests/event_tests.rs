//! Platform Event Integration Tests
//!
//! Ban reconciliation, first-contact guild setup and mute re-application,
//! plus event dispatch through the runtime.
//!
//! Run with: cargo test -p integration-tests --test event_tests

use chrono::{Duration, Utc};
use integration_tests::{
    admin, fast_scheduler, user, TestHarness, GUILD_ID, MUTE_ROLE_ID,
};
use warden_common::ModerationSettings;
use warden_core::entities::{DbUser, GuildSettings, InfractionKind};
use warden_core::events::PlatformEvent;
use warden_core::value_objects::Snowflake;
use warden_service::{Runtime, ServiceContextBuilder};

const USER: Snowflake = Snowflake::new(10);

async fn bans(h: &TestHarness) -> Vec<warden_core::entities::Infraction> {
    h.ledger().find_bans_for_user(USER, GUILD_ID).await.unwrap()
}

// ============================================================================
// Guilds
// ============================================================================

#[tokio::test]
async fn test_guild_available_creates_default_settings() {
    let h = TestHarness::new().await.unwrap();
    let new_guild = Snowflake::new(555);
    assert!(h.policy().find_by_id(new_guild).await.unwrap().is_none());

    h.events()
        .dispatch(&PlatformEvent::GuildAvailable { guild_id: new_guild })
        .await
        .unwrap();

    let settings = h.policy().find_by_id(new_guild).await.unwrap();
    assert_eq!(settings, Some(GuildSettings::new(new_guild)));
}

#[tokio::test]
async fn test_guild_available_keeps_existing_settings() {
    let h = TestHarness::new().await.unwrap();
    let before = h.policy().resolve(GUILD_ID).await.unwrap();

    h.events().on_guild_available(GUILD_ID).await.unwrap();

    assert_eq!(h.policy().resolve(GUILD_ID).await.unwrap(), before);
}

// ============================================================================
// Bans
// ============================================================================

#[tokio::test]
async fn test_external_ban_is_recorded() {
    let h = TestHarness::new().await.unwrap();

    let recorded = h.events().on_member_banned(GUILD_ID, &user(10)).await.unwrap();

    assert!(recorded);
    let bans = bans(&h).await;
    assert_eq!(bans.len(), 1);
    assert!(bans[0].moderator.is_unknown());
    assert!(bans[0].reason.is_empty());

    let log = h.mod_log();
    assert_eq!(log.len(), 1);
    assert!(log[0]
        .footer
        .as_deref()
        .is_some_and(|f| f.starts_with("Reason can be updated")));
}

#[tokio::test]
async fn test_ban_event_after_bot_ban_is_not_duplicated() {
    let h = TestHarness::new().await.unwrap();
    h.moderation().ban(&admin(), GUILD_ID, &user(10), "raid").await.unwrap();

    let recorded = h.events().on_member_banned(GUILD_ID, &user(10)).await.unwrap();

    assert!(!recorded);
    assert_eq!(bans(&h).await.len(), 1);
}

#[tokio::test]
async fn test_ban_event_racing_bot_ban_records_once() {
    let h = TestHarness::with_moderation(ModerationSettings {
        ban_settle_secs: 1,
        ..ModerationSettings::default()
    })
    .await
    .unwrap();
    let events = h.events();
    let moderation = h.moderation();
    let admin = admin();
    let target = user(10);

    let (event, command) = tokio::join!(
        events.on_member_banned(GUILD_ID, &target),
        moderation.ban(&admin, GUILD_ID, &target, "raid"),
    );

    assert!(!event.unwrap());
    assert!(command.is_ok());
    let bans = bans(&h).await;
    assert_eq!(bans.len(), 1);
    assert_eq!(bans[0].moderator, admin.user);
}

#[tokio::test]
async fn test_ban_outside_window_is_recorded_again() {
    let h = TestHarness::new().await.unwrap();
    let ledger = h.ledger();
    let mut old = ledger.create(user(10), admin().user, GUILD_ID, "old", InfractionKind::Ban);
    old.issued_at = Utc::now() - Duration::hours(2);
    ledger.save(&old).await.unwrap();

    let recorded = h.events().on_member_banned(GUILD_ID, &user(10)).await.unwrap();

    assert!(recorded);
    assert_eq!(bans(&h).await.len(), 2);
}

#[tokio::test]
async fn test_unban_event_pardons_newest_ban() {
    let h = TestHarness::new().await.unwrap();
    h.events().on_member_banned(GUILD_ID, &user(10)).await.unwrap();

    let pardoned = h.events().on_member_unbanned(GUILD_ID, &user(10)).await.unwrap();
    assert!(pardoned);

    let ban = &bans(&h).await[0];
    let pardon = ban.pardon.as_ref().expect("ban should be pardoned");
    assert_eq!(pardon.moderator, DbUser::unknown());

    // Nothing left to pardon
    let again = h.events().on_member_unbanned(GUILD_ID, &user(10)).await.unwrap();
    assert!(!again);
}

#[tokio::test]
async fn test_unban_event_after_unban_command_changes_nothing() {
    let h = TestHarness::new().await.unwrap();
    let target = user(10);
    h.moderation().ban(&admin(), GUILD_ID, &target, "raid").await.unwrap();
    h.moderation()
        .unban(&admin(), GUILD_ID, &target, Some("appeal".into()))
        .await
        .unwrap();

    let pardoned = h.events().on_member_unbanned(GUILD_ID, &target).await.unwrap();

    assert!(!pardoned);
    let pardon = bans(&h).await[0].pardon.clone().unwrap();
    assert_eq!(pardon.moderator, admin().user);
    assert_eq!(pardon.reason.as_deref(), Some("appeal"));
}

#[tokio::test]
async fn test_unban_event_without_ban() {
    let h = TestHarness::new().await.unwrap();
    assert!(!h.events().on_member_unbanned(GUILD_ID, &user(10)).await.unwrap());
}

// ============================================================================
// Rejoining members
// ============================================================================

#[tokio::test]
async fn test_rejoining_member_gets_mute_back() {
    let h = TestHarness::new().await.unwrap();
    let member = h.member(10);
    h.moderation()
        .mute(&admin(), GUILD_ID, &[member], Duration::hours(1), "evading")
        .await
        .unwrap();

    h.actor.remove_member(GUILD_ID, USER);
    h.member(10);
    assert!(!h.actor.has_role(GUILD_ID, USER, MUTE_ROLE_ID));

    let applied = h
        .events()
        .dispatch(&PlatformEvent::MemberJoined {
            guild_id: GUILD_ID,
            user: user(10),
        })
        .await;
    assert!(applied.is_ok());
    assert!(h.actor.has_role(GUILD_ID, USER, MUTE_ROLE_ID));
}

#[tokio::test]
async fn test_joining_member_without_mute() {
    let h = TestHarness::new().await.unwrap();
    h.member(10);

    let applied = h.events().on_member_joined(GUILD_ID, &user(10)).await.unwrap();

    assert!(!applied);
    assert!(h.actor.calls().is_empty());
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test]
async fn test_dispatch_json() {
    let h = TestHarness::new().await.unwrap();

    h.events()
        .dispatch_json(r#"{"type":"MEMBER_BANNED","guild_id":"100","user":{"id":"10","name":"user10#0010"}}"#)
        .await
        .unwrap();
    assert_eq!(bans(&h).await.len(), 1);

    let err = h.events().dispatch_json("{\"type\":\"NOPE\"}").await.unwrap_err();
    assert_eq!(err.title(), "Please restate query.");
}

#[tokio::test]
async fn test_runtime_dispatches_on_its_own_task() {
    let h = TestHarness::new().await.unwrap();
    let ctx = ServiceContextBuilder::new()
        .memory(&h.store)
        .actor(h.actor.clone())
        .moderation(ModerationSettings {
            ban_settle_secs: 0,
            ..ModerationSettings::default()
        })
        .build()
        .unwrap();
    let runtime = Runtime::with_context(ctx, fast_scheduler());

    runtime
        .dispatch(PlatformEvent::MemberBanned {
            guild_id: GUILD_ID,
            user: user(10),
        })
        .await
        .unwrap();
    assert_eq!(bans(&h).await.len(), 1);
    assert_eq!(runtime.context().bot_name(), "Warden");

    runtime.shutdown().await;
}
