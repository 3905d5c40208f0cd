//! Expiry Scheduler Integration Tests
//!
//! Sweeps are driven with an explicit `now` so nothing waits on the clock,
//! except the spawned-loop tests at the end.
//!
//! Run with: cargo test -p integration-tests --test scheduler_tests

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use integration_tests::{
    admin, wait_until, ActorCall, ActorOp, TestHarness, GENERAL_ID, GUILD_ID, MUTE_ROLE_ID,
};
use warden_core::traits::LogSeverity;
use warden_core::value_objects::Snowflake;

const USER: Snowflake = Snowflake::new(10);

async fn muted(h: &TestHarness, minutes: i64) {
    let member = h.member(10);
    let outcome = h
        .moderation()
        .mute(&admin(), GUILD_ID, &[member], Duration::minutes(minutes), "loud")
        .await
        .unwrap();
    assert!(outcome.is_complete());
}

fn removal_calls(h: &TestHarness) -> usize {
    h.actor
        .role_calls(GUILD_ID, USER)
        .iter()
        .filter(|c| matches!(c, ActorCall::SetMemberRole { present: false, .. }))
        .count()
}

// ============================================================================
// Mutes
// ============================================================================

#[tokio::test]
async fn test_expired_mute_is_reversed_once() {
    let h = TestHarness::new().await.unwrap();
    muted(&h, 10).await;

    let report = h.scheduler().sweep(Utc::now() + Duration::minutes(11)).await;

    assert_eq!(report.mutes_reversed, 1);
    assert_eq!(report.processed(), 1);
    assert!(h.store.mutes.is_empty());
    assert_eq!(removal_calls(&h), 1);
    assert!(!h.actor.has_role(GUILD_ID, USER, MUTE_ROLE_ID));
    assert_eq!(h.actor.direct_messages(USER), vec!["Your mute in Test Guild has expired."]);
    assert!(h
        .mod_log()
        .iter()
        .any(|m| m.body == "user10#0010 mute expired."));
}

#[tokio::test]
async fn test_future_mute_survives_sweep() {
    let h = TestHarness::new().await.unwrap();
    muted(&h, 10).await;

    let report = h.scheduler().sweep(Utc::now()).await;

    assert!(report.is_empty());
    assert_eq!(h.store.mutes.len(), 1);
    assert_eq!(removal_calls(&h), 0);
    assert!(h.actor.has_role(GUILD_ID, USER, MUTE_ROLE_ID));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unmute_racing_sweep_removes_role_once() {
    let h = TestHarness::new().await.unwrap();
    muted(&h, 10).await;
    let member = h.member(10);
    let scheduler = h.scheduler();
    let moderation = h.moderation();
    let admin = admin();

    let (unmuted, _report) = tokio::join!(
        moderation.unmute(&admin, GUILD_ID, std::slice::from_ref(&member)),
        scheduler.sweep(Utc::now() + Duration::minutes(11)),
    );

    let unmuted = unmuted.expect("unmute must not fail");
    assert!(unmuted.is_complete());
    assert!(h.store.mutes.is_empty());
    assert_eq!(h.actor.effective_removals(GUILD_ID, USER, MUTE_ROLE_ID), 1);
    assert!(!h.actor.has_role(GUILD_ID, USER, MUTE_ROLE_ID));
}

#[tokio::test]
async fn test_mute_without_role_setting_is_dropped_without_role_call() {
    let h = TestHarness::new().await.unwrap();
    muted(&h, 10).await;
    h.clear_mute_role().await.unwrap();

    let report = h.scheduler().sweep(Utc::now() + Duration::minutes(11)).await;

    assert_eq!(report.mutes_dropped, 1);
    assert_eq!(report.mutes_reversed, 0);
    assert!(h.store.mutes.is_empty());
    assert_eq!(removal_calls(&h), 0);
}

#[tokio::test]
async fn test_mute_in_deleted_guild_is_dropped() {
    let h = TestHarness::new().await.unwrap();
    muted(&h, 10).await;
    h.actor.remove_guild(GUILD_ID);

    let report = h.scheduler().sweep(Utc::now() + Duration::minutes(11)).await;

    assert_eq!(report.mutes_dropped, 1);
    assert!(h.store.mutes.is_empty());
}

#[tokio::test]
async fn test_departed_member_mute_still_expires() {
    let h = TestHarness::new().await.unwrap();
    muted(&h, 10).await;
    h.actor.remove_member(GUILD_ID, USER);

    let report = h.scheduler().sweep(Utc::now() + Duration::minutes(11)).await;

    assert_eq!(report.mutes_reversed, 1);
    assert_eq!(removal_calls(&h), 0);
    assert!(h.store.mutes.is_empty());
}

#[tokio::test]
async fn test_refused_role_removal_drops_row() {
    let h = TestHarness::new().await.unwrap();
    muted(&h, 10).await;
    h.actor.fail(ActorOp::SetMemberRole);

    let report = h.scheduler().sweep(Utc::now() + Duration::minutes(11)).await;

    assert_eq!(report.mutes_dropped, 1);
    assert!(h.store.mutes.is_empty());
}

#[tokio::test]
async fn test_failed_notification_does_not_block_expiry() {
    let h = TestHarness::new().await.unwrap();
    muted(&h, 10).await;
    h.actor.fail(ActorOp::DirectNotify);

    let report = h.scheduler().sweep(Utc::now() + Duration::minutes(11)).await;

    assert_eq!(report.mutes_reversed, 1);
    assert!(h.actor.direct_messages(USER).is_empty());
}

#[tokio::test]
async fn test_timed_out_reversal_is_retried_next_tick() {
    let h = TestHarness::new().await.unwrap();
    muted(&h, 10).await;
    h.actor.hang(ActorOp::SetMemberRole);
    let later = Utc::now() + Duration::minutes(11);

    let report = h.scheduler().sweep(later).await;
    assert_eq!(report.deferred, 1);
    assert_eq!(report.processed(), 0);
    assert_eq!(h.store.mutes.len(), 1);

    h.actor.recover(ActorOp::SetMemberRole);
    let report = h.scheduler().sweep(later).await;
    assert_eq!(report.mutes_reversed, 1);
    assert!(h.store.mutes.is_empty());
}

#[tokio::test]
async fn test_storage_outage_keeps_rows() {
    let h = TestHarness::new().await.unwrap();
    muted(&h, 10).await;
    let later = Utc::now() + Duration::minutes(11);

    h.store.set_unavailable(true);
    let report = h.scheduler().sweep(later).await;
    assert!(report.is_empty());

    h.store.set_unavailable(false);
    assert_eq!(h.store.mutes.len(), 1);
    let report = h.scheduler().sweep(later).await;
    assert_eq!(report.mutes_reversed, 1);
}

#[tokio::test]
async fn test_every_due_mute_is_processed_in_one_sweep() {
    let h = TestHarness::new().await.unwrap();
    let members = [h.member(10), h.member(11), h.member(12)];
    h.moderation()
        .mute(&admin(), GUILD_ID, &members, Duration::minutes(10), "raid")
        .await
        .unwrap();
    h.actor.remove_member(GUILD_ID, Snowflake::new(11));

    let report = h.scheduler().sweep(Utc::now() + Duration::minutes(11)).await;

    assert_eq!(report.mutes_reversed, 3);
    assert!(h.store.mutes.is_empty());
    assert!(!h.actor.has_role(GUILD_ID, Snowflake::new(10), MUTE_ROLE_ID));
    assert!(!h.actor.has_role(GUILD_ID, Snowflake::new(12), MUTE_ROLE_ID));
}

// ============================================================================
// Locks
// ============================================================================

#[tokio::test]
async fn test_expired_lock_restores_channel() {
    let h = TestHarness::new().await.unwrap();
    h.moderation()
        .lock(&admin(), GUILD_ID, GENERAL_ID, Duration::minutes(5), "cooldown")
        .await
        .unwrap();
    assert!(!h.actor.can_send(GENERAL_ID, GUILD_ID));

    let report = h.scheduler().sweep(Utc::now() + Duration::minutes(6)).await;

    assert_eq!(report.locks_reversed, 1);
    assert!(h.actor.can_send(GENERAL_ID, GUILD_ID));
    assert!(h.store.locks.is_empty());
    assert!(h
        .mod_log()
        .iter()
        .any(|m| m.body == format!("<#{GENERAL_ID}> was unlocked by Warden")));
}

#[tokio::test]
async fn test_lock_on_deleted_channel_is_dropped() {
    let h = TestHarness::new().await.unwrap();
    h.moderation()
        .lock(&admin(), GUILD_ID, GENERAL_ID, Duration::minutes(5), "")
        .await
        .unwrap();
    h.actor.remove_channel(GUILD_ID, GENERAL_ID);

    let report = h.scheduler().sweep(Utc::now() + Duration::minutes(6)).await;

    assert_eq!(report.locks_dropped, 1);
    assert!(h.store.locks.is_empty());
    assert!(h
        .mod_log()
        .iter()
        .any(|m| m.body == format!("Lock on <#{GENERAL_ID}> expired but the channel could not be restored")));
}

#[tokio::test]
async fn test_refused_restore_still_deletes_lock() {
    let h = TestHarness::new().await.unwrap();
    h.moderation()
        .lock(&admin(), GUILD_ID, GENERAL_ID, Duration::minutes(5), "")
        .await
        .unwrap();
    h.actor.fail(ActorOp::SetChannelSend);

    let report = h.scheduler().sweep(Utc::now() + Duration::minutes(6)).await;

    assert_eq!(report.locks_dropped, 1);
    assert!(h.store.locks.is_empty());
    let entry = h
        .mod_log()
        .into_iter()
        .find(|m| m.body.ends_with("could not be restored"))
        .expect("a dropped lock is still reported");
    assert_eq!(entry.severity, LogSeverity::Automatic);
}

// ============================================================================
// Spawned loop
// ============================================================================

#[tokio::test]
async fn test_spawned_scheduler_reverses_and_shuts_down() {
    let h = TestHarness::new().await.unwrap();
    let member = h.member(10);
    h.moderation()
        .mute(&admin(), GUILD_ID, &[member], Duration::milliseconds(50), "brief")
        .await
        .unwrap();

    let handle = h.scheduler().spawn();
    let reversed = wait_until(StdDuration::from_secs(3), || h.store.mutes.is_empty()).await;
    assert!(reversed, "mute should expire within the timeout");
    assert!(!h.actor.has_role(GUILD_ID, USER, MUTE_ROLE_ID));

    handle.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_stops_the_loop() {
    let h = TestHarness::new().await.unwrap();
    let handle = h.scheduler().spawn();
    assert!(!handle.is_finished());

    tokio::time::timeout(StdDuration::from_secs(2), handle.shutdown())
        .await
        .expect("shutdown should complete promptly");
}
