//! Ledger Integration Tests
//!
//! Infraction persistence, history filtering, pardons and publications,
//! run over the in-memory store and the fake platform.
//!
//! Run with: cargo test -p integration-tests --test ledger_tests

use chrono::{Duration, Utc};
use integration_tests::{admin, user, TestHarness, GUILD_ID, PUBLIC_LOG_ID};
use warden_core::entities::{DbUser, Infraction, InfractionKind, PublishType};
use warden_core::value_objects::{DurationType, InfractionId, Snowflake};

async fn record(h: &TestHarness, user_id: i64, kind: InfractionKind, reason: &str) -> Infraction {
    let ledger = h.ledger();
    ledger
        .save(&ledger.create(user(user_id), admin().user, GUILD_ID, reason, kind))
        .await
        .expect("save failed")
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_save_then_find_round_trips() {
    let h = TestHarness::new().await.unwrap();
    let ledger = h.ledger();

    let draft = ledger.create(user(10), admin().user, GUILD_ID, "spamming", InfractionKind::Warn);
    let saved = ledger.save(&draft).await.unwrap();
    let found = ledger
        .find_by_id(saved.id.unwrap(), GUILD_ID)
        .await
        .unwrap()
        .expect("infraction should exist");

    assert_eq!(found.user, draft.user);
    assert_eq!(found.moderator, draft.moderator);
    assert_eq!(found.guild_id, draft.guild_id);
    assert_eq!(found.reason, draft.reason);
    assert_eq!(found.kind, draft.kind);
    assert!(found.pardon.is_none());
}

#[tokio::test]
async fn test_find_is_scoped_to_guild() {
    let h = TestHarness::new().await.unwrap();
    let saved = record(&h, 10, InfractionKind::Warn, "x").await;

    let other = h
        .ledger()
        .find_by_id(saved.id.unwrap(), Snowflake::new(999))
        .await
        .unwrap();
    assert!(other.is_none());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let h = TestHarness::new().await.unwrap();
    let saved = record(&h, 10, InfractionKind::Mute, "loud").await;
    let id = saved.id.unwrap();

    h.ledger().delete(id).await.unwrap();
    assert!(h.ledger().find_by_id(id, GUILD_ID).await.unwrap().is_none());

    // Second delete must not error
    h.ledger().delete(id).await.unwrap();
    h.ledger().delete(InfractionId::new(424_242)).await.unwrap();
}

#[tokio::test]
async fn test_delete_removes_sub_records() {
    let h = TestHarness::new().await.unwrap();
    let ban = record(&h, 10, InfractionKind::Ban, "raid").await;
    let id = ban.id.unwrap();

    h.ledger().publish(&ban, PUBLIC_LOG_ID, PublishType::Ban).await.unwrap();
    let ban = h.ledger().pardon_ban(&ban, &admin().user, None).await.unwrap();
    assert!(ban.is_pardoned());

    h.ledger().delete(id).await.unwrap();
    assert_eq!(h.store.published.count_for(id), 0);
    assert!(h.ledger().find_by_id(id, GUILD_ID).await.unwrap().is_none());
}

// ============================================================================
// Pardons
// ============================================================================

#[tokio::test]
async fn test_pardoning_ban_is_rejected() {
    let h = TestHarness::new().await.unwrap();
    let ban = record(&h, 10, InfractionKind::Ban, "raid").await;

    let err = h
        .ledger()
        .pardon(&ban, &admin().user, Some("sorry".into()))
        .await
        .unwrap_err();
    assert!(err.is_invalid_operation());
    assert!(err.to_string().contains("use unban"));

    let reloaded = h.ledger().find_by_id(ban.id.unwrap(), GUILD_ID).await.unwrap().unwrap();
    assert!(reloaded.pardon.is_none());
}

#[tokio::test]
async fn test_pardoning_warn_and_mute_succeeds() {
    let h = TestHarness::new().await.unwrap();

    for kind in [InfractionKind::Warn, InfractionKind::Mute] {
        let infraction = record(&h, 10, kind, "x").await;
        h.ledger()
            .pardon(&infraction, &admin().user, Some("appealed".into()))
            .await
            .unwrap();

        let found = h
            .ledger()
            .find_by_id(infraction.id.unwrap(), GUILD_ID)
            .await
            .unwrap()
            .unwrap();
        let pardon = found.pardon.expect("pardon should be populated");
        assert_eq!(pardon.reason.as_deref(), Some("appealed"));
        assert_eq!(pardon.moderator, admin().user);
    }
}

#[tokio::test]
async fn test_repardon_updates_reason_only() {
    let h = TestHarness::new().await.unwrap();
    let warn = record(&h, 10, InfractionKind::Warn, "x").await;

    let first = h.ledger().pardon(&warn, &admin().user, Some("first".into())).await.unwrap();
    let second = h
        .ledger()
        .pardon(&first, &user(55), Some("second".into()))
        .await
        .unwrap();

    let before = first.pardon.unwrap();
    let after = second.pardon.unwrap();
    assert_eq!(after.reason.as_deref(), Some("second"));
    assert_eq!(after.moderator, before.moderator);
    assert_eq!(after.pardon_on, before.pardon_on);
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn test_history_hides_old_infractions_but_lookup_does_not() {
    let h = TestHarness::new().await.unwrap();
    let mut settings = h.policy().resolve(GUILD_ID).await.unwrap();
    settings.duration_type = DurationType::Days;
    settings.duration = 30;
    h.policy().save(&settings).await.unwrap();

    let ledger = h.ledger();
    let mut old = ledger.create(user(10), admin().user, GUILD_ID, "old", InfractionKind::Warn);
    old.issued_at = Utc::now() - Duration::days(31);
    let old = ledger.save(&old).await.unwrap();
    let recent = record(&h, 10, InfractionKind::Warn, "recent").await;

    let warns = ledger.find_warns_for_user(Snowflake::new(10), GUILD_ID).await.unwrap();
    assert_eq!(warns.len(), 1);
    assert_eq!(warns[0].id, recent.id);

    let all = ledger.find_all_for_user(Snowflake::new(10), GUILD_ID).await.unwrap();
    assert!(all.iter().all(|i| i.id != old.id));

    let direct = ledger.find_by_id(old.id.unwrap(), GUILD_ID).await.unwrap();
    assert_eq!(direct.map(|i| i.reason), Some("old".to_string()));
}

#[tokio::test]
async fn test_history_views_filter_by_kind() {
    let h = TestHarness::new().await.unwrap();
    record(&h, 10, InfractionKind::Warn, "w").await;
    record(&h, 10, InfractionKind::Mute, "m").await;
    record(&h, 10, InfractionKind::Ban, "b").await;
    record(&h, 11, InfractionKind::Warn, "someone else").await;

    let ledger = h.ledger();
    let uid = Snowflake::new(10);
    assert_eq!(ledger.find_all_for_user(uid, GUILD_ID).await.unwrap().len(), 3);
    assert_eq!(ledger.find_warns_for_user(uid, GUILD_ID).await.unwrap().len(), 1);
    assert_eq!(ledger.find_mutes_for_user(uid, GUILD_ID).await.unwrap().len(), 1);
    assert_eq!(ledger.find_bans_for_user(uid, GUILD_ID).await.unwrap().len(), 1);

    let all = ledger.find_all_for_user(uid, GUILD_ID).await.unwrap();
    assert!(all.windows(2).all(|w| w[0].issued_at <= w[1].issued_at));
}

#[tokio::test]
async fn test_mod_action_counts() {
    let h = TestHarness::new().await.unwrap();
    record(&h, 10, InfractionKind::Warn, "").await;
    record(&h, 11, InfractionKind::Warn, "").await;
    record(&h, 12, InfractionKind::Ban, "").await;

    let counts = h.ledger().find_mod_actions(admin().user.id, GUILD_ID).await.unwrap();
    assert_eq!((counts.warns, counts.mutes, counts.bans), (2, 0, 1));
}

#[tokio::test]
async fn test_find_recent_ban_respects_window() {
    let h = TestHarness::new().await.unwrap();
    let ledger = h.ledger();
    let mut old = ledger.create(user(10), DbUser::unknown(), GUILD_ID, "", InfractionKind::Ban);
    old.issued_at = Utc::now() - Duration::hours(2);
    let old = ledger.save(&old).await.unwrap();

    let within_hour = ledger
        .find_recent_ban_by_id(Snowflake::new(10), GUILD_ID, Some(Duration::hours(1)))
        .await
        .unwrap();
    assert!(within_hour.is_none());

    let any = ledger
        .find_recent_ban_by_id(Snowflake::new(10), GUILD_ID, None)
        .await
        .unwrap();
    assert_eq!(any.and_then(|i| i.id), old.id);
}

// ============================================================================
// Publications
// ============================================================================

#[tokio::test]
async fn test_reason_update_rerenders_publication() {
    let h = TestHarness::new().await.unwrap();
    let ban = record(&h, 10, InfractionKind::Ban, "raid").await;
    let published = h.ledger().publish(&ban, PUBLIC_LOG_ID, PublishType::Ban).await.unwrap();

    let ban = h.ledger().find_by_id(ban.id.unwrap(), GUILD_ID).await.unwrap().unwrap();
    let updated = h.ledger().update_reason(&ban, "raid with alts", None).await.unwrap();

    assert_eq!(updated.published_ban.as_ref(), Some(&published));
    let message = h.actor.message(published.message_id).expect("message should exist");
    assert!(message.message.body.contains("raid with alts"));
    assert_eq!(message.edits, 1);
}

#[tokio::test]
async fn test_reason_update_purges_deleted_publication() {
    let h = TestHarness::new().await.unwrap();
    let ban = record(&h, 10, InfractionKind::Ban, "raid").await;
    let published = h.ledger().publish(&ban, PUBLIC_LOG_ID, PublishType::Ban).await.unwrap();
    h.actor.delete_message(published.message_id);

    let ban = h.ledger().find_by_id(ban.id.unwrap(), GUILD_ID).await.unwrap().unwrap();
    let updated = h
        .ledger()
        .update_reason(&ban, "new reason", None)
        .await
        .expect("a vanished message must not fail the reason update");

    assert_eq!(updated.reason, "new reason");
    assert!(updated.published_ban.is_none());
    let reloaded = h.ledger().find_by_id(ban.id.unwrap(), GUILD_ID).await.unwrap().unwrap();
    assert!(reloaded.published_ban.is_none());
}

#[tokio::test]
async fn test_publish_unban_requires_pardon() {
    let h = TestHarness::new().await.unwrap();
    let ban = record(&h, 10, InfractionKind::Ban, "raid").await;

    let err = h
        .ledger()
        .publish(&ban, PUBLIC_LOG_ID, PublishType::Unban)
        .await
        .unwrap_err();
    assert!(err.is_invalid_operation());

    let warn = record(&h, 10, InfractionKind::Warn, "x").await;
    let err = h
        .ledger()
        .publish(&warn, PUBLIC_LOG_ID, PublishType::Ban)
        .await
        .unwrap_err();
    assert!(err.is_invalid_operation());
    assert!(h.public_log().is_empty());
}

#[tokio::test]
async fn test_unban_publication_follows_pardon_reason() {
    let h = TestHarness::new().await.unwrap();
    let ban = record(&h, 10, InfractionKind::Ban, "raid").await;
    let ban = h
        .ledger()
        .pardon_ban(&ban, &admin().user, Some("appeal".into()))
        .await
        .unwrap();
    let published = h.ledger().publish(&ban, PUBLIC_LOG_ID, PublishType::Unban).await.unwrap();

    h.ledger()
        .pardon_ban(&ban, &admin().user, Some("appeal accepted".into()))
        .await
        .unwrap();

    let message = h.actor.message(published.message_id).unwrap();
    assert!(message.message.body.contains("appeal accepted"));
}
