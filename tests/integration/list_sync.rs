//! Integration tests for pinned-list synchronization.
//!
//! Exercises the synchronizer against the loopback provider: self-healing
//! after external deletions, rebuild semantics, channel failures, pin
//! failures, truncation, and mention suppression.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use taskpin::channel::{ChannelKind, LoopbackProvider};
use taskpin::list::{ListSynchronizer, SyncError, SyncMode, SyncOutcome};
use taskpin::store::{ConfigStore, MemoryConfigStore, MemoryTaskStore, TaskStore};
use taskpin_proto::config::ServerConfig;
use taskpin_proto::task::{Task, TaskId, TaskStatus};

type Synchronizer =
    ListSynchronizer<Arc<LoopbackProvider>, Arc<MemoryTaskStore>, Arc<MemoryConfigStore>>;

struct Fixture {
    provider: Arc<LoopbackProvider>,
    tasks: Arc<MemoryTaskStore>,
    configs: Arc<MemoryConfigStore>,
    sync: Synchronizer,
}

async fn fixture() -> Fixture {
    let provider = Arc::new(LoopbackProvider::new());
    provider.add_channel("channel-1", ChannelKind::Text).await;
    let tasks = Arc::new(MemoryTaskStore::new());
    let configs = Arc::new(MemoryConfigStore::new());

    let mut config = ServerConfig::new("guild-1");
    config.task_list_channel_id = Some("channel-1".to_string());
    configs.upsert(&config).await.unwrap();

    let sync = ListSynchronizer::new(
        Arc::clone(&provider),
        Arc::clone(&tasks),
        Arc::clone(&configs),
        "taskpin",
    );
    Fixture {
        provider,
        tasks,
        configs,
        sync,
    }
}

fn make_task(sequence: u64, day: u32) -> Task {
    let at = Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap();
    Task {
        id: TaskId::new(sequence),
        guild_id: "guild-1".to_string(),
        goal_id: None,
        title: format!("Task {sequence}"),
        notes: None,
        assignee_id: None,
        creator_id: "member-1".to_string(),
        due_at: at,
        status: TaskStatus::Open,
        created_at: at,
        updated_at: at,
    }
}

fn created_id(outcome: SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Created { message_id } => message_id,
        other => panic!("expected Created, got {other:?}"),
    }
}

async fn stored_id(configs: &MemoryConfigStore) -> Option<String> {
    configs
        .get("guild-1")
        .await
        .unwrap()
        .unwrap()
        .task_list_message_id
}

async fn message_text(provider: &LoopbackProvider, message_id: &str) -> String {
    provider
        .message("channel-1", message_id)
        .await
        .unwrap()
        .payload
        .blocks
        .iter()
        .filter_map(|b| b.as_text().map(String::from))
        .collect::<Vec<_>>()
        .join("\n")
}

// --- self-heal ---

#[tokio::test]
async fn update_self_heals_after_external_deletion() {
    let f = fixture().await;
    let first = created_id(f.sync.sync("guild-1", SyncMode::Update).await.unwrap());

    // Someone deletes the pinned message out from under the bot.
    f.provider.drop_message("channel-1", &first).await;

    let outcome = f.sync.sync("guild-1", SyncMode::Update).await.unwrap();
    let second = created_id(outcome);
    assert_ne!(second, first);

    // Exactly one new message exists and the stored id points at it.
    assert_eq!(f.provider.message_count("channel-1").await, 1);
    assert_eq!(stored_id(&f.configs).await.as_deref(), Some(second.as_str()));
}

#[tokio::test]
async fn update_edits_in_place_when_message_survives() {
    let f = fixture().await;
    let id = created_id(f.sync.sync("guild-1", SyncMode::Update).await.unwrap());

    f.tasks.insert(&make_task(1, 10)).await.unwrap();
    let outcome = f.sync.sync("guild-1", SyncMode::Update).await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Edited {
            message_id: id.clone()
        }
    );
    assert!(message_text(&f.provider, &id).await.contains("**T-001**"));
    assert_eq!(f.provider.counts().await.sent, 1);
}

// --- rebuild ---

#[tokio::test]
async fn rebuild_twice_creates_two_messages_and_keeps_the_last() {
    let f = fixture().await;
    let first = created_id(f.sync.sync("guild-1", SyncMode::Rebuild).await.unwrap());
    let second = created_id(f.sync.sync("guild-1", SyncMode::Rebuild).await.unwrap());
    assert_ne!(first, second);

    let counts = f.provider.counts().await;
    assert_eq!(counts.sent, 2);
    // At most one delete attempt per call: none on the first (no recorded
    // id), one on the second.
    assert_eq!(counts.deleted + counts.failed_deletes, 1);
    assert_eq!(stored_id(&f.configs).await.as_deref(), Some(second.as_str()));
    assert_eq!(f.provider.message_count("channel-1").await, 1);
}

#[tokio::test]
async fn rebuild_never_edits() {
    let f = fixture().await;
    f.sync.sync("guild-1", SyncMode::Rebuild).await.unwrap();
    f.tasks.insert(&make_task(1, 10)).await.unwrap();
    f.sync.sync("guild-1", SyncMode::Rebuild).await.unwrap();
    assert_eq!(f.provider.counts().await.edited, 0);
}

// --- configuration states ---

#[tokio::test]
async fn missing_config_record_is_a_no_op() {
    let provider = Arc::new(LoopbackProvider::new());
    let sync = ListSynchronizer::new(
        Arc::clone(&provider),
        Arc::new(MemoryTaskStore::new()),
        Arc::new(MemoryConfigStore::new()),
        "taskpin",
    );
    for mode in [SyncMode::Update, SyncMode::Rebuild] {
        assert_eq!(
            sync.sync("guild-1", mode).await.unwrap(),
            SyncOutcome::NotConfigured
        );
    }
    assert_eq!(provider.counts().await.sent, 0);
}

#[tokio::test]
async fn config_without_channel_is_a_no_op() {
    let f = fixture().await;
    let mut config = f.configs.get("guild-1").await.unwrap().unwrap();
    config.task_list_channel_id = None;
    f.configs.upsert(&config).await.unwrap();

    assert_eq!(
        f.sync.sync("guild-1", SyncMode::Update).await.unwrap(),
        SyncOutcome::NotConfigured
    );
}

#[tokio::test]
async fn vanished_channel_is_reported_and_config_untouched() {
    let f = fixture().await;
    f.sync.sync("guild-1", SyncMode::Update).await.unwrap();
    f.provider.remove_channel("channel-1").await;

    let err = f.sync.sync("guild-1", SyncMode::Update).await.unwrap_err();
    assert!(matches!(err, SyncError::ChannelUnavailable { .. }));

    // Reconfiguration is explicit: the stored channel id survives.
    let config = f.configs.get("guild-1").await.unwrap().unwrap();
    assert_eq!(config.task_list_channel_id.as_deref(), Some("channel-1"));
}

// --- pin behavior ---

#[tokio::test]
async fn pin_refusal_does_not_fail_the_sync() {
    let f = fixture().await;
    f.provider.set_fail_pins(true).await;

    let id = created_id(f.sync.sync("guild-1", SyncMode::Update).await.unwrap());
    assert_eq!(stored_id(&f.configs).await.as_deref(), Some(id.as_str()));
    assert!(!f.provider.message("channel-1", &id).await.unwrap().pinned);

    // Once pins work again, the next created message is pinned.
    f.provider.set_fail_pins(false).await;
    let id = created_id(f.sync.sync("guild-1", SyncMode::Rebuild).await.unwrap());
    assert!(f.provider.message("channel-1", &id).await.unwrap().pinned);
}

// --- rendered content ---

#[tokio::test]
async fn list_payload_suppresses_mentions_and_sorts_by_due_date() {
    let f = fixture().await;
    for (sequence, day) in [(2, 20), (3, 20), (1, 5)] {
        let mut task = make_task(sequence, day);
        task.assignee_id = Some(format!("member-{sequence}"));
        f.tasks.insert(&task).await.unwrap();
    }

    let id = created_id(f.sync.sync("guild-1", SyncMode::Update).await.unwrap());
    let message = f.provider.message("channel-1", &id).await.unwrap();
    assert!(message.payload.suppress_mentions);

    let text = message_text(&f.provider, &id).await;
    let pos = |needle: &str| text.find(needle).unwrap();
    // T-001 is due soonest; T-002 and T-003 tie and break by id.
    assert!(pos("**T-001**") < pos("**T-002**"));
    assert!(pos("**T-002**") < pos("**T-003**"));
}

#[tokio::test]
async fn oversized_lists_truncate_with_a_notice() {
    let f = fixture().await;
    let sync = ListSynchronizer::new(
        Arc::clone(&f.provider),
        Arc::clone(&f.tasks),
        Arc::clone(&f.configs),
        "taskpin",
    )
    .with_max_blocks(10);

    for sequence in 1..=20 {
        f.tasks.insert(&make_task(sequence, 10)).await.unwrap();
    }

    let id = created_id(sync.sync("guild-1", SyncMode::Update).await.unwrap());
    let text = message_text(&f.provider, &id).await;
    assert!(text.contains("hidden due to message limits"));
    assert!(!text.contains("**T-020**"));
    // Footer still present after the notice.
    assert!(text.contains("Last updated"));
}

#[tokio::test]
async fn completed_tasks_never_render() {
    let f = fixture().await;
    f.tasks.insert(&make_task(1, 10)).await.unwrap();
    let mut done = make_task(2, 11);
    done.status = TaskStatus::Complete;
    f.tasks.insert(&done).await.unwrap();

    let id = created_id(f.sync.sync("guild-1", SyncMode::Update).await.unwrap());
    let text = message_text(&f.provider, &id).await;
    assert!(text.contains("**T-001**"));
    assert!(!text.contains("**T-002**"));
}
