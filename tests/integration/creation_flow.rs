//! Integration tests for the task creation flow.
//!
//! Drives the bounded-wait state machine with explicit clocks: happy paths,
//! validation re-prompts, timeout default transitions, and failure
//! isolation between persistence and list rendering.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use taskpin::channel::{ChannelKind, LoopbackProvider};
use taskpin::flow::{
    AssignmentChoice, CHOICE_TIMEOUT_SECS, CreationFlows, FlowError, INPUT_TIMEOUT_SECS,
    ModalFields, SELECTION_TIMEOUT_SECS,
};
use taskpin::ids::IdIssuer;
use taskpin::list::ListSynchronizer;
use taskpin::store::{
    ConfigStore, CounterStore, MemoryConfigStore, MemoryCounterStore, MemoryTaskStore, StoreError,
    TaskStore,
};
use taskpin_proto::config::ServerConfig;
use taskpin_proto::task::{Task, TaskId, TaskStatus};

type Flows<N = MemoryCounterStore> = CreationFlows<
    Arc<LoopbackProvider>,
    Arc<MemoryTaskStore>,
    Arc<MemoryConfigStore>,
    Arc<N>,
>;

struct Fixture<N: CounterStore = MemoryCounterStore> {
    provider: Arc<LoopbackProvider>,
    tasks: Arc<MemoryTaskStore>,
    configs: Arc<MemoryConfigStore>,
    flows: Flows<N>,
}

async fn fixture_with_counters<N: CounterStore>(counters: N) -> Fixture<N> {
    let provider = Arc::new(LoopbackProvider::new());
    provider.add_channel("channel-1", ChannelKind::Text).await;
    let tasks = Arc::new(MemoryTaskStore::new());
    let configs = Arc::new(MemoryConfigStore::new());

    let mut config = ServerConfig::new("guild-1");
    config.task_list_channel_id = Some("channel-1".to_string());
    configs.upsert(&config).await.unwrap();

    let sync = Arc::new(ListSynchronizer::new(
        Arc::clone(&provider),
        Arc::clone(&tasks),
        Arc::clone(&configs),
        "taskpin",
    ));
    let flows = CreationFlows::new(
        IdIssuer::new(Arc::new(counters)),
        Arc::clone(&tasks),
        sync,
    );
    Fixture {
        provider,
        tasks,
        configs,
        flows,
    }
}

async fn fixture() -> Fixture {
    fixture_with_counters(MemoryCounterStore::new()).await
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
}

fn fields(title: &str, due: &str) -> ModalFields {
    ModalFields {
        title: title.to_string(),
        due: due.to_string(),
        notes: None,
    }
}

async fn guild_task(tasks: &MemoryTaskStore, id: TaskId) -> Task {
    tasks
        .find_by_guild("guild-1")
        .await
        .unwrap()
        .into_iter()
        .find(|t| t.id == id)
        .unwrap()
}

/// Runs begin + submit, returning the reserved task id.
async fn submit(f: &Fixture, user: &str, at: DateTime<Utc>) -> TaskId {
    f.flows.begin("guild-1", user, at).await;
    let reply = f
        .flows
        .submit_modal("guild-1", user, &fields("Ship it", "2026-02-15 18:00"), at)
        .await
        .unwrap();
    reply.task_id.expect("submit should reserve an id")
}

// --- happy paths ---

#[tokio::test]
async fn assigned_creation_persists_and_renders() {
    let f = fixture().await;
    let task_id = submit(&f, "member-1", now()).await;
    assert_eq!(task_id, TaskId::new(1));

    f.flows
        .choose_assignment(task_id, AssignmentChoice::Assign, now())
        .await
        .unwrap();
    let reply = f
        .flows
        .select_assignee(task_id, "member-7", now())
        .await
        .unwrap();
    assert_eq!(reply.task_id, Some(task_id));

    let task = guild_task(&f.tasks, task_id).await;
    assert_eq!(task.assignee_id.as_deref(), Some("member-7"));
    assert_eq!(task.status, TaskStatus::Open);
    assert_eq!(task.creator_id, "member-1");

    // The pinned list was refreshed and shows the task.
    assert_eq!(f.provider.message_count("channel-1").await, 1);
    let config = f.configs.get("guild-1").await.unwrap().unwrap();
    assert!(config.task_list_message_id.is_some());
}

#[tokio::test]
async fn explicitly_unassigned_creation_persists() {
    let f = fixture().await;
    let task_id = submit(&f, "member-1", now()).await;

    let reply = f
        .flows
        .choose_assignment(task_id, AssignmentChoice::Unassigned, now())
        .await
        .unwrap();
    assert!(
        reply
            .blocks
            .iter()
            .filter_map(|b| b.as_text())
            .any(|t| t.contains("unassigned"))
    );

    let task = guild_task(&f.tasks, task_id).await;
    assert_eq!(task.assignee_id, None);
    assert_eq!(task.status, TaskStatus::Open);
}

#[tokio::test]
async fn sequential_creations_get_increasing_ids() {
    let f = fixture().await;
    for expected in 1..=3u64 {
        let task_id = submit(&f, "member-1", now()).await;
        assert_eq!(task_id, TaskId::new(expected));
        f.flows
            .choose_assignment(task_id, AssignmentChoice::Unassigned, now())
            .await
            .unwrap();
    }
    assert_eq!(f.tasks.find_by_guild("guild-1").await.unwrap().len(), 3);
}

#[tokio::test]
async fn notes_are_stored_when_given() {
    let f = fixture().await;
    f.flows.begin("guild-1", "member-1", now()).await;
    let reply = f
        .flows
        .submit_modal(
            "guild-1",
            "member-1",
            &ModalFields {
                title: "Ship it".to_string(),
                due: "2026-02-15 18:00".to_string(),
                notes: Some("Check with finance first".to_string()),
            },
            now(),
        )
        .await
        .unwrap();
    let task_id = reply.task_id.unwrap();
    f.flows
        .choose_assignment(task_id, AssignmentChoice::Unassigned, now())
        .await
        .unwrap();

    let task = guild_task(&f.tasks, task_id).await;
    assert_eq!(task.notes.as_deref(), Some("Check with finance first"));
}

// --- validation ---

#[tokio::test]
async fn invalid_due_date_reprompts_and_flow_survives() {
    let f = fixture().await;
    f.flows.begin("guild-1", "member-1", now()).await;

    let reply = f
        .flows
        .submit_modal("guild-1", "member-1", &fields("Ship it", "next tuesday"), now())
        .await
        .unwrap();
    assert_eq!(reply.task_id, None);
    assert!(
        reply
            .blocks
            .iter()
            .filter_map(|b| b.as_text())
            .any(|t| t.contains("YYYY-MM-DD HH:mm"))
    );
    // No id was consumed and nothing was persisted.
    assert!(f.tasks.find_by_guild("guild-1").await.unwrap().is_empty());

    // The same flow accepts a corrected resubmission.
    let reply = f
        .flows
        .submit_modal(
            "guild-1",
            "member-1",
            &fields("Ship it", "2026-02-15 18:00"),
            now(),
        )
        .await
        .unwrap();
    assert_eq!(reply.task_id, Some(TaskId::new(1)));
}

#[tokio::test]
async fn pattern_accepts_day_overflow_but_rejects_bad_month_and_past() {
    let f = fixture().await;
    f.flows.begin("guild-1", "member-1", now()).await;

    // Month out of range: rejected.
    let reply = f
        .flows
        .submit_modal("guild-1", "member-1", &fields("T", "2026-13-01 10:00"), now())
        .await
        .unwrap();
    assert_eq!(reply.task_id, None);

    // Past instant: rejected even though well-formed.
    let reply = f
        .flows
        .submit_modal("guild-1", "member-1", &fields("T", "2025-02-15 10:00"), now())
        .await
        .unwrap();
    assert_eq!(reply.task_id, None);

    // Feb 30 is accepted (no days-in-month cross-check) and rolls over.
    let reply = f
        .flows
        .submit_modal("guild-1", "member-1", &fields("T", "2026-02-30 10:00"), now())
        .await
        .unwrap();
    let task_id = reply.task_id.unwrap();
    f.flows
        .choose_assignment(task_id, AssignmentChoice::Unassigned, now())
        .await
        .unwrap();
    let task = guild_task(&f.tasks, task_id).await;
    assert_eq!(
        task.due_at,
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn empty_title_reprompts() {
    let f = fixture().await;
    f.flows.begin("guild-1", "member-1", now()).await;
    let reply = f
        .flows
        .submit_modal("guild-1", "member-1", &fields("", "2026-02-15 18:00"), now())
        .await
        .unwrap();
    assert_eq!(reply.task_id, None);
    assert!(f.tasks.find_by_guild("guild-1").await.unwrap().is_empty());
}

// --- timeouts are default transitions ---

#[tokio::test]
async fn timeout_at_assignment_choice_commits_unassigned() {
    let f = fixture().await;
    let task_id = submit(&f, "member-1", now()).await;

    let after = now() + Duration::seconds(CHOICE_TIMEOUT_SECS + 1);
    let committed = f.flows.expire_due(after).await;
    assert_eq!(committed, vec![task_id]);

    let task = guild_task(&f.tasks, task_id).await;
    assert_eq!(task.assignee_id, None);
    assert_eq!(task.status, TaskStatus::Open);
}

#[tokio::test]
async fn timeout_at_assignee_selection_commits_unassigned() {
    let f = fixture().await;
    let task_id = submit(&f, "member-1", now()).await;
    f.flows
        .choose_assignment(task_id, AssignmentChoice::Assign, now())
        .await
        .unwrap();

    let after = now() + Duration::seconds(SELECTION_TIMEOUT_SECS + 1);
    let committed = f.flows.expire_due(after).await;
    assert_eq!(committed, vec![task_id]);
    assert_eq!(guild_task(&f.tasks, task_id).await.assignee_id, None);
}

#[tokio::test]
async fn timeout_at_input_form_creates_nothing() {
    let f = fixture().await;
    f.flows.begin("guild-1", "member-1", now()).await;

    let after = now() + Duration::seconds(INPUT_TIMEOUT_SECS + 1);
    let committed = f.flows.expire_due(after).await;
    assert!(committed.is_empty());
    assert!(f.tasks.find_by_guild("guild-1").await.unwrap().is_empty());

    // The expired form can no longer be submitted.
    let err = f
        .flows
        .submit_modal(
            "guild-1",
            "member-1",
            &fields("Ship it", "2026-02-15 18:00"),
            after,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::UnknownFlow));
}

#[tokio::test]
async fn late_choice_event_takes_the_owed_default() {
    let f = fixture().await;
    let task_id = submit(&f, "member-1", now()).await;

    // The click arrives after the deadline but before any sweep ran: the
    // task commits unassigned, not assigned.
    let late = now() + Duration::seconds(CHOICE_TIMEOUT_SECS + 30);
    let reply = f
        .flows
        .choose_assignment(task_id, AssignmentChoice::Assign, late)
        .await
        .unwrap();
    assert!(
        reply
            .blocks
            .iter()
            .filter_map(|b| b.as_text())
            .any(|t| t.contains("timeout"))
    );
    assert_eq!(guild_task(&f.tasks, task_id).await.assignee_id, None);
}

#[tokio::test]
async fn expire_due_before_any_deadline_is_a_no_op() {
    let f = fixture().await;
    let task_id = submit(&f, "member-1", now()).await;

    let committed = f.flows.expire_due(now() + Duration::seconds(1)).await;
    assert!(committed.is_empty());

    // The flow is still live.
    let reply = f
        .flows
        .choose_assignment(task_id, AssignmentChoice::Unassigned, now())
        .await
        .unwrap();
    assert_eq!(reply.task_id, Some(task_id));
}

// --- failure isolation ---

#[tokio::test]
async fn list_sync_failure_does_not_unwind_the_task() {
    let f = fixture().await;
    // The configured channel vanishes before the commit.
    f.provider.remove_channel("channel-1").await;

    let task_id = submit(&f, "member-1", now()).await;
    let reply = f
        .flows
        .choose_assignment(task_id, AssignmentChoice::Unassigned, now())
        .await
        .unwrap();
    assert_eq!(reply.task_id, Some(task_id));

    // Task creation is the durable fact; the list refresh just failed.
    assert_eq!(f.tasks.find_by_guild("guild-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn unavailable_counter_aborts_creation_with_no_task() {
    struct DownCounterStore;

    impl CounterStore for DownCounterStore {
        async fn increment_and_fetch(&self, _guild_id: &str) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("primary down".to_string()))
        }

        async fn set(&self, _guild_id: &str, _sequence: u64) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("primary down".to_string()))
        }
    }

    let f = fixture_with_counters(DownCounterStore).await;
    f.flows.begin("guild-1", "member-1", now()).await;
    let err = f
        .flows
        .submit_modal(
            "guild-1",
            "member-1",
            &fields("Ship it", "2026-02-15 18:00"),
            now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Store(StoreError::Unavailable(_))));
    assert!(f.tasks.find_by_guild("guild-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_id_on_commit_is_surfaced() {
    let f = fixture().await;
    let task_id = submit(&f, "member-1", now()).await;

    // Another writer squats on the reserved id, desynchronizing the
    // counter from the store.
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    f.tasks
        .insert(&Task {
            id: task_id,
            guild_id: "guild-1".to_string(),
            goal_id: None,
            title: "Squatter".to_string(),
            notes: None,
            assignee_id: None,
            creator_id: "member-2".to_string(),
            due_at: at,
            status: TaskStatus::Open,
            created_at: at,
            updated_at: at,
        })
        .await
        .unwrap();

    let err = f
        .flows
        .choose_assignment(task_id, AssignmentChoice::Unassigned, now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        FlowError::Store(StoreError::DuplicateTaskId { .. })
    ));
}

#[tokio::test]
async fn unknown_task_events_are_rejected() {
    let f = fixture().await;
    let ghost = TaskId::new(99);

    let err = f
        .flows
        .choose_assignment(ghost, AssignmentChoice::Assign, now())
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::UnknownFlow));

    let err = f
        .flows
        .select_assignee(ghost, "member-1", now())
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::UnknownFlow));
}

#[tokio::test]
async fn selection_event_at_choice_stage_is_rejected() {
    let f = fixture().await;
    let task_id = submit(&f, "member-1", now()).await;

    // The flow is waiting on the choice buttons, not the member select.
    let err = f
        .flows
        .select_assignee(task_id, "member-7", now())
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::UnknownFlow));

    // The flow is still live for the correct event.
    let reply = f
        .flows
        .choose_assignment(task_id, AssignmentChoice::Unassigned, now())
        .await
        .unwrap();
    assert_eq!(reply.task_id, Some(task_id));
}
