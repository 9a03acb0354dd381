//! Task creation flow.
//!
//! A bounded-wait state machine:
//!
//! ```text
//! CollectingInput -> AwaitingAssignmentChoice -> AwaitingAssigneeSelection -> Persisted
//!                                            \-> Unassigned ----------------/
//! ```
//!
//! Each suspend point either advances on its matching interaction event or
//! falls through to a default transition when its deadline passes: an
//! unsubmitted input form is abandoned with no task created, while a missed
//! assignment choice or assignee selection commits the task unassigned:
//! timeout is an implicit default, not a cancellation.
//!
//! Deadlines are plain data swept by [`CreationFlows::expire_due`], so the
//! driving runtime decides the tick cadence and tests never sleep.

pub mod datetime;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use taskpin_proto::display::{DisplayBlock, Spacing};
use taskpin_proto::task::{
    MAX_TASK_NOTES_LENGTH, MAX_TASK_TITLE_LENGTH, Task, TaskId, TaskStatus,
};

use crate::channel::ChannelProvider;
use crate::ids::IdIssuer;
use crate::list::{ListSynchronizer, SyncMode};
use crate::store::{ConfigStore, CounterStore, StoreError, TaskStore};

use datetime::DueDateError;

/// Wait budget for the input form (modal) to be submitted.
pub const INPUT_TIMEOUT_SECS: i64 = 5 * 60;

/// Wait budget for the assignment choice buttons.
pub const CHOICE_TIMEOUT_SECS: i64 = 60;

/// Wait budget for the assignee member selection.
pub const SELECTION_TIMEOUT_SECS: i64 = 60;

/// Fields submitted from the input form.
#[derive(Debug, Clone)]
pub struct ModalFields {
    /// Task title.
    pub title: String,
    /// Due date/time string, `YYYY-MM-DD HH:mm`.
    pub due: String,
    /// Optional notes.
    pub notes: Option<String>,
}

/// The requester's answer at the assignment-choice step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentChoice {
    /// Pick a member next.
    Assign,
    /// Leave the task unassigned.
    Unassigned,
}

/// Validation failures that re-prompt the user without side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Title is empty.
    #[error("title cannot be empty")]
    TitleEmpty,

    /// Title exceeds the maximum length.
    #[error("title too long (max {MAX_TASK_TITLE_LENGTH} characters)")]
    TitleTooLong,

    /// Notes exceed the maximum length.
    #[error("notes too long (max {MAX_TASK_NOTES_LENGTH} characters)")]
    NotesTooLong,

    /// The due date/time failed validation.
    #[error(transparent)]
    DueDate(#[from] DueDateError),
}

/// Failures of a flow event.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// No pending flow matches the event (expired, never started, or
    /// already committed).
    #[error("no pending creation flow for this interaction")]
    UnknownFlow,

    /// A store operation failed; the task was not created.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Display payload handed back to the interaction layer after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowReply {
    /// The task id the conversation is about, once one is reserved.
    pub task_id: Option<TaskId>,
    /// Blocks for the interaction layer to present.
    pub blocks: Vec<DisplayBlock>,
}

/// Draft captured at modal submission, waiting on assignment.
#[derive(Debug, Clone)]
struct TaskDraft {
    id: TaskId,
    guild_id: String,
    title: String,
    notes: Option<String>,
    due_at: DateTime<Utc>,
    creator_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssignmentStage {
    Choice,
    Selection,
}

#[derive(Debug)]
struct PendingAssignment {
    draft: TaskDraft,
    stage: AssignmentStage,
    deadline: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    /// (guild, user) -> input-form deadline.
    collecting: HashMap<(String, String), DateTime<Utc>>,
    /// Reserved task id -> assignment wait state.
    awaiting: HashMap<TaskId, PendingAssignment>,
}

/// Drives task creation flows for all guilds.
pub struct CreationFlows<P, T, C, N>
where
    P: ChannelProvider,
    T: TaskStore,
    C: ConfigStore,
    N: CounterStore,
{
    issuer: IdIssuer<N>,
    tasks: T,
    sync: Arc<ListSynchronizer<P, T, C>>,
    pending: Mutex<Inner>,
}

impl<P, T, C, N> CreationFlows<P, T, C, N>
where
    P: ChannelProvider,
    T: TaskStore,
    C: ConfigStore,
    N: CounterStore,
{
    /// Creates a flow manager over the given collaborators.
    pub fn new(issuer: IdIssuer<N>, tasks: T, sync: Arc<ListSynchronizer<P, T, C>>) -> Self {
        Self {
            issuer,
            tasks,
            sync,
            pending: Mutex::new(Inner::default()),
        }
    }

    /// Opens a creation flow for a user and returns the input-form payload.
    ///
    /// A second `begin` for the same (guild, user) replaces the first;
    /// the stale form can no longer be submitted.
    pub async fn begin(&self, guild_id: &str, user_id: &str, now: DateTime<Utc>) -> FlowReply {
        let mut inner = self.pending.lock().await;
        inner.collecting.insert(
            (guild_id.to_string(), user_id.to_string()),
            now + Duration::seconds(INPUT_TIMEOUT_SECS),
        );
        drop(inner);

        FlowReply {
            task_id: None,
            blocks: vec![
                DisplayBlock::text("# \u{2795} Create New Task"),
                DisplayBlock::divider(Spacing::Small),
                DisplayBlock::text(
                    "**Task Title** \u{2022} e.g., Design launch flyer\n\
                     **Due Date & Time** \u{2022} YYYY-MM-DD HH:mm (e.g., 2026-02-15 18:00)\n\
                     **Notes** \u{2022} optional details or context",
                ),
            ],
        }
    }

    /// Handles input-form submission.
    ///
    /// Validation failures keep the flow pending and return a re-prompt
    /// payload; nothing is persisted and no id is consumed. On success a
    /// task id is reserved and the flow advances to the assignment choice.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::UnknownFlow`] if no live flow matches, or
    /// [`FlowError::Store`] if the id reservation fails (the flow is
    /// consumed and no task is created).
    pub async fn submit_modal(
        &self,
        guild_id: &str,
        user_id: &str,
        fields: &ModalFields,
        now: DateTime<Utc>,
    ) -> Result<FlowReply, FlowError> {
        let key = (guild_id.to_string(), user_id.to_string());
        {
            let mut inner = self.pending.lock().await;
            let deadline = inner.collecting.get(&key).copied();
            match deadline {
                None => return Err(FlowError::UnknownFlow),
                Some(deadline) if deadline <= now => {
                    inner.collecting.remove(&key);
                    return Err(FlowError::UnknownFlow);
                }
                Some(_) => {}
            }
        }

        let (title, due_at, notes) = match validate_fields(fields, now) {
            Ok(validated) => validated,
            Err(err) => {
                tracing::debug!(guild_id, user_id, error = %err, "task input rejected");
                return Ok(invalid_input_reply(&err));
            }
        };

        // The form is consumed before reserving so a failed reservation
        // cannot be retried against a dead flow.
        self.pending.lock().await.collecting.remove(&key);

        let task_id = self.issuer.reserve(guild_id).await?;
        let draft = TaskDraft {
            id: task_id,
            guild_id: guild_id.to_string(),
            title: title.clone(),
            notes,
            due_at,
            creator_id: user_id.to_string(),
        };

        let mut inner = self.pending.lock().await;
        inner.awaiting.insert(
            task_id,
            PendingAssignment {
                draft,
                stage: AssignmentStage::Choice,
                deadline: now + Duration::seconds(CHOICE_TIMEOUT_SECS),
            },
        );
        drop(inner);

        Ok(FlowReply {
            task_id: Some(task_id),
            blocks: vec![
                DisplayBlock::text(format!("# Task Created: {title}")),
                DisplayBlock::divider(Spacing::Small),
                DisplayBlock::text(format!("**Due:** <t:{}:f>", due_at.timestamp())),
                DisplayBlock::divider(Spacing::Small),
                DisplayBlock::text("**Who should be assigned to this task?**"),
                DisplayBlock::text("Assign to a specific person \u{2022} or leave unassigned"),
            ],
        })
    }

    /// Handles the assignment-choice buttons.
    ///
    /// A choice arriving after the deadline takes the owed default
    /// transition instead: the task is committed unassigned.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::UnknownFlow`] if the task has no pending
    /// choice, or [`FlowError::Store`] if the commit fails.
    pub async fn choose_assignment(
        &self,
        task_id: TaskId,
        choice: AssignmentChoice,
        now: DateTime<Utc>,
    ) -> Result<FlowReply, FlowError> {
        let pending = self
            .take_awaiting(task_id, AssignmentStage::Choice)
            .await
            .ok_or(FlowError::UnknownFlow)?;

        if pending.deadline <= now {
            let task = self.commit(pending.draft, None, now).await?;
            return Ok(timeout_commit_reply(task.id));
        }

        match choice {
            AssignmentChoice::Unassigned => {
                let task = self.commit(pending.draft, None, now).await?;
                Ok(FlowReply {
                    task_id: Some(task.id),
                    blocks: vec![
                        DisplayBlock::text("# \u{2705} Task Created"),
                        DisplayBlock::divider(Spacing::Small),
                        DisplayBlock::text(format!(
                            "Task **{}** has been created (unassigned).",
                            task.id
                        )),
                    ],
                })
            }
            AssignmentChoice::Assign => {
                let mut inner = self.pending.lock().await;
                inner.awaiting.insert(
                    task_id,
                    PendingAssignment {
                        draft: pending.draft,
                        stage: AssignmentStage::Selection,
                        deadline: now + Duration::seconds(SELECTION_TIMEOUT_SECS),
                    },
                );
                drop(inner);
                Ok(FlowReply {
                    task_id: Some(task_id),
                    blocks: vec![
                        DisplayBlock::text("# Select User to Assign"),
                        DisplayBlock::divider(Spacing::Small),
                        DisplayBlock::text("Choose a team member to assign this task to:"),
                    ],
                })
            }
        }
    }

    /// Handles the assignee member selection.
    ///
    /// A selection arriving after the deadline commits unassigned (the
    /// owed default) instead of assigning.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::UnknownFlow`] if the task has no pending
    /// selection, or [`FlowError::Store`] if the commit fails.
    pub async fn select_assignee(
        &self,
        task_id: TaskId,
        member_id: &str,
        now: DateTime<Utc>,
    ) -> Result<FlowReply, FlowError> {
        let pending = self
            .take_awaiting(task_id, AssignmentStage::Selection)
            .await
            .ok_or(FlowError::UnknownFlow)?;

        if pending.deadline <= now {
            let task = self.commit(pending.draft, None, now).await?;
            return Ok(timeout_commit_reply(task.id));
        }

        let task = self
            .commit(pending.draft, Some(member_id.to_string()), now)
            .await?;
        Ok(FlowReply {
            task_id: Some(task.id),
            blocks: vec![
                DisplayBlock::text("# \u{2705} Task Created"),
                DisplayBlock::divider(Spacing::Small),
                DisplayBlock::text(format!(
                    "Task **{}** has been created and assigned to <@{member_id}>!",
                    task.id
                )),
            ],
        })
    }

    /// Removes an awaiting entry if it is at the expected stage.
    async fn take_awaiting(
        &self,
        task_id: TaskId,
        stage: AssignmentStage,
    ) -> Option<PendingAssignment> {
        let mut inner = self.pending.lock().await;
        let pending = inner.awaiting.remove(&task_id)?;
        if pending.stage == stage {
            Some(pending)
        } else {
            inner.awaiting.insert(task_id, pending);
            None
        }
    }

    /// Sweeps expired deadlines.
    ///
    /// Expired input forms are abandoned silently (no task); expired
    /// assignment waits commit their draft unassigned. Commit failures are
    /// logged and the draft is dropped; the sweep itself never fails.
    /// Returns the ids committed by this sweep.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> Vec<TaskId> {
        let (expired_forms, expired_drafts) = {
            let mut inner = self.pending.lock().await;
            let forms = inner
                .collecting
                .iter()
                .filter(|(_, deadline)| **deadline <= now)
                .map(|(key, _)| key.clone())
                .collect::<Vec<_>>();
            for key in &forms {
                inner.collecting.remove(key);
            }

            let ids = inner
                .awaiting
                .iter()
                .filter(|(_, p)| p.deadline <= now)
                .map(|(id, _)| *id)
                .collect::<Vec<_>>();
            let drafts = ids
                .iter()
                .filter_map(|id| inner.awaiting.remove(id))
                .collect::<Vec<_>>();
            (forms, drafts)
        };

        for (guild_id, user_id) in &expired_forms {
            tracing::debug!(
                guild_id = %guild_id,
                user_id = %user_id,
                "input form expired; no task created"
            );
        }

        let mut committed = Vec::new();
        for pending in expired_drafts {
            let task_id = pending.draft.id;
            let guild_id = pending.draft.guild_id.clone();
            match self.commit(pending.draft, None, now).await {
                Ok(task) => {
                    tracing::info!(
                        guild_id = %guild_id,
                        task_id = %task.id,
                        "assignment wait timed out; task committed unassigned"
                    );
                    committed.push(task.id);
                }
                Err(err) => {
                    tracing::error!(
                        guild_id = %guild_id,
                        task_id = %task_id,
                        error = %err,
                        "could not commit task after assignment timeout"
                    );
                }
            }
        }
        committed
    }

    /// Persists a draft and refreshes the pinned list.
    ///
    /// Persistence is the durable fact; the list refresh is best-effort
    /// presentation and its failure never unwinds the inserted task.
    async fn commit(
        &self,
        draft: TaskDraft,
        assignee_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Task, FlowError> {
        let task = Task {
            id: draft.id,
            guild_id: draft.guild_id,
            goal_id: None,
            title: draft.title,
            notes: draft.notes,
            assignee_id,
            creator_id: draft.creator_id,
            due_at: draft.due_at,
            status: TaskStatus::Open,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.tasks.insert(&task).await {
            if matches!(err, StoreError::DuplicateTaskId { .. }) {
                tracing::error!(
                    guild_id = %task.guild_id,
                    task_id = %task.id,
                    "duplicate task id on insert \u{2014} counter is out of sync with the task store"
                );
            }
            return Err(err.into());
        }

        if let Err(err) = self.sync.sync(&task.guild_id, SyncMode::Update).await {
            tracing::warn!(
                guild_id = %task.guild_id,
                task_id = %task.id,
                error = %err,
                "task persisted but list refresh failed"
            );
        }
        Ok(task)
    }
}

/// Validates modal fields, returning (title, due instant, notes).
fn validate_fields(
    fields: &ModalFields,
    now: DateTime<Utc>,
) -> Result<(String, DateTime<Utc>, Option<String>), ValidationError> {
    if fields.title.is_empty() {
        return Err(ValidationError::TitleEmpty);
    }
    if fields.title.chars().count() > MAX_TASK_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong);
    }
    if let Some(notes) = &fields.notes
        && notes.chars().count() > MAX_TASK_NOTES_LENGTH
    {
        return Err(ValidationError::NotesTooLong);
    }
    let due_at = datetime::parse_due(&fields.due, now)?;
    let notes = fields.notes.clone().filter(|n| !n.is_empty());
    Ok((fields.title.clone(), due_at, notes))
}

/// Re-prompt payload for a validation failure; the flow stays pending.
fn invalid_input_reply(err: &ValidationError) -> FlowReply {
    let detail = match err {
        ValidationError::DueDate(_) => {
            "\u{274c} Invalid date/time. Please use YYYY-MM-DD HH:mm format with a future date \
             (e.g., 2026-02-15 18:00)"
                .to_string()
        }
        other => format!("\u{274c} {other}. Please try again."),
    };
    FlowReply {
        task_id: None,
        blocks: vec![DisplayBlock::text(detail)],
    }
}

/// Payload for a commit forced by a timeout.
fn timeout_commit_reply(task_id: TaskId) -> FlowReply {
    FlowReply {
        task_id: Some(task_id),
        blocks: vec![DisplayBlock::text(format!(
            "\u{2705} Task **{task_id}** created (unassigned due to timeout)."
        ))],
    }
}
