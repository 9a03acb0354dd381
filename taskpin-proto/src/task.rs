//! Task records and guild-scoped task identifiers.
//!
//! A task id renders as `T-<n>` where `n` is the per-guild sequence number,
//! zero-padded to three digits. Padding never truncates: `T-999` is followed
//! by `T-1000`, `T-1001`, and so on.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum allowed task title length in characters.
pub const MAX_TASK_TITLE_LENGTH: usize = 100;

/// Maximum allowed task notes length in characters.
pub const MAX_TASK_NOTES_LENGTH: usize = 500;

/// Guild-scoped task identifier wrapping the per-guild sequence number.
///
/// Ordering is numeric, so `T-1000` sorts after `T-999` even though the
/// display strings would compare the other way around.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Creates a task id from a sequence number.
    #[must_use]
    pub const fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    /// Returns the numeric sequence value behind this id.
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{:03}", self.0)
    }
}

/// Error returned when a string does not have the `T-<digits>` shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid task id: {0:?}")]
pub struct ParseTaskIdError(pub String);

impl FromStr for TaskId {
    type Err = ParseTaskIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("T-")
            .ok_or_else(|| ParseTaskIdError(s.to_string()))?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseTaskIdError(s.to_string()));
        }
        digits
            .parse()
            .map(Self)
            .map_err(|_| ParseTaskIdError(s.to_string()))
    }
}

/// Status of a task in the guild task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is open and shows on the pinned list.
    Open,
    /// Task has been completed.
    Complete,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// A persisted task record.
///
/// `(guild_id, id)` is unique per guild; the id's sequence space is managed
/// by the per-guild counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Guild-scoped task identifier.
    pub id: TaskId,
    /// Guild (tenant) this task belongs to.
    pub guild_id: String,
    /// Optional goal this task contributes to.
    pub goal_id: Option<String>,
    /// Short task title.
    pub title: String,
    /// Optional free-form notes (not shown on the pinned list).
    pub notes: Option<String>,
    /// Member the task is assigned to, if any.
    pub assignee_id: Option<String>,
    /// Member who created the task.
    pub creator_id: String,
    /// When the task is due.
    pub due_at: DateTime<Utc>,
    /// Current task status.
    pub status: TaskStatus,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Whether this task still shows on the pinned list.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self.status, TaskStatus::Open)
    }
}
