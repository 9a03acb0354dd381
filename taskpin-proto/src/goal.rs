//! Goal records.
//!
//! Persisted schema only: tasks may reference a goal via `goal_id`, but no
//! command creates or lists goals yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    /// Goal is active and may receive tasks.
    Active,
    /// Goal has been archived.
    Archived,
}

/// A persisted goal record. `(guild_id, name)` is unique per guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// Goal identifier.
    pub goal_id: String,
    /// Guild this goal belongs to.
    pub guild_id: String,
    /// Human-readable goal name.
    pub name: String,
    /// Optional longer description.
    pub description: Option<String>,
    /// Current goal status.
    pub status: GoalStatus,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,
}
