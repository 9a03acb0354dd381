//! Reminder records.
//!
//! Persisted schema for the planned reminder engine; nothing reads or
//! delivers these yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::TaskId;

/// Delivery status of a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    /// Waiting to be sent.
    Pending,
    /// Delivered.
    Sent,
    /// Canceled before delivery.
    Canceled,
}

/// A persisted reminder record tied to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    /// Reminder identifier.
    pub reminder_id: String,
    /// Task this reminder belongs to.
    pub task_id: TaskId,
    /// When the reminder should fire.
    pub send_at: DateTime<Utc>,
    /// When it was actually delivered, if ever.
    pub sent_at: Option<DateTime<Utc>>,
    /// Channel to deliver into, if fixed.
    pub channel_id: Option<String>,
    /// Current delivery status.
    pub status: ReminderStatus,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last mutated.
    pub updated_at: DateTime<Utc>,
}
