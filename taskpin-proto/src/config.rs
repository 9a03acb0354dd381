//! Per-guild server configuration.
//!
//! Exactly one record exists per guild, created on first channel
//! configuration. The recorded list message id SHOULD point at a pinned
//! message in the recorded channel, but consumers must tolerate it being
//! stale (message deleted externally) and self-heal.

use serde::{Deserialize, Serialize};

/// Timezone applied to a guild until it configures its own.
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Per-guild configuration record, keyed by `guild_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Guild this configuration belongs to (unique key).
    pub guild_id: String,
    /// Channel hosting the pinned task list, once configured.
    pub task_list_channel_id: Option<String>,
    /// Most recently created-or-edited task list message.
    pub task_list_message_id: Option<String>,
    /// Guild timezone (IANA name).
    pub timezone: String,
    /// Reminder schedule entries (consumed by the planned reminder engine).
    pub reminder_cadence: Vec<String>,
    /// Roles allowed to administer the tracker (no enforcement yet).
    pub admin_role_ids: Vec<String>,
}

impl ServerConfig {
    /// Creates a fresh configuration for a guild with compiled defaults.
    #[must_use]
    pub fn new(guild_id: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            task_list_channel_id: None,
            task_list_message_id: None,
            timezone: DEFAULT_TIMEZONE.to_string(),
            reminder_cadence: Vec::new(),
            admin_role_ids: Vec::new(),
        }
    }
}
