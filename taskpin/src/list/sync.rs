//! Reconciliation of the rendered task list with the live channel message.
//!
//! At most one "current" list message id is recorded per guild; after a
//! successful sync the recorded id refers to the most recently
//! created-or-edited message. A recorded id pointing at a deleted message is
//! tolerated and self-heals on the next sync by creating a replacement.
//!
//! Concurrent syncs for the same guild are NOT serialized: two interleaved
//! calls can each create a message, and the stored id is last-writer-wins
//! (the loser becomes an orphan). The source system accepts this race; a
//! per-guild mutex would be the hardening option.

use chrono::Utc;

use taskpin_proto::display::MessagePayload;

use crate::channel::{ChannelProvider, ProviderError};
use crate::store::{ConfigStore, StoreError, TaskStore};

use super::render;

/// How the synchronizer should treat an existing list message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Idempotent refresh: edit in place when possible, create otherwise.
    Update,
    /// Forced recreation: best-effort delete, then always create.
    Rebuild,
}

/// What a successful sync did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The guild has no list channel configured; nothing to do.
    NotConfigured,
    /// The recorded message was edited in place.
    Edited {
        /// Id of the edited message (unchanged in config).
        message_id: String,
    },
    /// A new message was created, pinned best-effort, and recorded.
    Created {
        /// Id of the new message, now stored in the guild config.
        message_id: String,
    },
}

/// Errors a sync can fail with.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The configured channel is gone or cannot host the list. The stored
    /// channel id is left in place; reconfiguration must be explicit.
    #[error("task list channel {channel_id} unavailable")]
    ChannelUnavailable {
        /// The channel id that failed to resolve to a postable channel.
        channel_id: String,
    },

    /// The provider failed on an operation with no fallback path.
    #[error("channel provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Keeps the pinned task list message consistent with task state.
pub struct ListSynchronizer<P, T, C> {
    provider: P,
    tasks: T,
    configs: C,
    command_name: String,
    max_blocks: usize,
}

impl<P, T, C> ListSynchronizer<P, T, C>
where
    P: ChannelProvider,
    T: TaskStore,
    C: ConfigStore,
{
    /// Creates a synchronizer over the given collaborators.
    pub fn new(provider: P, tasks: T, configs: C, command_name: impl Into<String>) -> Self {
        Self {
            provider,
            tasks,
            configs,
            command_name: command_name.into(),
            max_blocks: render::DEFAULT_MAX_BLOCKS,
        }
    }

    /// Overrides the renderer block budget.
    #[must_use]
    pub const fn with_max_blocks(mut self, max_blocks: usize) -> Self {
        self.max_blocks = max_blocks;
        self
    }

    /// Reconciles the guild's list message with current task state.
    ///
    /// "Not configured" is a valid steady state and returns
    /// [`SyncOutcome::NotConfigured`] rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ChannelUnavailable`] if the configured channel
    /// is missing or not postable, [`SyncError::Store`] on store failures,
    /// and [`SyncError::Provider`] if message creation itself fails. Pin
    /// failures and rebuild-mode delete failures are logged, never fatal.
    pub async fn sync(&self, guild_id: &str, mode: SyncMode) -> Result<SyncOutcome, SyncError> {
        let Some(mut config) = self.configs.get(guild_id).await? else {
            tracing::debug!(guild_id, "no task list channel configured");
            return Ok(SyncOutcome::NotConfigured);
        };
        let Some(channel_id) = config.task_list_channel_id.clone() else {
            tracing::debug!(guild_id, "no task list channel configured");
            return Ok(SyncOutcome::NotConfigured);
        };

        let mut tasks = self.tasks.find_open_by_guild(guild_id).await?;
        render::sort_for_display(&mut tasks);
        let blocks = render::render_with_limit(&tasks, &self.command_name, Utc::now(), self.max_blocks);
        let payload = MessagePayload::list(blocks);

        let channel = match self.provider.fetch_channel(&channel_id).await {
            Ok(channel) if channel.is_postable() => channel,
            Ok(_) => {
                tracing::error!(guild_id, channel_id = %channel_id, "task list channel is not postable");
                return Err(SyncError::ChannelUnavailable { channel_id });
            }
            Err(ProviderError::ChannelNotFound(_)) => {
                tracing::error!(guild_id, channel_id = %channel_id, "task list channel not found");
                return Err(SyncError::ChannelUnavailable { channel_id });
            }
            Err(err) => return Err(err.into()),
        };

        match mode {
            SyncMode::Update => {
                if let Some(message_id) = config.task_list_message_id.clone() {
                    match self
                        .provider
                        .edit_message(&channel.id, &message_id, &payload)
                        .await
                    {
                        Ok(()) => {
                            tracing::info!(guild_id, message_id = %message_id, "updated task list in place");
                            return Ok(SyncOutcome::Edited { message_id });
                        }
                        Err(err) => {
                            tracing::warn!(
                                guild_id,
                                message_id = %message_id,
                                error = %err,
                                "could not edit recorded list message; creating a new one"
                            );
                        }
                    }
                }
            }
            SyncMode::Rebuild => {
                if let Some(old_id) = config.task_list_message_id.clone()
                    && let Err(err) = self.provider.delete_message(&channel.id, &old_id).await
                {
                    tracing::warn!(
                        guild_id,
                        message_id = %old_id,
                        error = %err,
                        "could not delete old task list message"
                    );
                }
            }
        }

        let message_id = self.provider.send_message(&channel.id, &payload).await?;

        // Pinning is best-effort: the message and the recorded id stand
        // even when the platform refuses the pin.
        if let Err(err) = self.provider.pin_message(&channel.id, &message_id).await {
            tracing::warn!(guild_id, message_id = %message_id, error = %err, "failed to pin task list message");
        }

        config.task_list_message_id = Some(message_id.clone());
        self.configs.upsert(&config).await?;
        tracing::info!(guild_id, message_id = %message_id, "created new task list message");
        Ok(SyncOutcome::Created { message_id })
    }
}
