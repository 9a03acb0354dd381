//! Persistence seams for tasks, counters, and guild configuration.
//!
//! The document store itself is an external collaborator; the core only
//! depends on these traits and talks to them through find/update/insert
//! shaped operations. [`memory`] provides the in-process implementations
//! that back the binary and the tests.

pub mod memory;

pub use memory::{MemoryConfigStore, MemoryCounterStore, MemoryTaskStore};

use std::future::Future;
use std::sync::Arc;

use taskpin_proto::config::ServerConfig;
use taskpin_proto::task::{Task, TaskId};

/// Errors surfaced by the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The underlying store could not be reached or the operation failed.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// `(guild_id, task_id)` already exists. This means the counter and the
    /// task collection have desynchronized; it is never retried silently.
    #[error("duplicate task id {task_id} in guild {guild_id}")]
    DuplicateTaskId {
        /// Guild whose id space collided.
        guild_id: String,
        /// The colliding task id.
        task_id: TaskId,
    },
}

/// Persistence of task records with guild-scoped id uniqueness.
pub trait TaskStore: Send + Sync {
    /// Inserts a new task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateTaskId`] if `(guild_id, id)` already
    /// exists, or [`StoreError::Unavailable`] if the store cannot be
    /// reached.
    fn insert(&self, task: &Task) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All open tasks for a guild, in unspecified order.
    fn find_open_by_guild(
        &self,
        guild_id: &str,
    ) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// Every task for a guild regardless of status (used by counter repair).
    fn find_by_guild(
        &self,
        guild_id: &str,
    ) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send;
}

/// Per-guild monotonic sequence storage.
///
/// Owned exclusively by the id issuer; no other component mutates counters.
pub trait CounterStore: Send + Sync {
    /// Atomically increments the guild's sequence and returns the new value,
    /// creating the counter at zero on first use (so the first call yields
    /// 1). This is the only operation that may be used during request
    /// handling, never read-then-write.
    fn increment_and_fetch(
        &self,
        guild_id: &str,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Overwrites the guild's sequence. Repair only; last writer wins.
    fn set(
        &self,
        guild_id: &str,
        sequence: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Persistence of per-guild configuration, one record per guild.
pub trait ConfigStore: Send + Sync {
    /// Fetches the configuration for a guild, if one exists.
    fn get(
        &self,
        guild_id: &str,
    ) -> impl Future<Output = Result<Option<ServerConfig>, StoreError>> + Send;

    /// Creates or replaces the configuration record for `config.guild_id`.
    fn upsert(
        &self,
        config: &ServerConfig,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<S: TaskStore + ?Sized> TaskStore for Arc<S> {
    fn insert(&self, task: &Task) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).insert(task)
    }

    fn find_open_by_guild(
        &self,
        guild_id: &str,
    ) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send {
        (**self).find_open_by_guild(guild_id)
    }

    fn find_by_guild(
        &self,
        guild_id: &str,
    ) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send {
        (**self).find_by_guild(guild_id)
    }
}

impl<S: CounterStore + ?Sized> CounterStore for Arc<S> {
    fn increment_and_fetch(
        &self,
        guild_id: &str,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send {
        (**self).increment_and_fetch(guild_id)
    }

    fn set(
        &self,
        guild_id: &str,
        sequence: u64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).set(guild_id, sequence)
    }
}

impl<S: ConfigStore + ?Sized> ConfigStore for Arc<S> {
    fn get(
        &self,
        guild_id: &str,
    ) -> impl Future<Output = Result<Option<ServerConfig>, StoreError>> + Send {
        (**self).get(guild_id)
    }

    fn upsert(&self, config: &ServerConfig) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).upsert(config)
    }
}
