//! In-memory store implementations.
//!
//! Back the binary's demo wiring and every test. Thread-safe via
//! [`tokio::sync::RwLock`]; the counter store holds a single lock across its
//! read-increment-write so concurrent reservations serialize on it, which is
//! what makes `increment_and_fetch` atomic.

use std::collections::HashMap;

use tokio::sync::RwLock;

use taskpin_proto::config::ServerConfig;
use taskpin_proto::task::Task;

use super::StoreError;

/// In-memory task collection keyed by guild.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<String, Vec<Task>>>,
}

impl MemoryTaskStore {
    /// Creates an empty task store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl super::TaskStore for MemoryTaskStore {
    async fn insert(&self, task: &Task) -> Result<(), StoreError> {
        let mut tasks = self.tasks.write().await;
        let guild_tasks = tasks.entry(task.guild_id.clone()).or_default();
        if guild_tasks.iter().any(|t| t.id == task.id) {
            return Err(StoreError::DuplicateTaskId {
                guild_id: task.guild_id.clone(),
                task_id: task.id,
            });
        }
        guild_tasks.push(task.clone());
        Ok(())
    }

    async fn find_open_by_guild(&self, guild_id: &str) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .get(guild_id)
            .map(|guild_tasks| {
                guild_tasks
                    .iter()
                    .filter(|t| t.is_open())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_by_guild(&self, guild_id: &str) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(guild_id).cloned().unwrap_or_default())
    }
}

/// In-memory per-guild sequence counters.
#[derive(Default)]
pub struct MemoryCounterStore {
    counters: RwLock<HashMap<String, u64>>,
}

impl MemoryCounterStore {
    /// Creates an empty counter store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the current sequence without advancing it (tests only need
    /// this; request handling must go through `increment_and_fetch`).
    pub async fn current(&self, guild_id: &str) -> u64 {
        let counters = self.counters.read().await;
        counters.get(guild_id).copied().unwrap_or(0)
    }
}

impl super::CounterStore for MemoryCounterStore {
    async fn increment_and_fetch(&self, guild_id: &str) -> Result<u64, StoreError> {
        let mut counters = self.counters.write().await;
        let sequence = counters.entry(guild_id.to_string()).or_insert(0);
        *sequence += 1;
        Ok(*sequence)
    }

    async fn set(&self, guild_id: &str, sequence: u64) -> Result<(), StoreError> {
        let mut counters = self.counters.write().await;
        counters.insert(guild_id.to_string(), sequence);
        Ok(())
    }
}

/// In-memory guild configuration records.
#[derive(Default)]
pub struct MemoryConfigStore {
    configs: RwLock<HashMap<String, ServerConfig>>,
}

impl MemoryConfigStore {
    /// Creates an empty config store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl super::ConfigStore for MemoryConfigStore {
    async fn get(&self, guild_id: &str) -> Result<Option<ServerConfig>, StoreError> {
        let configs = self.configs.read().await;
        Ok(configs.get(guild_id).cloned())
    }

    async fn upsert(&self, config: &ServerConfig) -> Result<(), StoreError> {
        let mut configs = self.configs.write().await;
        configs.insert(config.guild_id.clone(), config.clone());
        Ok(())
    }
}
