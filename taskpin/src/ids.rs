//! Per-guild task id issuance.
//!
//! Reservation is a single increment-and-fetch against the counter store,
//! never read-then-write, so concurrent reservations for the same guild
//! always observe distinct, strictly increasing sequence values. A task must
//! never be persisted without a successfully reserved id.

use taskpin_proto::task::TaskId;

use crate::store::{CounterStore, StoreError, TaskStore};

/// Issues guild-scoped task ids from the per-guild atomic counter.
pub struct IdIssuer<C: CounterStore> {
    counters: C,
}

impl<C: CounterStore> IdIssuer<C> {
    /// Creates an issuer over the given counter store.
    #[must_use]
    pub const fn new(counters: C) -> Self {
        Self { counters }
    }

    /// Reserves the next task id for a guild.
    ///
    /// The counter is created on first use with initial value 0, so the
    /// first reservation yields `T-001`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the atomic increment cannot be
    /// performed; the caller must abort task creation in that case.
    pub async fn reserve(&self, guild_id: &str) -> Result<TaskId, StoreError> {
        let sequence = self.counters.increment_and_fetch(guild_id).await?;
        Ok(TaskId::new(sequence))
    }

    /// Administrative resynchronization: recomputes the guild's sequence as
    /// the maximum sequence among its existing task ids (0 if none) and
    /// overwrites the counter. Returns the value written.
    ///
    /// This is last-writer-wins and NOT safe to run concurrently with active
    /// task creation for the same guild: a reservation that lands mid-repair
    /// can be overwritten and later reissued. Run it offline.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the task scan or the counter
    /// write fails.
    pub async fn repair<T: TaskStore>(
        &self,
        guild_id: &str,
        tasks: &T,
    ) -> Result<u64, StoreError> {
        let existing = tasks.find_by_guild(guild_id).await?;
        let max_sequence = existing
            .iter()
            .map(|task| task.id.sequence())
            .max()
            .unwrap_or(0);
        self.counters.set(guild_id, max_sequence).await?;
        tracing::info!(guild_id, sequence = max_sequence, "task counter repaired");
        Ok(max_sequence)
    }
}
