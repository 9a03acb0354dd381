//! The pinned task list: pure rendering plus channel reconciliation.

pub mod render;
pub mod sync;

pub use sync::{ListSynchronizer, SyncError, SyncMode, SyncOutcome};
