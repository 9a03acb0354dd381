//! In-process channel provider.
//!
//! Simulates just enough of a chat platform to exercise every synchronizer
//! path: channels hold message maps with pinned flags, operations are
//! counted, and failures (missing channel, externally deleted message, pin
//! refusal) can be injected. Used by the binary's demo wiring and by tests.

use std::collections::HashMap;

use tokio::sync::Mutex;
use uuid::Uuid;

use taskpin_proto::display::MessagePayload;

use super::{Channel, ChannelKind, ChannelProvider, ProviderError};

/// A message held by the loopback provider.
#[derive(Debug, Clone)]
pub struct StoredMessage {
    /// The payload most recently sent or edited.
    pub payload: MessagePayload,
    /// Whether the message is currently pinned.
    pub pinned: bool,
}

/// Running operation counts, for asserting provider traffic in tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounts {
    /// Messages created via `send_message`.
    pub sent: u64,
    /// Successful in-place edits.
    pub edited: u64,
    /// Successful deletes.
    pub deleted: u64,
    /// Successful pins.
    pub pinned: u64,
    /// Delete attempts that failed (message already gone).
    pub failed_deletes: u64,
}

struct ChannelState {
    kind: ChannelKind,
    messages: HashMap<String, StoredMessage>,
}

#[derive(Default)]
struct Inner {
    channels: HashMap<String, ChannelState>,
    counts: OpCounts,
    fail_pins: bool,
}

/// In-process [`ChannelProvider`] implementation.
#[derive(Default)]
pub struct LoopbackProvider {
    inner: Mutex<Inner>,
}

impl LoopbackProvider {
    /// Creates a provider with no channels.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a channel of the given kind.
    pub async fn add_channel(&self, channel_id: &str, kind: ChannelKind) {
        let mut inner = self.inner.lock().await;
        inner.channels.insert(
            channel_id.to_string(),
            ChannelState {
                kind,
                messages: HashMap::new(),
            },
        );
    }

    /// Removes a channel entirely (simulates external deletion).
    pub async fn remove_channel(&self, channel_id: &str) {
        let mut inner = self.inner.lock().await;
        inner.channels.remove(channel_id);
    }

    /// Drops a single message (simulates a user deleting it out from under
    /// the bot).
    pub async fn drop_message(&self, channel_id: &str, message_id: &str) {
        let mut inner = self.inner.lock().await;
        if let Some(channel) = inner.channels.get_mut(channel_id) {
            channel.messages.remove(message_id);
        }
    }

    /// Makes every subsequent pin attempt fail.
    pub async fn set_fail_pins(&self, fail: bool) {
        let mut inner = self.inner.lock().await;
        inner.fail_pins = fail;
    }

    /// Returns a copy of a stored message, if present.
    pub async fn message(&self, channel_id: &str, message_id: &str) -> Option<StoredMessage> {
        let inner = self.inner.lock().await;
        inner
            .channels
            .get(channel_id)
            .and_then(|channel| channel.messages.get(message_id).cloned())
    }

    /// Number of messages currently held in a channel.
    pub async fn message_count(&self, channel_id: &str) -> usize {
        let inner = self.inner.lock().await;
        inner
            .channels
            .get(channel_id)
            .map_or(0, |channel| channel.messages.len())
    }

    /// Snapshot of the operation counters.
    pub async fn counts(&self) -> OpCounts {
        let inner = self.inner.lock().await;
        inner.counts
    }
}

impl ChannelProvider for LoopbackProvider {
    async fn fetch_channel(&self, channel_id: &str) -> Result<Channel, ProviderError> {
        let inner = self.inner.lock().await;
        inner.channels.get(channel_id).map_or_else(
            || Err(ProviderError::ChannelNotFound(channel_id.to_string())),
            |channel| {
                Ok(Channel {
                    id: channel_id.to_string(),
                    kind: channel.kind,
                })
            },
        )
    }

    async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<String, ProviderError> {
        let mut inner = self.inner.lock().await;
        let channel = inner
            .channels
            .get_mut(channel_id)
            .ok_or_else(|| ProviderError::ChannelNotFound(channel_id.to_string()))?;
        let message_id = Uuid::now_v7().to_string();
        channel.messages.insert(
            message_id.clone(),
            StoredMessage {
                payload: payload.clone(),
                pinned: false,
            },
        );
        inner.counts.sent += 1;
        Ok(message_id)
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), ProviderError> {
        let mut inner = self.inner.lock().await;
        let channel = inner
            .channels
            .get_mut(channel_id)
            .ok_or_else(|| ProviderError::ChannelNotFound(channel_id.to_string()))?;
        let message = channel.messages.get_mut(message_id).ok_or_else(|| {
            ProviderError::MessageNotFound {
                channel_id: channel_id.to_string(),
                message_id: message_id.to_string(),
            }
        })?;
        message.payload = payload.clone();
        inner.counts.edited += 1;
        Ok(())
    }

    async fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), ProviderError> {
        let mut inner = self.inner.lock().await;
        if !inner.channels.contains_key(channel_id) {
            inner.counts.failed_deletes += 1;
            return Err(ProviderError::ChannelNotFound(channel_id.to_string()));
        }
        let removed = inner
            .channels
            .get_mut(channel_id)
            .and_then(|channel| channel.messages.remove(message_id));
        if removed.is_none() {
            inner.counts.failed_deletes += 1;
            return Err(ProviderError::MessageNotFound {
                channel_id: channel_id.to_string(),
                message_id: message_id.to_string(),
            });
        }
        inner.counts.deleted += 1;
        Ok(())
    }

    async fn pin_message(&self, channel_id: &str, message_id: &str) -> Result<(), ProviderError> {
        let mut inner = self.inner.lock().await;
        if inner.fail_pins {
            return Err(ProviderError::PinFailed {
                message_id: message_id.to_string(),
                reason: "pins disabled".to_string(),
            });
        }
        let channel = inner
            .channels
            .get_mut(channel_id)
            .ok_or_else(|| ProviderError::ChannelNotFound(channel_id.to_string()))?;
        let message = channel.messages.get_mut(message_id).ok_or_else(|| {
            ProviderError::MessageNotFound {
                channel_id: channel_id.to_string(),
                message_id: message_id.to_string(),
            }
        })?;
        message.pinned = true;
        inner.counts.pinned += 1;
        Ok(())
    }
}
