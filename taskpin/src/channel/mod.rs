//! Channel-provider seam toward the chat platform.
//!
//! The core never holds a platform session; the provider handle is injected
//! into each component at construction, which is also what lets every
//! component run against [`loopback::LoopbackProvider`] in tests.

pub mod loopback;

pub use loopback::LoopbackProvider;

use std::future::Future;
use std::sync::Arc;

use taskpin_proto::display::MessagePayload;

/// Kinds of channel the platform can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Ordinary text channel.
    Text,
    /// Announcement/news channel (text-postable).
    Announcement,
    /// Voice channel.
    Voice,
    /// Grouping category, not postable.
    Category,
}

/// A resolved channel handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Platform channel id.
    pub id: String,
    /// What kind of channel this is.
    pub kind: ChannelKind,
}

impl Channel {
    /// Whether the task list message can be posted here.
    #[must_use]
    pub const fn is_postable(&self) -> bool {
        matches!(self.kind, ChannelKind::Text | ChannelKind::Announcement)
    }
}

/// Errors surfaced by a channel provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The channel does not exist (or is not visible to the bot).
    #[error("channel {0} not found")]
    ChannelNotFound(String),

    /// The message does not exist in the channel (deleted externally).
    #[error("message {message_id} not found in channel {channel_id}")]
    MessageNotFound {
        /// Channel that was searched.
        channel_id: String,
        /// Message that is gone.
        message_id: String,
    },

    /// Pinning failed (permissions, pin limit). Non-fatal for callers.
    #[error("pin failed for message {message_id}: {reason}")]
    PinFailed {
        /// Message that could not be pinned.
        message_id: String,
        /// Platform-reported reason.
        reason: String,
    },

    /// The platform could not be reached.
    #[error("channel provider unavailable: {0}")]
    Unavailable(String),
}

/// Operations the core needs from the chat platform.
pub trait ChannelProvider: Send + Sync {
    /// Resolves a channel by id.
    fn fetch_channel(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = Result<Channel, ProviderError>> + Send;

    /// Posts a new message and returns its id.
    fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;

    /// Replaces the blocks of an existing message.
    fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Deletes a message.
    fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Pins a message in its channel.
    fn pin_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;
}

impl<P: ChannelProvider + ?Sized> ChannelProvider for Arc<P> {
    fn fetch_channel(
        &self,
        channel_id: &str,
    ) -> impl Future<Output = Result<Channel, ProviderError>> + Send {
        (**self).fetch_channel(channel_id)
    }

    fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send {
        (**self).send_message(channel_id, payload)
    }

    fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send {
        (**self).edit_message(channel_id, message_id, payload)
    }

    fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send {
        (**self).delete_message(channel_id, message_id)
    }

    fn pin_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send {
        (**self).pin_message(channel_id, message_id)
    }
}
