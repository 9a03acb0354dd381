//! Platform-abstract display vocabulary.
//!
//! The core never talks to a concrete chat platform; it produces sequences
//! of [`DisplayBlock`] values that the interaction layer translates into
//! whatever component system the platform offers. Blocks mirror the two
//! primitives every supported platform has: a markdown-ish text block and a
//! visual separator.

/// Separator spacing size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spacing {
    /// Tight spacing between related blocks.
    Small,
    /// Generous spacing between sections.
    Large,
}

/// One renderable block of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayBlock {
    /// A text block; content may carry markdown-ish inline markup and
    /// platform mention/timestamp tokens (`<@id>`, `<t:unix:R>`).
    Text(String),
    /// A separator between blocks.
    Separator {
        /// Whether a visible rule is drawn.
        divider: bool,
        /// How much vertical space the separator takes.
        spacing: Spacing,
    },
}

impl DisplayBlock {
    /// Creates a text block.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(content.into())
    }

    /// Creates a separator with a visible rule.
    #[must_use]
    pub const fn divider(spacing: Spacing) -> Self {
        Self::Separator {
            divider: true,
            spacing,
        }
    }

    /// Creates an invisible spacing separator.
    #[must_use]
    pub const fn gap(spacing: Spacing) -> Self {
        Self::Separator {
            divider: false,
            spacing,
        }
    }

    /// Returns the text content if this is a text block.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(content) => Some(content),
            Self::Separator { .. } => None,
        }
    }
}

/// A full outgoing message: blocks plus delivery options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePayload {
    /// Blocks to render, in order.
    pub blocks: Vec<DisplayBlock>,
    /// When set, no user or role mentioned in the blocks is notified.
    pub suppress_mentions: bool,
}

impl MessagePayload {
    /// Payload for the pinned task list: mentions are always suppressed so
    /// list refreshes never ping anyone.
    #[must_use]
    pub const fn list(blocks: Vec<DisplayBlock>) -> Self {
        Self {
            blocks,
            suppress_mentions: true,
        }
    }
}
