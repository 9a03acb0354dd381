//! Command metadata and the name-to-handler registry.
//!
//! Dispatch is a lookup, not inheritance: the registry maps a stable name
//! to a tagged record (metadata plus a [`CommandKind`] tag), and the
//! executor matches on the tag. Planned commands are registered with
//! `implemented: false` so the picker can show them without routing
//! anywhere.

pub mod executor;

pub use executor::CommandContext;

use std::collections::HashMap;

/// Subcommands that are planned but not yet built.
pub const PLANNED_COMMANDS: [&str; 9] = [
    "assign",
    "unassign",
    "take",
    "complete",
    "edit",
    "delete",
    "list",
    "set-timezone",
    "set-reminders",
];

/// Properties of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMetadata {
    /// Stable command name, used for routing.
    pub name: String,
    /// Emoji shown next to the command in pickers.
    pub emoji: &'static str,
    /// Human-readable description.
    pub description: String,
    /// Whether the command is fully implemented.
    pub implemented: bool,
    /// Whether the command requires a guild context.
    pub requires_guild: bool,
}

/// Which handler a registry entry dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Open the task creation flow.
    Create,
    /// Configure the task list channel.
    SetChannel,
    /// Rebuild the pinned task list from scratch.
    Refresh,
    /// List available commands.
    Help,
    /// Registered but unimplemented.
    Planned,
}

/// A registry entry: metadata plus the dispatch tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEntry {
    /// Command properties.
    pub metadata: CommandMetadata,
    /// Dispatch tag.
    pub kind: CommandKind,
}

/// Central name-to-command registry.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandEntry>,
    /// Registration order, so listings are stable.
    order: Vec<String>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry populated with every built-in and planned command.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(CommandEntry {
            metadata: CommandMetadata {
                name: "create".to_string(),
                emoji: "\u{2795}",
                description: "Create a new task".to_string(),
                implemented: true,
                requires_guild: true,
            },
            kind: CommandKind::Create,
        });
        registry.register(CommandEntry {
            metadata: CommandMetadata {
                name: "set-channel".to_string(),
                emoji: "\u{1f4cc}",
                description: "Set the task list channel".to_string(),
                implemented: true,
                requires_guild: true,
            },
            kind: CommandKind::SetChannel,
        });
        registry.register(CommandEntry {
            metadata: CommandMetadata {
                name: "refresh".to_string(),
                emoji: "\u{1f504}",
                description: "Rebuild the task list".to_string(),
                implemented: true,
                requires_guild: true,
            },
            kind: CommandKind::Refresh,
        });
        registry.register(CommandEntry {
            metadata: CommandMetadata {
                name: "help".to_string(),
                emoji: "\u{2753}",
                description: "Show available commands".to_string(),
                implemented: true,
                requires_guild: false,
            },
            kind: CommandKind::Help,
        });
        for name in PLANNED_COMMANDS {
            registry.register(CommandEntry {
                metadata: CommandMetadata {
                    name: name.to_string(),
                    emoji: "\u{1f6a7}",
                    description: format!("{name} (planned)"),
                    implemented: false,
                    requires_guild: true,
                },
                kind: CommandKind::Planned,
            });
        }
        registry
    }

    /// Registers a command, replacing any previous entry with the same name.
    pub fn register(&mut self, entry: CommandEntry) {
        let name = entry.metadata.name.clone();
        if self.commands.insert(name.clone(), entry).is_none() {
            self.order.push(name);
        }
    }

    /// Looks up a command by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.commands.get(name)
    }

    /// Implemented commands, in registration order.
    #[must_use]
    pub fn implemented(&self) -> Vec<&CommandMetadata> {
        self.in_order(true)
    }

    /// Planned (unimplemented) commands, in registration order.
    #[must_use]
    pub fn planned(&self) -> Vec<&CommandMetadata> {
        self.in_order(false)
    }

    fn in_order(&self, implemented: bool) -> Vec<&CommandMetadata> {
        self.order
            .iter()
            .filter_map(|name| self.commands.get(name))
            .map(|entry| &entry.metadata)
            .filter(|metadata| metadata.implemented == implemented)
            .collect()
    }
}
