//! Command execution context and the user-facing fallback payloads.
//!
//! Internal diagnostic detail (error kind, ids) goes to the log; end users
//! only ever see the payloads built here.

use taskpin_proto::display::{DisplayBlock, Spacing};

use super::CommandRegistry;

/// Where an interaction came from.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Guild the interaction happened in, if any.
    pub guild_id: Option<String>,
    /// Channel the interaction happened in, if any.
    pub channel_id: Option<String>,
    /// Explicit channel argument (e.g. for `set-channel`), if given.
    pub channel_arg: Option<String>,
    /// Member who triggered the interaction.
    pub user_id: String,
}

/// Payload shown when a guild-only command runs outside a guild.
#[must_use]
pub fn guild_required_payload() -> Vec<DisplayBlock> {
    vec![DisplayBlock::text(
        "\u{274c} This command can only be used in a server.",
    )]
}

/// Payload shown when execution fails for any internal reason.
#[must_use]
pub fn generic_error_payload(command_name: &str, name: &str) -> Vec<DisplayBlock> {
    vec![DisplayBlock::text(format!(
        "\u{274c} An error occurred while executing the command.\n\n\
         Try using `/{command_name} {name}` directly."
    ))]
}

/// Payload shown when a planned (unimplemented) command is invoked.
#[must_use]
pub fn construction_payload(name: &str) -> Vec<DisplayBlock> {
    vec![DisplayBlock::text(format!(
        "\u{1f6a7} Still building this one!\n\n`{name}` is not implemented yet, \
         but it's on the roadmap."
    ))]
}

/// Payload listing every command, grouped by implementation status.
#[must_use]
pub fn help_payload(command_name: &str, registry: &CommandRegistry) -> Vec<DisplayBlock> {
    let mut blocks = vec![
        DisplayBlock::text("# \u{2753} Commands"),
        DisplayBlock::divider(Spacing::Small),
    ];

    let implemented: Vec<String> = registry
        .implemented()
        .iter()
        .map(|m| format!("{} `/{command_name} {}` \u{2022} {}", m.emoji, m.name, m.description))
        .collect();
    blocks.push(DisplayBlock::text(implemented.join("\n")));

    let planned = registry.planned();
    if !planned.is_empty() {
        blocks.push(DisplayBlock::divider(Spacing::Small));
        let names: Vec<&str> = planned.iter().map(|m| m.name.as_str()).collect();
        blocks.push(DisplayBlock::text(format!(
            "**Planned:** {}",
            names.join(", ")
        )));
    }
    blocks
}
