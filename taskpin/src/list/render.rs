//! Pure rendering of open tasks into display blocks.
//!
//! [`render`] is total and does no I/O: the clock is a parameter, so the
//! same inputs always produce the same block sequence. Callers are expected
//! to pass tasks already filtered to open and sorted with
//! [`sort_for_display`].

use chrono::{DateTime, Utc};

use taskpin_proto::display::{DisplayBlock, Spacing};
use taskpin_proto::task::Task;

/// Host platforms cap messages at 40 components; stopping at 38 leaves
/// room for the trailing divider and footer. Once this many blocks have
/// been emitted, the remaining tasks collapse into a truncation notice.
pub const DEFAULT_MAX_BLOCKS: usize = 38;

/// Sorts tasks into display order: soonest due first, ties broken by
/// ascending task id so equal due dates render deterministically.
pub fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.id.cmp(&b.id)));
}

/// Renders the task list with the default block budget.
#[must_use]
pub fn render(tasks: &[Task], command_name: &str, now: DateTime<Utc>) -> Vec<DisplayBlock> {
    render_with_limit(tasks, command_name, now, DEFAULT_MAX_BLOCKS)
}

/// Renders the task list with an explicit block budget.
///
/// Output shape: header and heavy divider; a "no open tasks" block when the
/// list is empty, otherwise one compact block per task followed by a light
/// gap; a truncation notice when the budget runs out; and always a trailing
/// divider plus a footer carrying the last-updated marker derived from
/// `now`.
#[must_use]
pub fn render_with_limit(
    tasks: &[Task],
    command_name: &str,
    now: DateTime<Utc>,
    max_blocks: usize,
) -> Vec<DisplayBlock> {
    let mut blocks = vec![
        DisplayBlock::text("# \u{1f4cb} Open Tasks\nOpen tasks for the team"),
        DisplayBlock::divider(Spacing::Large),
    ];

    if tasks.is_empty() {
        blocks.push(DisplayBlock::text(format!(
            "No open tasks. Use `/{command_name} create` to create a new task!"
        )));
    } else {
        for task in tasks {
            blocks.push(task_block(task));
            blocks.push(DisplayBlock::gap(Spacing::Small));

            if blocks.len() >= max_blocks {
                blocks.push(DisplayBlock::text(
                    "_...and more tasks. Some tasks are hidden due to message limits._",
                ));
                break;
            }
        }
    }

    blocks.push(DisplayBlock::divider(Spacing::Small));
    blocks.push(DisplayBlock::text(format!(
        "_Last updated: <t:{}:R> \u{2022} Use `/{command_name} help` for more information_",
        now.timestamp()
    )));
    blocks
}

/// Compact one-task block: id, title, assignee-or-"Unassigned", relative
/// due marker. Notes do not appear in the list view.
fn task_block(task: &Task) -> DisplayBlock {
    let assignee = task
        .assignee_id
        .as_ref()
        .map_or_else(|| "Unassigned".to_string(), |id| format!("<@{id}>"));
    DisplayBlock::text(format!(
        "**{}** \u{2022} {}\n{} \u{2022} <t:{}:R>",
        task.id,
        task.title,
        assignee,
        task.due_at.timestamp()
    ))
}
