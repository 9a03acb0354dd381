//! Application wiring.
//!
//! [`App`] owns the stores, the id issuer, the list synchronizer, the
//! creation flows, and the command registry, and exposes the entry points
//! the interaction layer drives. Collaborators are injected at
//! construction (there is no global session handle), which is what lets
//! the whole application run against in-memory stores and the loopback
//! provider in tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use taskpin_proto::config::ServerConfig;
use taskpin_proto::display::{DisplayBlock, Spacing};
use taskpin_proto::task::TaskId;

use crate::channel::ChannelProvider;
use crate::commands::{CommandContext, CommandKind, CommandRegistry, executor};
use crate::flow::{AssignmentChoice, CreationFlows, FlowError, FlowReply, ModalFields};
use crate::ids::IdIssuer;
use crate::list::{ListSynchronizer, SyncError, SyncMode, SyncOutcome};
use crate::store::{ConfigStore, CounterStore, StoreError, TaskStore};

/// Internal command failures, logged and collapsed into the generic
/// user-facing payload.
#[derive(Debug, thiserror::Error)]
enum CommandError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// The assembled application.
pub struct App<P, T, C, N>
where
    P: ChannelProvider,
    T: TaskStore,
    C: ConfigStore,
    N: CounterStore,
{
    provider: Arc<P>,
    tasks: Arc<T>,
    configs: Arc<C>,
    issuer: IdIssuer<Arc<N>>,
    sync: Arc<ListSynchronizer<Arc<P>, Arc<T>, Arc<C>>>,
    flows: CreationFlows<Arc<P>, Arc<T>, Arc<C>, Arc<N>>,
    registry: CommandRegistry,
    command_name: String,
}

impl<P, T, C, N> App<P, T, C, N>
where
    P: ChannelProvider,
    T: TaskStore,
    C: ConfigStore,
    N: CounterStore,
{
    /// Assembles the application from its collaborators.
    pub fn new(
        provider: P,
        tasks: T,
        configs: C,
        counters: N,
        command_name: impl Into<String>,
        max_list_blocks: usize,
    ) -> Self {
        let command_name = command_name.into();
        let provider = Arc::new(provider);
        let tasks = Arc::new(tasks);
        let configs = Arc::new(configs);
        let counters = Arc::new(counters);

        let sync = Arc::new(
            ListSynchronizer::new(
                Arc::clone(&provider),
                Arc::clone(&tasks),
                Arc::clone(&configs),
                command_name.clone(),
            )
            .with_max_blocks(max_list_blocks),
        );
        let flows = CreationFlows::new(
            IdIssuer::new(Arc::clone(&counters)),
            Arc::clone(&tasks),
            Arc::clone(&sync),
        );

        Self {
            provider,
            tasks,
            configs,
            issuer: IdIssuer::new(counters),
            sync,
            flows,
            registry: CommandRegistry::with_defaults(),
            command_name,
        }
    }

    /// The branded command prefix shown in user-facing text.
    #[must_use]
    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    // -----------------------------------------------------------------------
    // Interaction-layer entry points
    // -----------------------------------------------------------------------

    /// A user asked to create a task: opens the flow and returns the
    /// input-form payload.
    pub async fn on_create_requested(&self, guild_id: &str, user_id: &str) -> FlowReply {
        self.flows.begin(guild_id, user_id, Utc::now()).await
    }

    /// The input form was submitted.
    pub async fn on_modal_submitted(
        &self,
        guild_id: &str,
        user_id: &str,
        fields: &ModalFields,
    ) -> FlowReply {
        let result = self
            .flows
            .submit_modal(guild_id, user_id, fields, Utc::now())
            .await;
        self.flow_reply(result, guild_id)
    }

    /// The requester answered the assignment-choice buttons.
    pub async fn on_assignment_choice(
        &self,
        task_id: TaskId,
        choice: AssignmentChoice,
    ) -> FlowReply {
        let result = self
            .flows
            .choose_assignment(task_id, choice, Utc::now())
            .await;
        self.flow_reply(result, "")
    }

    /// The requester picked an assignee from the member select.
    pub async fn on_assignee_selected(&self, task_id: TaskId, member_id: &str) -> FlowReply {
        let result = self
            .flows
            .select_assignee(task_id, member_id, Utc::now())
            .await;
        self.flow_reply(result, "")
    }

    /// Executes a named command and returns the payload to present.
    pub async fn execute_command(&self, name: &str, ctx: &CommandContext) -> Vec<DisplayBlock> {
        let Some(entry) = self.registry.get(name) else {
            tracing::error!(command = name, "command not found in registry");
            return executor::generic_error_payload(&self.command_name, name);
        };
        if !entry.metadata.implemented {
            return executor::construction_payload(name);
        }
        if entry.metadata.requires_guild && ctx.guild_id.is_none() {
            return executor::guild_required_payload();
        }
        let guild_id = ctx.guild_id.as_deref().unwrap_or_default();

        let result = match entry.kind {
            CommandKind::Create => {
                Ok(self.flows.begin(guild_id, &ctx.user_id, Utc::now()).await.blocks)
            }
            CommandKind::SetChannel => self.cmd_set_channel(guild_id, ctx).await,
            CommandKind::Refresh => self.cmd_refresh(guild_id).await,
            CommandKind::Help => Ok(executor::help_payload(&self.command_name, &self.registry)),
            CommandKind::Planned => Ok(executor::construction_payload(name)),
        };

        match result {
            Ok(blocks) => blocks,
            Err(err) => {
                tracing::error!(command = name, guild_id, error = %err, "command execution failed");
                executor::generic_error_payload(&self.command_name, name)
            }
        }
    }

    /// Sweeps expired flow deadlines; returns the ids committed unassigned.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> Vec<TaskId> {
        self.flows.expire_due(now).await
    }

    /// Reconciles a guild's pinned list on demand.
    ///
    /// # Errors
    ///
    /// Propagates [`SyncError`] from the synchronizer.
    pub async fn sync_list(&self, guild_id: &str, mode: SyncMode) -> Result<SyncOutcome, SyncError> {
        self.sync.sync(guild_id, mode).await
    }

    /// Administrative counter repair (see [`IdIssuer::repair`]); not safe
    /// to run concurrently with task creation for the same guild.
    ///
    /// # Errors
    ///
    /// Propagates [`StoreError`] from the scan or the counter write.
    pub async fn repair_task_counter(&self, guild_id: &str) -> Result<u64, StoreError> {
        self.issuer.repair(guild_id, &self.tasks).await
    }

    // -----------------------------------------------------------------------
    // Command handlers
    // -----------------------------------------------------------------------

    async fn cmd_set_channel(
        &self,
        guild_id: &str,
        ctx: &CommandContext,
    ) -> Result<Vec<DisplayBlock>, CommandError> {
        let Some(target) = ctx.channel_arg.clone().or_else(|| ctx.channel_id.clone()) else {
            return Ok(vec![DisplayBlock::text(
                "\u{274c} Could not determine the target channel.",
            )]);
        };

        let mut config = self
            .configs
            .get(guild_id)
            .await?
            .unwrap_or_else(|| ServerConfig::new(guild_id));

        // Best-effort removal of the previous list message in the old
        // channel; the reconfiguration proceeds either way.
        if let (Some(old_channel), Some(old_message)) = (
            config.task_list_channel_id.clone(),
            config.task_list_message_id.clone(),
        ) && let Err(err) = self.provider.delete_message(&old_channel, &old_message).await
        {
            tracing::warn!(
                guild_id,
                channel_id = %old_channel,
                message_id = %old_message,
                error = %err,
                "could not delete task list message from previous channel"
            );
        }

        config.task_list_channel_id = Some(target.clone());
        // Changing channels invalidates the recorded message id.
        config.task_list_message_id = None;
        self.configs.upsert(&config).await?;

        self.sync.sync(guild_id, SyncMode::Rebuild).await?;

        Ok(vec![
            DisplayBlock::text("# \u{2705} Channel Set"),
            DisplayBlock::divider(Spacing::Small),
            DisplayBlock::text(format!(
                "Task list channel set to <#{target}>\n\n\
                 The task list has been refreshed in the new channel."
            )),
        ])
    }

    async fn cmd_refresh(&self, guild_id: &str) -> Result<Vec<DisplayBlock>, CommandError> {
        match self.sync.sync(guild_id, SyncMode::Rebuild).await? {
            SyncOutcome::NotConfigured => Ok(vec![DisplayBlock::text(format!(
                "No task list channel is configured. Use `/{} set-channel` first.",
                self.command_name
            ))]),
            SyncOutcome::Created { .. } | SyncOutcome::Edited { .. } => Ok(vec![
                DisplayBlock::text("# \u{2705} Task List Refreshed"),
                DisplayBlock::divider(Spacing::Small),
                DisplayBlock::text(
                    "The pinned task list has been completely rebuilt from the database.",
                ),
            ]),
        }
    }

    /// Maps flow outcomes to the payload the interaction layer presents.
    fn flow_reply(&self, result: Result<FlowReply, FlowError>, guild_id: &str) -> FlowReply {
        match result {
            Ok(reply) => reply,
            Err(FlowError::UnknownFlow) => FlowReply {
                task_id: None,
                blocks: vec![DisplayBlock::text(
                    "\u{231b} This task creation session has expired. Run create again.",
                )],
            },
            Err(err) => {
                tracing::error!(guild_id, error = %err, "task creation failed");
                FlowReply {
                    task_id: None,
                    blocks: executor::generic_error_payload(&self.command_name, "create"),
                }
            }
        }
    }
}
