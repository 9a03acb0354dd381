//! taskpin process entry point.
//!
//! Wires the application against the in-process backends and runs the
//! flow-deadline sweeper. The chat-platform session itself attaches at the
//! [`taskpin::channel::ChannelProvider`] seam and drives the entry points
//! on [`taskpin::app::App`]; this binary only hosts the core.
//!
//! ```bash
//! # Run with defaults
//! cargo run --bin taskpin
//!
//! # Custom branded command name
//! TASKPIN_COMMAND_NAME=teamtasks cargo run --bin taskpin
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;

use taskpin::app::App;
use taskpin::channel::LoopbackProvider;
use taskpin::config::{BotCliArgs, BotConfig};
use taskpin::store::{MemoryConfigStore, MemoryCounterStore, MemoryTaskStore};

#[tokio::main]
async fn main() {
    let cli = BotCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match BotConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(command_name = %config.command_name, "starting taskpin");

    let app = Arc::new(App::new(
        LoopbackProvider::new(),
        MemoryTaskStore::new(),
        MemoryConfigStore::new(),
        MemoryCounterStore::new(),
        config.command_name.clone(),
        config.max_list_blocks,
    ));

    // Sweep flow deadlines so timed-out creation flows take their default
    // transitions even when no interaction arrives.
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);
    let sweeper = {
        let app = Arc::clone(&app);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                ticker.tick().await;
                let committed = app.expire_due(Utc::now()).await;
                if !committed.is_empty() {
                    tracing::debug!(count = committed.len(), "committed timed-out flows");
                }
            }
        })
    };

    tracing::info!("taskpin ready; waiting for an interaction layer");
    if let Err(e) = sweeper.await {
        tracing::error!(error = %e, "deadline sweeper task failed");
        std::process::exit(1);
    }
}
