//! Configuration system for the taskpin process.
//!
//! Supports layered configuration with the following priority (highest
//! first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskpin/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;

/// Errors that can occur when loading process configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BotConfigFile {
    bot: BotFileSection,
}

/// `[bot]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BotFileSection {
    command_name: Option<String>,
    max_list_blocks: Option<usize>,
    sweep_interval_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the taskpin process.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "taskpin guild task tracker")]
pub struct BotCliArgs {
    /// Branded command prefix shown in user-facing text.
    #[arg(long, env = "TASKPIN_COMMAND_NAME")]
    pub command_name: Option<String>,

    /// Path to config file (default: `~/.config/taskpin/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum display blocks per rendered task list.
    #[arg(long)]
    pub max_list_blocks: Option<usize>,

    /// Seconds between flow-deadline sweeps.
    #[arg(long)]
    pub sweep_interval_secs: Option<u64>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKPIN_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved process configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Branded command prefix.
    pub command_name: String,
    /// Renderer block budget.
    pub max_list_blocks: usize,
    /// Seconds between flow-deadline sweeps.
    pub sweep_interval_secs: u64,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_name: "taskpin".to_string(),
            max_list_blocks: crate::list::render::DEFAULT_MAX_BLOCKS,
            sweep_interval_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

impl BotConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &BotCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `BotConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &BotCliArgs, file: &BotConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            command_name: cli
                .command_name
                .clone()
                .or_else(|| file.bot.command_name.clone())
                .unwrap_or(defaults.command_name),
            max_list_blocks: cli
                .max_list_blocks
                .or(file.bot.max_list_blocks)
                .unwrap_or(defaults.max_list_blocks),
            sweep_interval_secs: cli
                .sweep_interval_secs
                .or(file.bot.sweep_interval_secs)
                .unwrap_or(defaults.sweep_interval_secs),
            log_level: cli.log_level.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
fn load_config_file(
    explicit_path: Option<&std::path::Path>,
) -> Result<BotConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(BotConfigFile::default());
        };
        config_dir.join("taskpin").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BotConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
