pub mod client;
pub mod config;
pub mod doctor;

use clap::{Parser, Subcommand};

/// sentinel — a governance monitor for autonomous agents.
#[derive(Debug, Parser)]
#[command(name = "sentinel", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the server (default when no subcommand is given).
    Serve {
        /// Override `server.host` from the config file.
        #[arg(long)]
        host: Option<String>,
        /// Override `server.port` from the config file.
        #[arg(long)]
        port: Option<u16>,
        /// Override `server.db_path` from the config file.
        #[arg(long)]
        db_path: Option<std::path::PathBuf>,
    },
    /// Run diagnostic checks against the current configuration.
    Doctor,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
    /// Convenience client for talking to a running server (spec §6).
    #[command(subcommand)]
    Client(ClientCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

#[derive(Debug, Subcommand)]
pub enum ClientCommand {
    /// Register a new agent.
    Onboard {
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long)]
        model_hint: Option<String>,
        #[arg(long)]
        agent_id: Option<String>,
    },
    /// Submit one behavioral update for an agent.
    ProcessUpdate {
        #[arg(long)]
        agent_id: String,
        #[arg(long)]
        api_key: String,
        #[arg(long)]
        response_text: String,
        #[arg(long)]
        complexity: f64,
    },
    /// Resolve the agent bound to a session key.
    Identity {
        #[arg(long)]
        session_key: String,
    },
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path named by `SENTINEL_CONFIG` (or
/// `config.toml` by default). Returns the parsed [`Config`] and the path
/// that was used.
///
/// Shared by `serve`, `doctor`, and `config` subcommands so the logic
/// lives in one place.
pub fn load_config() -> anyhow::Result<(sentinel_domain::config::Config, String)> {
    let config_path = std::env::var("SENTINEL_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path).map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        sentinel_domain::config::Config::default()
    };

    Ok((config, config_path))
}
