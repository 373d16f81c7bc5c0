//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ws-dispatcher - websocket message dispatch and fan-out service
#[derive(Parser, Debug)]
#[command(
    name = "ws-dispatcher",
    author,
    version,
    about = "Websocket message dispatch and fan-out service",
    long_about = "Accepts events for an audience of a tenant, resolves the audience's live \n\
                  connections from the connection directory and fans the message out to \n\
                  the invocation backend or to every chat server."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "WS_DISPATCHER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "json",
        global = true,
        env = "WS_DISPATCHER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP ingress and dispatch engine
    Serve(ServeArgs),

    /// Validate configuration without serving
    Validate(ValidateArgs),

    /// Resolve the connections of a tenant's audience
    Targets(TargetsArgs),

    /// List the configured chat servers
    Peers(PeersArgs),

    /// Show the configured chat type
    ChatType(ChatTypeArgs),
}

/// Configuration source shared by every command
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration file (TOML or JSON). Without it the standard locations
    /// are searched, then environment variables are used.
    #[arg(short, long, env = "WS_DISPATCHER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `serve` command
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Override the listen address (`host:port` or `:port`)
    #[arg(long)]
    pub host: Option<String>,

    /// Log batches instead of invoking the function
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "WS_DISPATCHER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `targets` command
#[derive(Args, Debug)]
pub struct TargetsArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Tenant key (event subdomain)
    #[arg(long)]
    pub tenant: String,

    /// Audience selector (organizer, attendance; anything else = everyone)
    #[arg(long, default_value = "")]
    pub audience: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `peers` command
#[derive(Args, Debug)]
pub struct PeersArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `chat-type` command
#[derive(Args, Debug)]
pub struct ChatTypeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    #[default]
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
