//! Clap derive structures for the `doorbird` CLI.
//!
//! Defines the command tree and global flags. Also compiled by `build.rs`
//! for man page generation, so it must only depend on clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// doorbird -- talk to a Doorbird door station over the LAN API
#[derive(Debug, Parser)]
#[command(
    name = "doorbird",
    version,
    about = "Control and monitor Doorbird door stations from the command line",
    long_about = "Query device identity, open doors, switch on the IR light, and \
        watch doorbell and motion events from a Doorbird on your network.\n\n\
        Devices are configured as named profiles; any profile field can be \
        overridden with flags or DOORBIRD_* environment variables.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "DOORBIRD_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device host or IP (overrides profile)
    #[arg(long, short = 'a', env = "DOORBIRD_ADDRESS", global = true)]
    pub address: Option<String>,

    /// API username (overrides profile)
    #[arg(long, short = 'u', env = "DOORBIRD_USERNAME", global = true)]
    pub user: Option<String>,

    /// API password
    #[arg(long, env = "DOORBIRD_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "DOORBIRD_INSECURE", global = true)]
    pub insecure: bool,

    /// Path to a PEM CA certificate for the device
    #[arg(long, env = "DOORBIRD_CA_CERT", global = true)]
    pub ca_cert: Option<PathBuf>,

    /// Command response timeout in seconds
    #[arg(long, env = "DOORBIRD_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "DOORBIRD_OUTPUT",
        default_value = "text",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text (default)
    Text,
    /// Pretty-printed JSON
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show device identity (MAC, model, firmware, relays)
    Info,

    /// Trigger a door relay
    #[command(alias = "open")]
    OpenDoor(OpenDoorArgs),

    /// Switch on the infrared night-vision light
    #[command(alias = "light")]
    LightOn,

    /// Watch doorbell and motion events until interrupted
    #[command(alias = "watch")]
    Monitor(MonitorArgs),

    /// Print credentialed snapshot, audio, and video URLs
    Urls,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Device commands ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct OpenDoorArgs {
    /// Relay identifier, e.g. "1" or "gggaaa@1" for a paired I/O door controller
    #[arg(default_value = "1")]
    pub relay: String,
}

#[derive(Debug, Args)]
pub struct MonitorArgs {
    /// Event names to report (repeatable)
    #[arg(
        long = "event",
        short = 'e',
        value_delimiter = ',',
        default_values = ["doorbell", "motionsensor"]
    )]
    pub events: Vec<String>,

    /// Keep retrying when the stream cannot be opened, not only after it drops
    #[arg(long)]
    pub retry: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current configuration (passwords masked)
    Show,

    /// Set a field on the active profile
    Set {
        /// Profile field (address, name, username, password_env, ca_cert, insecure)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a profile's password in the system keyring
    SetPassword {
        /// Profile name (defaults to the active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
