//! Clap derive structures for the `bmcsync` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Also compiled by `build.rs` for man page generation, so it may only
//! depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// bmcsync -- reconcile BMC power and BIOS state over Redfish
#[derive(Debug, Parser)]
#[command(
    name = "bmcsync",
    version,
    about = "Reconcile BMC power state and BIOS settings over Redfish",
    long_about = "Drives baseboard management controllers towards a declared state.\n\n\
        Power directives are issued as #ComputerSystem.Reset actions; BIOS\n\
        attributes are read in full, normalized to strings, merged with your\n\
        overrides and, on request, staged on the BMC.",
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
    /// BMC profile to use
    #[arg(long, short = 'p', env = "BMCSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// BMC address (overrides profile)
    #[arg(long, short = 'a', env = "BMCSYNC_ADDRESS", global = true)]
    pub address: Option<String>,

    /// Redfish user name
    #[arg(long, short = 'u', env = "BMCSYNC_USERNAME", global = true)]
    pub user: Option<String>,

    /// Redfish password
    #[arg(long, env = "BMCSYNC_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Computer system Id to manage (default: first one listed)
    #[arg(long, env = "BMCSYNC_SYSTEM", global = true)]
    pub system: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "BMCSYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "BMCSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (default: profile, then 30)
    #[arg(long, env = "BMCSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read power state or issue a reset action
    #[command(alias = "pw")]
    Power(PowerArgs),

    /// Read, compare and stage BIOS attributes
    Bios(BiosArgs),

    /// Reconcile every resource declared in a manifest
    Apply(ApplyArgs),

    /// Inspect CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  POWER
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PowerArgs {
    #[command(subcommand)]
    pub command: PowerCommand,
}

#[derive(Debug, Subcommand)]
pub enum PowerCommand {
    /// Show the observed power state (never issues an action)
    #[command(alias = "st")]
    Status,

    /// Issue a reset action
    ///
    /// The action is sent every time, whatever the current state. The
    /// reported state may lag behind while the host transitions.
    Apply {
        /// On, ForceOn, ForceOff, ForceRestart, GracefulRestart,
        /// GracefulShutdown, PushPowerButton, PowerCycle or Nmi
        #[arg(value_name = "DIRECTIVE")]
        directive: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BIOS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BiosArgs {
    #[command(subcommand)]
    pub command: BiosCommand,
}

#[derive(Debug, Subcommand)]
pub enum BiosCommand {
    /// Show all attributes, with overrides laid over the remote values
    #[command(alias = "get")]
    Show {
        /// Attribute override (repeatable)
        #[arg(long = "set", short = 's', value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// List overrides that differ from the BMC
    Diff {
        /// Attribute override (repeatable)
        #[arg(long = "set", short = 's', value_name = "KEY=VALUE", required = true)]
        set: Vec<String>,
    },

    /// Stage overrides that differ from the BMC (applied on next boot)
    Apply {
        /// Attribute override (repeatable)
        #[arg(long = "set", short = 's', value_name = "KEY=VALUE", required = true)]
        set: Vec<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  APPLY
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Manifest declaring power and BIOS resources
    #[arg(long, short = 'f', value_name = "FILE")]
    pub file: PathBuf,

    /// State file recording the outputs of successful runs
    /// [default: bmcsync.state.json]
    #[arg(long, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Read every resource and report pending work without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
