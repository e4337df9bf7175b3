//! Clap derive structures for the `fwdms` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// fwdms -- firmware catalog client for device-management services
#[derive(Debug, Parser)]
#[command(
    name = "fwdms",
    version,
    about = "Browse, download and report device firmware from a DMS",
    long_about = "Talks to a firmware catalog and delivery service (DMS).\n\n\
        Lists the firmware versions offered for a device, downloads images\n\
        to local storage, reports completed installations, and watches\n\
        reachability of the service host.",
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
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "FWDMS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// DMS base URL (overrides profile)
    #[arg(long, short = 'S', env = "FWDMS_SERVER", global = true)]
    pub server: Option<String>,

    /// DMS API key
    #[arg(long, env = "FWDMS_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FWDMS_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "FWDMS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "FWDMS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Root directory for downloaded images (overrides profile)
    #[arg(long, env = "FWDMS_DOWNLOAD_DIR", global = true)]
    pub download_dir: Option<PathBuf>,
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
    /// List firmware versions available for a device
    #[command(alias = "ls")]
    List(ListArgs),

    /// Download a firmware image
    #[command(alias = "dl")]
    Download(DownloadArgs),

    /// Report a completed installation
    Report(ReportArgs),

    /// Watch DMS reachability until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Firmware commands ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Device identifier
    pub device_id: String,

    /// Only show versions with this flavor tag (e.g. "stable")
    #[arg(long, short = 't')]
    pub tag: Option<String>,
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Device identifier
    pub device_id: String,

    /// Firmware version to fetch
    pub version: String,

    /// Don't draw a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// UUID of the device the firmware was installed on
    pub device_uuid: String,

    /// Installed firmware bundle identifier
    pub bundle_id: String,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Device identifier
    pub device_id: String,

    /// Fetch the firmware list each time the service becomes reachable
    #[arg(long, short = 'r')]
    pub refresh: bool,

    /// Seconds between reachability probes (overrides profile)
    #[arg(long)]
    pub probe_interval: Option<u64>,
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

    /// Display current configuration (secrets masked)
    Show,

    /// Create or update a profile from --server and --api-key
    Init {
        /// Read the API key from this environment variable at runtime
        #[arg(long)]
        api_key_env: Option<String>,

        /// Save --api-key into the config file instead of the system keyring
        #[arg(long)]
        plaintext_key: bool,

        /// Replace the profile if it already exists
        #[arg(long, short = 'f')]
        force: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
