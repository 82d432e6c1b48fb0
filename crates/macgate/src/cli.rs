//! Clap derive structures for the `macgate` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// macgate -- register MAC addresses on network access control platforms
#[derive(Debug, Parser)]
#[command(
    name = "macgate",
    version,
    about = "Register MAC addresses on network access control platforms",
    long_about = "Adds endpoints, devices and static host list entries on ClearPass-style\n\
        NAC platforms whose REST schema varies between deployments.\n\n\
        List additions probe for working paths, try a cascade of write strategies,\n\
        and only report success once a re-read shows the entry.",
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
    /// Platform profile to use
    #[arg(long, short = 'p', env = "MACGATE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Platform base URL (overrides profile)
    #[arg(long, short = 'u', env = "MACGATE_URL", global = true)]
    pub url: Option<String>,

    /// OAuth client id (overrides profile)
    #[arg(long, env = "MACGATE_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "MACGATE_CLIENT_SECRET", global = true, hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MACGATE_OUTPUT",
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
    #[arg(long, short = 'k', env = "MACGATE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "MACGATE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Wait between an accepted write and its verification read, in milliseconds
    #[arg(long, env = "MACGATE_SETTLE_DELAY_MS", global = true)]
    pub settle_delay_ms: Option<u64>,
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
    /// Create and look up endpoint records
    #[command(alias = "ep")]
    Endpoint(EndpointArgs),

    /// Read and modify static host lists
    #[command(alias = "shl")]
    Lists(ListsArgs),

    /// Find a MAC address across every static host list
    Search {
        /// MAC address in any common notation
        mac: String,
    },

    /// Probe well-known API paths and report what answers
    Explore,

    /// Check credentials by requesting a token
    Ping,

    /// Create devices and manage their pre-shared secrets
    #[command(alias = "dev")]
    Device(DeviceArgs),

    /// Generate pronounceable secrets
    Secret(SecretArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Endpoint ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EndpointArgs {
    #[command(subcommand)]
    pub command: EndpointCommand,
}

#[derive(Debug, Subcommand)]
pub enum EndpointCommand {
    /// Create an endpoint record with status Known
    Add {
        /// MAC address in any common notation
        mac: String,

        /// Endpoint description
        #[arg(long, short = 'd')]
        description: Option<String>,
    },

    /// Look up the endpoint record for a MAC address
    Get {
        /// MAC address in any common notation
        mac: String,
    },
}

// ── Static host lists ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListsArgs {
    #[command(subcommand)]
    pub command: ListsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ListsCommand {
    /// List every static host list
    #[command(alias = "ls")]
    List,

    /// Show one list and its entries
    View {
        /// Static host list id
        list_id: String,
    },

    /// Check whether a MAC address is on one list
    Search {
        /// Static host list id
        list_id: String,

        /// MAC address in any common notation
        mac: String,
    },

    /// Add a MAC address to a list and verify it landed
    Add {
        /// Static host list id
        list_id: String,

        /// MAC address in any common notation
        mac: String,

        /// Entry description (defaults to a timestamped note)
        #[arg(long, short = 'd')]
        description: Option<String>,
    },

    /// Add many MAC addresses to a list in one update
    Batch {
        /// Static host list id
        list_id: String,

        /// Input file, one `MAC[,description]` per line; `-` or omitted reads stdin
        file: Option<PathBuf>,

        /// Input is a JSON array of {mac_address, description} objects
        #[arg(long)]
        json: bool,
    },
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DeviceArgs {
    #[command(subcommand)]
    pub command: DeviceCommand,
}

#[derive(Debug, Subcommand)]
pub enum DeviceCommand {
    /// Create a device record, falling back to an endpoint record
    Create {
        /// MAC address in any common notation
        mac: String,

        /// Owner email address
        #[arg(long, short = 'e')]
        email: String,

        /// Device name (defaults to Device-<last six hex digits>)
        #[arg(long, short = 'n')]
        name: Option<String>,
    },

    /// Set a device's pre-shared secret
    SetSecret {
        /// MAC address in any common notation
        mac: String,

        /// Secret value; prompted for when neither this nor --generate is given
        #[arg(long, conflicts_with = "generate")]
        secret: Option<String>,

        /// Generate a secret of the default length
        #[arg(long)]
        generate: bool,
    },

    /// Create a device with a generated secret and apply the secret
    Provision {
        /// MAC address in any common notation
        mac: String,

        /// Owner email address
        #[arg(long, short = 'e')]
        email: String,

        /// Device name (defaults to Device-<last six hex digits>)
        #[arg(long, short = 'n')]
        name: Option<String>,

        /// Role id assigned to the device
        #[arg(long)]
        role_id: Option<u32>,
    },
}

// ── Secrets ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SecretArgs {
    #[command(subcommand)]
    pub command: SecretCommand,
}

#[derive(Debug, Subcommand)]
pub enum SecretCommand {
    /// Print a new pronounceable secret
    Generate {
        /// Secret length (minimum 8)
        #[arg(long, short = 'l', default_value = "20")]
        length: usize,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the current configuration
    Show,

    /// Store the active profile's client secret in the system keyring
    SetSecret,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
