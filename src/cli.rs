use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use declarative::FailurePolicy;
use pkgkit::BackendKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pantry")]
#[command(version)]
#[command(about = "Converge system packages to a declarative manifest", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (default: ~/.config/pantry/config.toml)
    #[arg(long, global = true, env = "PANTRY_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Probe, plan and apply a manifest
    Apply(ApplyArgs),

    /// Show what apply would change, without changing anything
    Plan(PlanArgs),

    /// Show desired vs installed state per package
    Status(PlanArgs),

    /// Check a manifest for errors without touching the system
    Validate {
        /// Manifest file (.toml, .json or .rb)
        manifest: PathBuf,
    },

    /// Convert a manifest (e.g. a Chef recipe) to TOML
    Import(ImportArgs),

    /// Inspect settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Apply / Plan
// ============================================================================

#[derive(Args)]
pub struct ApplyArgs {
    /// Manifest file (.toml, .json or .rb)
    pub manifest: PathBuf,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// What to do after a failed action
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Per-invocation timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Show what would change without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Manifest file (.toml, .json or .rb)
    pub manifest: PathBuf,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args)]
pub struct BackendArgs {
    /// Package manager to use
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Auto,
    Apt,
    Brew,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => Self::Auto,
            BackendArg::Apt => Self::Apt,
            BackendArg::Brew => Self::Brew,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Stop at the first failure
    Halt,
    /// Attempt every action
    Continue,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Halt => Self::Halt,
            PolicyArg::Continue => Self::Continue,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

// ============================================================================
// Import
// ============================================================================

#[derive(Args)]
pub struct ImportArgs {
    /// Source manifest, usually a Chef recipe (.rb)
    pub source: PathBuf,

    /// Write TOML here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite the output file if it exists
    #[arg(short, long)]
    pub force: bool,
}

// ============================================================================
// Config
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print effective settings
    Show,

    /// Print the settings file path
    Path,
}
