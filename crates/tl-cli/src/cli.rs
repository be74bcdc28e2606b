//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Tideline - reconcile database migration versions declaratively
#[derive(Parser, Debug)]
#[command(name = "tl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show what apply would change
    Plan(PlanArgs),

    /// Migrate every resource to its desired version
    Apply(ApplyArgs),

    /// Re-read applied versions from the databases
    Refresh(RefreshArgs),

    /// Revert all migrations and forget the resources
    Destroy(DestroyArgs),

    /// Show recorded state
    Status(StatusArgs),
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Resource names to plan (comma-separated, default: all)
    #[arg(short, long)]
    pub resources: Option<String>,
}

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Resource names to apply (comma-separated, default: all)
    #[arg(short, long)]
    pub resources: Option<String>,
}

/// Arguments for the refresh command
#[derive(Args, Debug)]
pub struct RefreshArgs {}

/// Arguments for the destroy command
#[derive(Args, Debug)]
pub struct DestroyArgs {
    /// Resource names to destroy (comma-separated, default: all)
    #[arg(short, long)]
    pub resources: Option<String>,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Human-readable table
    Table,
    /// JSON
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
