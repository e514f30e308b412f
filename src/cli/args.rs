//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    config::ConfigCommands,
    doc::DocCommands,
    exp::ExpCommands,
    init::InitArgs,
    ms::MsCommands,
    scope::ScopeCommands,
};

#[derive(Parser)]
#[command(name = "kct")]
#[command(author, version, about = "Keystone Contractor Toolkit")]
#[command(long_about = "A Unix-style toolkit for managing contracting documents (proposals, contracts, change orders) as plain text files under git version control, with a deterministic pricing engine.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .kct/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new KCT project
    Init(InitArgs),

    /// Expense line item management
    #[command(subcommand)]
    Exp(ExpCommands),

    /// Payment milestone management on a document
    #[command(subcommand)]
    Ms(MsCommands),

    /// Scope-of-work management on a document
    #[command(subcommand)]
    Scope(ScopeCommands),

    /// Document management (contracts, proposals, change orders)
    #[command(subcommand)]
    Doc(DocCommands),

    /// Show or edit project configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}
