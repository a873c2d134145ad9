//! CLI command definitions
//!
//! Defines the clap commands for the check suite.

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate once, then run every scenario and report the results
    Run(RunArgs),

    /// List scenarios without running them
    List {
        /// YAML scenario table to list instead of the built-in suite
        #[arg(long)]
        scenarios: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// YAML scenario table to run instead of the built-in suite
    #[arg(long)]
    pub scenarios: Option<PathBuf>,

    /// Only run scenarios whose name contains this text (case-insensitive)
    #[arg(long, short)]
    pub filter: Option<String>,

    /// Override the configured base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Maximum number of scenarios running at once
    #[arg(long, short)]
    pub jobs: Option<usize>,

    /// Print every response status and body
    #[arg(long, short)]
    pub verbose: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}
