//! Bookstore Checks - end-to-end checks for a demo account/bookstore REST API
//!
//! Exit codes: 0 when every scenario passes, 1 when any scenario fails,
//! 2 when the suite cannot run (configuration or login failure).

use std::path::PathBuf;

use bookstore_checks::cli::{self, Verdict};
use bookstore_checks::common::config::Config;
use bookstore_checks::common::logging;
use bookstore_checks::commands::Commands;
use clap::Parser;

#[derive(Parser)]
#[command(name = "bookstore-checks", about = "End-to-end checks for the demo bookstore API")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Also write detailed logs, including response bodies, to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_guard = logging::init_cli(cli.log_file.as_deref());

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let result = match config {
        Ok(config) => cli::dispatch(cli.command, config).await,
        Err(e) => Err(e),
    };

    let code = match result {
        Ok(Verdict::Passed) => 0,
        Ok(Verdict::Failed) => 1,
        Err(e) => {
            eprintln!("Error: {e}");
            2
        }
    };

    // Flush the file logger before exiting
    drop(log_guard);
    std::process::exit(code);
}
