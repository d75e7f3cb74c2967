//! labpull CLI - Main Entry Point
//!
//! Command-line interface for searching the remote lab-image catalog and
//! driving asynchronous image installs on a managed lab host.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use labpull_client::PanelClient;

mod commands;
mod output;

use commands::{install, progress, search};

/// labpull - remote lab-image install client
#[derive(Parser)]
#[command(name = "labpull")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Panel API base URL
    #[arg(
        long,
        default_value = "http://127.0.0.1/api/ishare2",
        env = "LABPULL_PANEL_URL",
        global = true
    )]
    panel_url: String,

    /// Preferred language for backend messages
    #[arg(long, env = "LABPULL_LANG", global = true)]
    lang: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the remote image catalog
    Search(search::SearchArgs),

    /// Install an image onto the lab host and follow it to completion
    Install(install::InstallArgs),

    /// Query the progress of an install job once
    Progress(progress::ProgressArgs),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let api = Arc::new(PanelClient::new(cli.panel_url.clone(), cli.lang.clone()));

    match cli.command {
        Commands::Search(args) => search::execute(args, api, cli.format).await?,
        Commands::Install(args) => install::execute(args, api).await?,
        Commands::Progress(args) => progress::execute(args, api, cli.format).await?,
        Commands::Version => {
            println!("labpull {}", labpull_common::VERSION);
        }
    }

    Ok(())
}
