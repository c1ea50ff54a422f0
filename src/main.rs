use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod build;
mod commands;
mod config;
mod util;

#[derive(Parser)]
#[command(name = "folio", version, about = "Build the portfolio site from markdown posts")]
struct Args {
    /// Log pipeline details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    command: FolioCommand,
}

#[derive(Parser)]
struct BuildArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = "folio.yaml")]
    config_file: Option<PathBuf>,
}

#[derive(Parser)]
struct CleanArgs {
    /// The path to the configuration file
    #[arg(short, long, default_value = "folio.yaml")]
    config_file: Option<PathBuf>,

    /// List what would be removed without removing it
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum FolioCommand {
    /// Build the site into the output directory
    Build(BuildArgs),

    /// Empty the output directory
    Clean(CleanArgs),
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match args.command {
        FolioCommand::Build(args) => commands::build::run(&args).await,
        FolioCommand::Clean(args) => commands::clean::run(&args).await,
    };

    if let Err(e) = &result {
        tracing::error!("{e:#}");
    }
    result
}
