//! gitsync CLI - commit and sync a git-backed working directory

use clap::{Parser, Subcommand};
use gitsync::{default_commit_message, Config, Severity, SyncResult};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gitsync")]
#[command(about = "Commit files and sync a working directory with its git remote", long_about = None)]
struct Cli {
    /// Config file (defaults to $GITSYNC_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Commit a single file and push it if a remote exists
    Commit {
        /// File to commit
        file: PathBuf,

        /// Commit message (default: "Update request: <file name>")
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Pull the latest changes from the remote
    Sync {
        /// Repository directory (default: $GITSYNC_REPOSITORY, then config)
        #[arg(short, long)]
        repo: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Commit { file, message } => {
            let message = message.unwrap_or_else(|| default_commit_message(&file));
            gitsync::commit_file(file, message, &config).await
        }
        Commands::Sync { repo } => gitsync::sync_repository(repo.as_deref(), &config).await,
    };

    report(&result, cli.json)?;

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn report(result: &SyncResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let label = match result.severity() {
        Severity::Success => "ok",
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    println!("{}: {}", label, result.message);

    Ok(())
}
