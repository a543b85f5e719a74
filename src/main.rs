use std::path::PathBuf;
use std::sync::Arc;

use assignment_sync::canvas::CanvasHttpClient;
use assignment_sync::config::CanvasConfig;
use assignment_sync::services::SyncService;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Edit Canvas assignment due dates for every lab section in a spreadsheet.
#[derive(Parser)]
#[command(name = "assignment-sync")]
struct Cli {
    /// JSON file with default hostname, courseID and token
    #[arg(long, default_value = "defaults.json")]
    defaults: PathBuf,

    /// Canvas base URL, e.g. https://canvas.wisc.edu
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    course: Option<String>,

    /// Canvas API access token
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the course's assignments to a TSV file
    Download { file: PathBuf },
    /// Push edited due dates from a TSV file back to Canvas
    Upload {
        file: PathBuf,

        /// Report what would change without writing to Canvas
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "assignment_sync=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = CanvasConfig::load(&cli.defaults)?.with_overrides(cli.host, cli.course, cli.token);
    let canvas = Arc::new(CanvasHttpClient::new(config)?);
    let service = SyncService::new(canvas);

    let result = match &cli.command {
        Commands::Download { file } => service.download(file).await,
        Commands::Upload { file, dry_run } => service.upload(file, *dry_run).await,
    };

    match result {
        Ok(stats) => {
            info!("Done: {:?}", stats);
            Ok(())
        }
        Err(e) => {
            error!("Sync failed: {}", e);
            Err(e.into())
        }
    }
}
