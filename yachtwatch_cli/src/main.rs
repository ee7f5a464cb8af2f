mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "yachtwatch")]
#[command(about = "Track, reconcile, and enrich yacht sightings")]
struct Cli {
    /// Output format: table or json
    #[arg(long, default_value = "table", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a captured feed payload file into the snapshot
    Ingest(commands::ingest::IngestArgs),
    /// Follow a live capture stream on stdin with debounced write-back
    Watch(commands::watch::WatchArgs),
    /// List snapshot vessels merged with the curated registry
    Vessels(commands::vessels::VesselsArgs),
    /// Enrich snapshot vessels from detail pages and Wikipedia
    Discover(commands::discover::DiscoverArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("yachtwatch=info".parse().unwrap()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Table,
    };

    match &cli.command {
        Commands::Ingest(args) => commands::ingest::run(args).await?,
        Commands::Watch(args) => commands::watch::run(args).await?,
        Commands::Vessels(args) => commands::vessels::run(args, &format)?,
        Commands::Discover(args) => commands::discover::run(args).await?,
    }

    Ok(())
}
