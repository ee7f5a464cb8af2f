//! The `discover` subcommand: offline enrichment of the snapshot.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use yachtwatch_lib::config::EnrichConfig;
use yachtwatch_lib::enrich::EnrichOptions;
use yachtwatch_lib::yachtwatch_api::{LlmClient, RenderClient, WikiClient};
use yachtwatch_lib::{Enricher, SnapshotStore};

/// Arguments for the `discover` subcommand.
#[derive(Args)]
pub struct DiscoverArgs {
    /// Snapshot file to enrich in place
    #[arg(long, default_value = "vessels.json")]
    pub snapshot: PathBuf,

    /// Process at most this many vessels
    #[arg(long)]
    pub limit: Option<usize>,

    /// Skip vessels with a confident length below this many meters
    #[arg(long, default_value = "0")]
    pub min_length: u32,

    /// Re-process vessels that already look complete
    #[arg(long)]
    pub all: bool,

    /// Run the full pipeline without writing the snapshot
    #[arg(long)]
    pub dry_run: bool,

    /// Only resolve owner biographies for vessels that already name one
    #[arg(long)]
    pub enrich_owners: bool,

    /// Enable the generative-model fallback (requires ANTHROPIC_API_KEY)
    #[arg(long)]
    pub llm: bool,
}

pub async fn run(args: &DiscoverArgs) -> Result<()> {
    let render = RenderClient::new()?;
    let wiki = WikiClient::new()?;
    let llm = if args.llm {
        match std::env::var("ANTHROPIC_API_KEY") {
            Ok(key) if !key.is_empty() => Some(LlmClient::new(key)?),
            _ => bail!("--llm requires ANTHROPIC_API_KEY"),
        }
    } else {
        None
    };

    let opts = EnrichOptions {
        limit: args.limit,
        min_length: args.min_length,
        refetch_all: args.all,
        dry_run: args.dry_run,
        owners_only: args.enrich_owners,
        use_llm: args.llm,
    };

    let store = SnapshotStore::new(&args.snapshot);
    let enricher = Enricher::new(&render, &wiki, llm.as_ref(), EnrichConfig::from_env());

    if args.dry_run {
        eprintln!("Dry run: no snapshot writes");
    }
    let report = enricher.run(&store, &opts).await?;

    eprintln!(
        "Enrichment complete: {} of {} selected vessels processed",
        report.processed, report.selected
    );
    eprintln!(
        "  detail pages: {} hits, {} misses",
        report.detail_hits, report.detail_misses
    );
    eprintln!("  wikipedia pages found: {}", report.wiki_pages_found);
    eprintln!("  owners resolved: {}", report.owners_resolved);
    if args.llm {
        eprintln!("  model-enriched: {}", report.llm_enriched);
    }
    Ok(())
}
