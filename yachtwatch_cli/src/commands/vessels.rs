//! The `vessels` subcommand: snapshot merged with the curated registry.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use yachtwatch_lib::registry::merge_registry;
use yachtwatch_lib::{config, CuratedRegistry, SnapshotStore, Vessel};

use crate::output::{self, OutputFormat};

/// Arguments for the `vessels` subcommand.
#[derive(Args)]
pub struct VesselsArgs {
    /// Snapshot file to read
    #[arg(long, default_value = "vessels.json")]
    pub snapshot: PathBuf,

    /// Registry file overriding the bundled curated registry
    #[arg(long)]
    pub registry: Option<PathBuf>,

    /// Only vessels with a confident length of at least this many meters
    #[arg(long, default_value = "0")]
    pub min_length: u32,

    /// Case-insensitive substring match on vessel or owner name
    #[arg(long)]
    pub search: Option<String>,

    /// Include tenders and support craft
    #[arg(long)]
    pub with_tenders: bool,
}

pub fn run(args: &VesselsArgs, format: &OutputFormat) -> Result<()> {
    let captured = SnapshotStore::new(&args.snapshot)
        .load()
        .with_context(|| format!("loading {}", args.snapshot.display()))?;

    let curated = match &args.registry {
        Some(path) => CuratedRegistry::load(path)
            .with_context(|| format!("loading registry {}", path.display()))?,
        None => CuratedRegistry::bundled().context("bundled registry")?,
    };

    let mut vessels = merge_registry(
        &captured,
        &curated.vessels,
        config::length_ratio_threshold(),
    );

    vessels.retain(|v| keep(v, args));
    vessels.sort_by(|a, b| b.effective_length().cmp(&a.effective_length()));

    match format {
        OutputFormat::Table => output::print_vessels_table(&vessels),
        OutputFormat::Json => output::print_json(&vessels),
    }
    Ok(())
}

fn keep(vessel: &Vessel, args: &VesselsArgs) -> bool {
    if !args.with_tenders && vessel.is_tender() {
        return false;
    }
    let length = vessel.effective_length();
    if length != 0 && length < args.min_length {
        return false;
    }
    if let Some(needle) = &args.search {
        let needle = needle.to_lowercase();
        return vessel.name.to_lowercase().contains(&needle)
            || vessel.owner.name.to_lowercase().contains(&needle);
    }
    true
}
