//! The `ingest` subcommand: one captured feed payload into the snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use yachtwatch_lib::{SessionStore, SnapshotStore};

/// Arguments for the `ingest` subcommand.
#[derive(Args)]
pub struct IngestArgs {
    /// Captured payload file (JSON, any known feed shape)
    pub payload: PathBuf,

    /// Snapshot file to merge into
    #[arg(long, default_value = "vessels.json")]
    pub snapshot: PathBuf,
}

pub async fn run(args: &IngestArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.payload)
        .with_context(|| format!("reading {}", args.payload.display()))?;
    let payload: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", args.payload.display()))?;

    // Route through a session so duplicates within the payload merge before
    // they hit the snapshot.
    let session = SessionStore::new();
    let absorbed = session.ingest_payload(&payload);

    let store = SnapshotStore::new(&args.snapshot);
    store.upsert(&session.snapshot())?;
    let total = store.load()?.len();

    eprintln!(
        "Ingested {} records into {} ({} vessels total)",
        absorbed,
        args.snapshot.display(),
        total
    );
    Ok(())
}
