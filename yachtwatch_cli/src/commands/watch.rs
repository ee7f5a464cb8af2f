//! The `watch` subcommand: follow a live capture stream on stdin.
//!
//! Each input line is one captured payload (NDJSON). Records merge into an
//! in-memory session; a debounced background task writes the session through
//! to the snapshot, so bursts of traffic cost one write instead of many.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use yachtwatch_lib::config::FlushConfig;
use yachtwatch_lib::session::{BoxError, FlushSink, Flusher};
use yachtwatch_lib::{SessionStore, SnapshotStore, Vessel};

/// Arguments for the `watch` subcommand.
#[derive(Args)]
pub struct WatchArgs {
    /// Snapshot file to write through to
    #[arg(long, default_value = "vessels.json")]
    pub snapshot: PathBuf,
}

struct SnapshotSink {
    store: SnapshotStore,
}

impl FlushSink for SnapshotSink {
    fn flush(&self, vessels: Vec<Vessel>) -> impl Future<Output = Result<(), BoxError>> + Send {
        async move {
            self.store.upsert(&vessels)?;
            Ok(())
        }
    }
}

pub async fn run(args: &WatchArgs) -> Result<()> {
    let session = Arc::new(SessionStore::new());
    let sink = SnapshotSink {
        store: SnapshotStore::new(&args.snapshot),
    };
    let handle = Flusher::spawn(Arc::clone(&session), sink, FlushConfig::from_env());

    eprintln!(
        "Watching stdin; writing through to {}",
        args.snapshot.display()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seen_lines = 0usize;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        seen_lines += 1;
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(payload) => {
                if session.ingest_payload(&payload) > 0 {
                    handle.touch();
                }
            }
            Err(err) => {
                tracing::warn!(line = seen_lines, "skipping unparsable payload: {}", err);
            }
        }
    }

    // EOF: final flush before exit.
    handle.shutdown().await;
    eprintln!(
        "Stream ended after {} payloads; {} vessels in session",
        seen_lines,
        session.len()
    );
    Ok(())
}
