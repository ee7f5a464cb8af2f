//! Live capture session: identity-keyed vessel store plus the debounced
//! flush path.
//!
//! The store absorbs rapid bursts of intercepted traffic without blocking;
//! it performs no I/O itself. Flushing is the job of a single background
//! task: a quiet period after the last upsert coalesces a burst into one
//! outbound write, and a longer periodic timer re-flushes even with no new
//! data so downstream storage never goes stale. At most one flush is ever in
//! flight; requests arriving mid-flush defer to the next debounce window.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::FlushConfig;
use crate::merge::merge_richer;
use crate::model::Vessel;
use crate::normalize::extract_payload_vessels;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// In-memory vessel store for one capture session, keyed by identity key.
///
/// Lifetime is the session: there is no TTL and no per-record removal, only
/// an explicit full clear. Staleness is read-side policy.
#[derive(Default)]
pub struct SessionStore {
    vessels: DashMap<String, Vessel>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a normalized record into the session.
    ///
    /// Returns `false` for an unidentifiable record (no mmsi, site id, or
    /// name), which is discarded.
    pub fn upsert(&self, incoming: Vessel) -> bool {
        let Some(key) = incoming.identity_key().map(str::to_string) else {
            return false;
        };
        match self.vessels.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                let merged = merge_richer(entry.get(), &incoming);
                entry.insert(merged);
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(incoming);
            }
        }
        true
    }

    /// Normalizes a raw capture payload and upserts every usable record.
    /// Returns the number of records absorbed.
    pub fn ingest_payload(&self, payload: &serde_json::Value) -> usize {
        extract_payload_vessels(payload)
            .into_iter()
            .filter(|v| self.upsert(v.clone()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn clear(&self) {
        self.vessels.clear();
    }

    /// Current session contents, unordered.
    pub fn snapshot(&self) -> Vec<Vessel> {
        self.vessels.iter().map(|entry| entry.value().clone()).collect()
    }
}

/// Destination of a session flush (snapshot store, HTTP upsert endpoint).
pub trait FlushSink: Send + Sync + 'static {
    fn flush(&self, vessels: Vec<Vessel>) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// Handle to a running flush task.
pub struct FlushHandle {
    touch_tx: mpsc::UnboundedSender<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl FlushHandle {
    /// Signals that the session changed; starts or extends the debounce
    /// window.
    pub fn touch(&self) {
        let _ = self.touch_tx.send(());
    }

    /// Performs a final flush and waits for the task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
    }
}

/// Spawns the background flush task for a session.
pub struct Flusher;

impl Flusher {
    pub fn spawn<S: FlushSink>(
        store: Arc<SessionStore>,
        sink: S,
        cfg: FlushConfig,
    ) -> FlushHandle {
        let (touch_tx, mut touch_rx) = mpsc::unbounded_channel::<()>();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut deadline: Option<Instant> = None;
            let mut interval =
                tokio::time::interval_at(Instant::now() + cfg.interval, cfg.interval);

            loop {
                let debounce_due = async {
                    match deadline {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                };

                tokio::select! {
                    touched = touch_rx.recv() => match touched {
                        Some(()) => deadline = Some(Instant::now() + cfg.debounce),
                        // All handles dropped: flush what we have and stop.
                        None => {
                            flush_once(&store, &sink).await;
                            break;
                        }
                    },
                    _ = debounce_due => {
                        deadline = None;
                        flush_once(&store, &sink).await;
                    }
                    _ = interval.tick() => {
                        flush_once(&store, &sink).await;
                    }
                    _ = &mut shutdown_rx => {
                        flush_once(&store, &sink).await;
                        break;
                    }
                }
            }
        });

        FlushHandle {
            touch_tx,
            shutdown_tx: Some(shutdown_tx),
            task,
        }
    }
}

async fn flush_once<S: FlushSink>(store: &SessionStore, sink: &S) {
    // Only positioned records leave the session; identity was already
    // enforced at upsert time.
    let vessels: Vec<Vessel> = store
        .snapshot()
        .into_iter()
        .filter(|v| v.lat.is_some())
        .collect();
    if vessels.is_empty() {
        return;
    }
    let count = vessels.len();
    if let Err(err) = sink.flush(vessels).await {
        tracing::warn!("session flush of {} vessels failed: {}", count, err);
    } else {
        tracing::debug!("session flush wrote {} vessels", count);
    }
}
