use crate::{
    errors::SyncError,
    occasions::{InventorySnapshot, Occasion},
    source::OccasionSource,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::time::timeout;
use tracing::{debug, info};

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Tuning for a bulk scan.
///
/// `concurrency = 1` reproduces the observed strictly sequential read
/// behavior; higher values issue reads in parallel while the buffered
/// stream still emits results in ascending id order.
#[derive(Clone, Debug)]
pub struct ScanConfig {
    pub read_timeout: Duration,
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            concurrency: 1,
        }
    }
}

/// The one mutable shared resource: the currently published snapshot.
///
/// Snapshots are only ever replaced wholesale under the lock, so readers
/// always observe either the previous complete scan or the next one.
#[derive(Clone)]
pub struct SnapshotStore {
    inner: Arc<Mutex<InventorySnapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(InventorySnapshot::empty())),
        }
    }

    pub fn current(&self) -> InventorySnapshot {
        self.inner.lock().unwrap().clone()
    }

    fn publish(&self, snapshot: InventorySnapshot) {
        *self.inner.lock().unwrap() = snapshot;
    }

    fn mark_loading(&self) {
        self.inner.lock().unwrap().loading = true;
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the occasion count once, then every record in `1..=total`, and
/// publishes the result as a single new snapshot.
///
/// On any failure the previously published occasions stay in place and
/// `loading` remains set; partial results are never published.
pub async fn scan_all<S: OccasionSource>(
    source: &S,
    store: &SnapshotStore,
    config: &ScanConfig,
) -> Result<InventorySnapshot, SyncError> {
    store.mark_loading();

    // Read exactly once per scan; a count change mid-scan is only picked up
    // by the next scan.
    let total = source
        .total_occasions()
        .await
        .map_err(|e| SyncError::ReadFailed {
            id: None,
            reason: e.to_string(),
        })?;
    debug!(total, "scanning occasion inventory");

    let concurrency = config.concurrency.max(1);
    let reads = (1..=total).map(|id| fetch_one(source, id, config.read_timeout, total));
    let occasions: Vec<Occasion> =
        stream::iter(reads).buffered(concurrency).try_collect().await?;

    let snapshot = InventorySnapshot {
        occasions,
        total,
        loading: false,
    };
    store.publish(snapshot.clone());
    info!(total, "inventory scan complete");
    Ok(snapshot)
}

/// Re-fetches a single occasion and patches it into a wholesale-replaced
/// snapshot. Falls back to a full scan when nothing has been published yet.
pub async fn refresh_occasion<S: OccasionSource>(
    source: &S,
    store: &SnapshotStore,
    id: u64,
    config: &ScanConfig,
) -> Result<InventorySnapshot, SyncError> {
    let current = store.current();
    if current.loading || current.occasion(id).is_none() {
        return scan_all(source, store, config).await;
    }

    let fresh = fetch_one(source, id, config.read_timeout, current.total).await?;
    let mut occasions = current.occasions;
    if let Some(slot) = occasions.iter_mut().find(|o| o.id == id) {
        *slot = fresh;
    }
    let snapshot = InventorySnapshot {
        occasions,
        total: current.total,
        loading: false,
    };
    store.publish(snapshot.clone());
    debug!(id, "occasion refreshed");
    Ok(snapshot)
}

async fn fetch_one<S: OccasionSource>(
    source: &S,
    id: u64,
    read_timeout: Duration,
    total: u64,
) -> Result<Occasion, SyncError> {
    let occasion = match timeout(read_timeout, source.occasion(id)).await {
        Err(_) => {
            return Err(SyncError::Timeout {
                id,
                timeout_ms: read_timeout.as_millis() as u64,
            });
        }
        Ok(Err(e)) => {
            return Err(SyncError::ReadFailed {
                id: Some(id),
                reason: e.to_string(),
            });
        }
        Ok(Ok(occasion)) => occasion,
    };
    // The contract guarantees dense 1-based ids; a disagreement means the
    // record cannot be trusted.
    if occasion.id != id {
        return Err(SyncError::PartialScanAborted {
            id,
            completed: (id - 1) as usize,
            total,
            reason: format!("record at id {id} reports id {}", occasion.id),
        });
    }
    Ok(occasion)
}
