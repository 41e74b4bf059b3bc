//! Persistent seen-item store — run-over-run deduplication state.
//!
//! The store holds the fingerprints of the *previous* run's batch only, as a
//! rolling window: after computing novelty the state is overwritten with the
//! current batch, not unioned with history. Storage stays bounded, at the
//! cost of re-alerting on an item that disappears and reappears across more
//! than one run gap.
//!
//! One run owns the store exclusively (read once, write once). Deployments
//! where runs can overlap need external exclusion around the run, or a
//! lost update between read and overwrite becomes possible.

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::item::Item;

/// Severity of a failed store write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreWritePolicy {
    /// Propagate write failures (exactly-once novelty tracking required).
    Fatal,
    /// Log and continue; the next run may re-alert on this run's items.
    Warn,
}

/// Persistence abstraction behind the dedupe step, so the backing store
/// (flat file, embedded database, remote cache) is swappable without
/// touching pipeline logic.
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Load the previously persisted fingerprint set.
    ///
    /// Missing state is an empty set, not an error.
    async fn load(&self) -> Result<HashSet<String>, StoreError>;

    /// Replace the persisted set with `fingerprints` (full overwrite).
    async fn persist(&self, fingerprints: &[String]) -> Result<(), StoreError>;
}

/// The sub-sequence of `batch` whose fingerprints are absent from `seen`,
/// preserving original relative order.
pub fn filter_novel(batch: &[Item], seen: &HashSet<String>) -> Vec<Item> {
    batch
        .iter()
        .filter(|item| !seen.contains(&item.fingerprint()))
        .cloned()
        .collect()
}

/// The DEDUPE step: load previous state, compute the novel subset, then
/// unconditionally overwrite the store with the full current batch.
///
/// A read failure degrades to "treat history as empty" so a corrupted store
/// cannot crash-loop the run. A write failure is fatal or logged per
/// `policy`. The store is written exactly once here and never rolled back on
/// downstream failure.
pub async fn dedupe(
    store: &dyn SeenStore,
    batch: &[Item],
    policy: StoreWritePolicy,
) -> Result<Vec<Item>, StoreError> {
    let seen = match store.load().await {
        Ok(set) => set,
        Err(e) => {
            tracing::warn!(error = %e, "Seen-item store unreadable; treating history as empty");
            HashSet::new()
        }
    };

    let novel = filter_novel(batch, &seen);

    let current: Vec<String> = batch.iter().map(Item::fingerprint).collect();
    if let Err(e) = store.persist(&current).await {
        match policy {
            StoreWritePolicy::Fatal => return Err(e),
            StoreWritePolicy::Warn => {
                tracing::warn!(error = %e, "Seen-item store write failed; next run may re-alert");
            }
        }
    }

    tracing::info!(
        batch = batch.len(),
        seen = seen.len(),
        novel = novel.len(),
        "Dedupe complete"
    );
    Ok(novel)
}

/// Flat-file store: newline-delimited fingerprints, UTF-8, fully overwritten
/// on each run. Absence of the file is an empty set.
pub struct FileSeenStore {
    path: PathBuf,
}

impl FileSeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SeenStore for FileSeenStore {
    async fn load(&self) -> Result<HashSet<String>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content
                .lines()
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashSet::new()),
            Err(e) => Err(StoreError::Read {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    async fn persist(&self, fingerprints: &[String]) -> Result<(), StoreError> {
        let mut content = fingerprints.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| StoreError::Write {
                path: self.path.clone(),
                source: e,
            })
    }
}

/// In-memory store for tests and single-process experiments.
pub struct MemorySeenStore {
    state: tokio::sync::Mutex<HashSet<String>>,
}

impl MemorySeenStore {
    pub fn new() -> Self {
        Self {
            state: tokio::sync::Mutex::new(HashSet::new()),
        }
    }
}

impl Default for MemorySeenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SeenStore for MemorySeenStore {
    async fn load(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self.state.lock().await.clone())
    }

    async fn persist(&self, fingerprints: &[String]) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        *state = fingerprints.iter().cloned().collect();
        Ok(())
    }
}
