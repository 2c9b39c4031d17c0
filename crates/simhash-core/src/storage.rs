//! Storage backends for band partitions.

use crate::{Result, SimhashError};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// One row of a band partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BandRow {
    /// Partition number, `0..=k`.
    pub band: usize,
    pub band_key: String,
    pub fingerprint_hex: String,
}

impl BandRow {
    pub fn new(band: usize, band_key: impl Into<String>, fingerprint_hex: impl Into<String>) -> Self {
        Self {
            band,
            band_key: band_key.into(),
            fingerprint_hex: fingerprint_hex.into(),
        }
    }
}

/// A write inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BandStatement {
    Insert(BandRow),
    Delete(BandRow),
}

impl BandStatement {
    pub fn row(&self) -> &BandRow {
        match self {
            Self::Insert(row) | Self::Delete(row) => row,
        }
    }
}

/// Trait for band partition storage backends.
///
/// Each partition holds `(band_key, fingerprint_hex)` rows, unique on the
/// pair: inserting an existing row and deleting a missing one both succeed
/// without effect.
#[async_trait]
pub trait BandStore: Send + Sync {
    /// Drop every partition and create `partitions` empty ones.
    async fn reset(&self, partitions: usize) -> Result<()>;

    /// Create any of the first `partitions` partitions that do not exist yet.
    async fn ensure_partitions(&self, partitions: usize) -> Result<()>;

    /// Apply a batch of writes in one backend call.
    async fn execute(&self, batch: &[BandStatement]) -> Result<()>;

    /// All fingerprint hex values stored under `band_key` in partition `band`.
    async fn fetch(&self, band: usize, band_key: &str) -> Result<Vec<String>>;
}

#[async_trait]
impl<S> BandStore for Arc<S>
where
    S: BandStore + ?Sized,
{
    async fn reset(&self, partitions: usize) -> Result<()> {
        (**self).reset(partitions).await
    }

    async fn ensure_partitions(&self, partitions: usize) -> Result<()> {
        (**self).ensure_partitions(partitions).await
    }

    async fn execute(&self, batch: &[BandStatement]) -> Result<()> {
        (**self).execute(batch).await
    }

    async fn fetch(&self, band: usize, band_key: &str) -> Result<Vec<String>> {
        (**self).fetch(band, band_key).await
    }
}

type Partition = HashMap<String, BTreeSet<String>>;

/// In-memory band storage (for testing and embedding).
///
/// Batches are applied under a single write lock, so they are atomic.
pub struct MemoryBandStore {
    partitions: Arc<RwLock<Vec<Partition>>>,
}

impl MemoryBandStore {
    pub fn new() -> Self {
        Self {
            partitions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Number of partitions currently present.
    pub async fn partition_count(&self) -> usize {
        self.partitions.read().await.len()
    }

    /// Total number of rows across all partitions.
    pub async fn row_count(&self) -> usize {
        self.partitions
            .read()
            .await
            .iter()
            .flat_map(|p| p.values())
            .map(BTreeSet::len)
            .sum()
    }
}

impl Default for MemoryBandStore {
    fn default() -> Self {
        Self::new()
    }
}

fn missing_partition(band: usize) -> SimhashError {
    SimhashError::Storage(format!("partition hash{band} does not exist"))
}

#[async_trait]
impl BandStore for MemoryBandStore {
    async fn reset(&self, partitions: usize) -> Result<()> {
        let mut guard = self.partitions.write().await;
        *guard = (0..partitions).map(|_| Partition::new()).collect();
        Ok(())
    }

    async fn ensure_partitions(&self, partitions: usize) -> Result<()> {
        let mut guard = self.partitions.write().await;
        if guard.len() < partitions {
            guard.resize_with(partitions, Partition::new);
        }
        Ok(())
    }

    async fn execute(&self, batch: &[BandStatement]) -> Result<()> {
        let mut guard = self.partitions.write().await;

        // Validate up front so a bad statement leaves the batch unapplied.
        if let Some(stmt) = batch.iter().find(|s| s.row().band >= guard.len()) {
            return Err(missing_partition(stmt.row().band));
        }

        for stmt in batch {
            match stmt {
                BandStatement::Insert(row) => {
                    guard[row.band]
                        .entry(row.band_key.clone())
                        .or_default()
                        .insert(row.fingerprint_hex.clone());
                }
                BandStatement::Delete(row) => {
                    let partition = &mut guard[row.band];
                    if let Some(bucket) = partition.get_mut(&row.band_key) {
                        bucket.remove(&row.fingerprint_hex);
                        if bucket.is_empty() {
                            partition.remove(&row.band_key);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn fetch(&self, band: usize, band_key: &str) -> Result<Vec<String>> {
        let guard = self.partitions.read().await;
        let partition = guard.get(band).ok_or_else(|| missing_partition(band))?;
        Ok(partition
            .get(band_key)
            .map(|bucket| bucket.iter().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert(band: usize, key: &str, hex: &str) -> BandStatement {
        BandStatement::Insert(BandRow::new(band, key, hex))
    }

    fn delete(band: usize, key: &str, hex: &str) -> BandStatement {
        BandStatement::Delete(BandRow::new(band, key, hex))
    }

    #[tokio::test]
    async fn test_insert_is_unique_on_pair() {
        let store = MemoryBandStore::new();
        store.reset(2).await.unwrap();

        store.execute(&[insert(0, "a", "ff"), insert(0, "a", "ff")]).await.unwrap();
        store.execute(&[insert(0, "a", "ee"), insert(1, "a", "ff")]).await.unwrap();

        assert_eq!(store.fetch(0, "a").await.unwrap(), vec!["ee", "ff"]);
        assert_eq!(store.fetch(1, "a").await.unwrap(), vec!["ff"]);
        assert_eq!(store.row_count().await, 3);
    }

    #[tokio::test]
    async fn test_delete_missing_is_noop() {
        let store = MemoryBandStore::new();
        store.reset(1).await.unwrap();

        store.execute(&[delete(0, "a", "ff")]).await.unwrap();
        store.execute(&[insert(0, "a", "ff"), delete(0, "a", "ff")]).await.unwrap();

        assert!(store.fetch(0, "a").await.unwrap().is_empty());
        assert_eq!(store.row_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_partition_rejects_whole_batch() {
        let store = MemoryBandStore::new();
        store.reset(1).await.unwrap();

        let err = store
            .execute(&[insert(0, "a", "ff"), insert(3, "a", "ff")])
            .await
            .unwrap_err();
        assert!(err.is_storage());
        assert_eq!(store.row_count().await, 0);
        assert!(store.fetch(3, "a").await.unwrap_err().is_storage());
    }

    #[tokio::test]
    async fn test_reset_and_ensure() {
        let store = MemoryBandStore::new();
        store.reset(2).await.unwrap();
        store.execute(&[insert(1, "a", "ff")]).await.unwrap();

        store.ensure_partitions(3).await.unwrap();
        assert_eq!(store.partition_count().await, 3);
        assert_eq!(store.row_count().await, 1);

        store.reset(2).await.unwrap();
        assert_eq!(store.partition_count().await, 2);
        assert_eq!(store.row_count().await, 0);
    }

    #[tokio::test]
    async fn test_shared_handle() {
        let store = Arc::new(MemoryBandStore::new());
        let handle = store.clone();
        handle.reset(1).await.unwrap();
        handle.execute(&[insert(0, "k", "1")]).await.unwrap();
        assert_eq!(store.fetch(0, "k").await.unwrap(), vec!["1"]);
    }
}
