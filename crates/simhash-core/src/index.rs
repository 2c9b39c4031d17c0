//! Banded near-duplicate index.
//!
//! Every fingerprint is written once per band, keyed by that band's bits.
//! A query fetches the bucket of each of its own band keys, then keeps only
//! candidates whose exact distance is within the tolerance.

use crate::bands::BandPartitioner;
use crate::config::IndexConfig;
use crate::fingerprint::Fingerprint;
use crate::storage::{BandRow, BandStatement, BandStore};
use crate::{Result, SimhashError};
use std::collections::BTreeSet;
use std::future::Future;
use tracing::instrument::WithSubscriber;
use tracing::{debug, info, warn, Dispatch};

/// Bulk loads report progress every this many items.
pub const PROGRESS_INTERVAL: usize = 10_000;

async fn with_logger<F: Future>(logger: Option<&Dispatch>, fut: F) -> F::Output {
    match logger {
        Some(dispatch) => fut.with_subscriber(dispatch.clone()).await,
        None => fut.await,
    }
}

/// Finds every stored fingerprint within distance `k` of a query.
///
/// The index owns its storage handle for its whole lifetime. The only ways
/// to obtain one are [`NearDuplicateIndex::initialize`] and
/// [`NearDuplicateIndex::open`], so every index value is ready for use.
///
/// # Example
/// ```
/// # tokio_test_block(async {
/// use simhash_core::{Fingerprint, IndexConfig, MemoryBandStore, NearDuplicateIndex};
///
/// let docs = [
///     Fingerprint::from_text("How are you? I Am fine. blar blar blar blar blar Thanks."),
///     Fingerprint::from_text("This is simhash test."),
/// ];
/// let config = IndexConfig::default().with_tolerance(10);
/// let index = NearDuplicateIndex::initialize(MemoryBandStore::new(), &docs, config).await?;
///
/// let query = Fingerprint::from_text("How are you i am fine. blar blar blar blar blar than");
/// let dups = index.get_near_duplicates(&query).await?;
/// assert!(dups.contains(&docs[0].value()));
/// # Ok::<(), simhash_core::SimhashError>(())
/// # }).unwrap();
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct NearDuplicateIndex<S> {
    store: S,
    bands: BandPartitioner,
    config: IndexConfig,
}

impl<S: BandStore> NearDuplicateIndex<S> {
    /// Prepare the partitions and load `fingerprints` one by one.
    ///
    /// With `config.reset_storage` the partitions are dropped and recreated,
    /// otherwise missing ones are created and existing rows kept. The load is
    /// not transactional: on error, the items added so far stay committed.
    pub async fn initialize(store: S, fingerprints: &[Fingerprint], config: IndexConfig) -> Result<Self> {
        let index = Self::prepare(store, config).await?;
        index.load(fingerprints).await?;
        Ok(index)
    }

    /// Open an index over the existing partitions without loading anything.
    pub async fn open(store: S, config: IndexConfig) -> Result<Self> {
        Self::prepare(store, config.with_reset_storage(false)).await
    }

    async fn prepare(store: S, config: IndexConfig) -> Result<Self> {
        let bands = config.validate()?;
        let partitions = bands.band_count();

        with_logger(config.logger.as_ref(), async {
            if config.reset_storage {
                info!(partitions, "Resetting band partitions");
                store.reset(partitions).await
            } else {
                store.ensure_partitions(partitions).await
            }
        })
        .await?;

        Ok(Self {
            store,
            bands,
            config,
        })
    }

    /// Add every fingerprint in order, logging progress.
    pub async fn load(&self, fingerprints: &[Fingerprint]) -> Result<()> {
        with_logger(self.config.logger.as_ref(), async {
            let count = fingerprints.len();
            info!(count, "Initializing {} data.", count);

            for (i, fingerprint) in fingerprints.iter().enumerate() {
                if i % PROGRESS_INTERVAL == 0 || i + 1 == count {
                    info!("{}/{}", i + 1, count);
                }
                self.insert(fingerprint).await?;
            }
            Ok::<(), SimhashError>(())
        })
        .await
    }

    /// Store `fingerprint` under all of its band keys. Adding twice is a no-op.
    pub async fn add(&self, fingerprint: &Fingerprint) -> Result<()> {
        with_logger(self.config.logger.as_ref(), self.insert(fingerprint)).await
    }

    /// Remove `fingerprint` from all bands. Removing an absent one is a no-op.
    pub async fn delete(&self, fingerprint: &Fingerprint) -> Result<()> {
        with_logger(self.config.logger.as_ref(), async {
            let batch = self.batch(fingerprint, BandStatement::Delete)?;
            self.store.execute(&batch).await
        })
        .await
    }

    /// Values of every stored fingerprint within the tolerance of `query`.
    pub async fn get_near_duplicates(&self, query: &Fingerprint) -> Result<BTreeSet<u128>> {
        with_logger(self.config.logger.as_ref(), self.near_duplicates(query)).await
    }

    async fn insert(&self, fingerprint: &Fingerprint) -> Result<()> {
        let batch = self.batch(fingerprint, BandStatement::Insert)?;
        self.store.execute(&batch).await
    }

    fn batch(&self, fingerprint: &Fingerprint, op: fn(BandRow) -> BandStatement) -> Result<Vec<BandStatement>> {
        let hex = fingerprint.to_hex();
        Ok(self
            .bands
            .band_keys(fingerprint)?
            .into_iter()
            .enumerate()
            .map(|(band, key)| op(BandRow::new(band, key, hex.clone())))
            .collect())
    }

    async fn near_duplicates(&self, query: &Fingerprint) -> Result<BTreeSet<u128>> {
        let keys = self.bands.band_keys(query)?;
        let tolerance = self.bands.tolerance();
        let mut found = BTreeSet::new();

        for (band, key) in keys.iter().enumerate() {
            let candidates = self.store.fetch(band, key).await?;
            debug!(band, key = %key, candidates = candidates.len(), "band lookup");

            if candidates.len() > self.config.bucket_warn_threshold {
                warn!(band, "Big bucket found. key:{}, len:{}", key, candidates.len());
            }

            for hex in &candidates {
                let candidate = Fingerprint::from_hex(hex, self.width()).map_err(|e| {
                    SimhashError::Storage(format!("corrupt row in partition hash{band}: {e}"))
                })?;
                if query.distance(&candidate)? as usize <= tolerance {
                    found.insert(candidate.value());
                }
            }
        }

        Ok(found)
    }

    /// Fingerprint width `f`.
    #[inline]
    pub fn width(&self) -> usize {
        self.bands.width()
    }

    /// Tolerance `k`.
    #[inline]
    pub fn tolerance(&self) -> usize {
        self.bands.tolerance()
    }

    pub fn bands(&self) -> &BandPartitioner {
        &self.bands
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Release the index and hand back its storage handle.
    pub fn into_store(self) -> S {
        self.store
    }
}

impl<S> std::fmt::Debug for NearDuplicateIndex<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NearDuplicateIndex")
            .field("width", &self.bands.width())
            .field("tolerance", &self.bands.tolerance())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
