//! # simhash-core
//!
//! Simhash fingerprints and a banded near-duplicate index.
//!
//! Features:
//! - Weighted bit-voting fingerprints of up to 128 bits over a pluggable hash (MD5 by default)
//! - Text shingling into 4-character windows
//! - `k + 1` band partitioning so that every fingerprint within distance `k`
//!   shares at least one exact band key with the query
//! - An async storage seam ([`BandStore`]) with an in-memory backend

pub mod bands;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod index;
pub mod storage;

pub use bands::BandPartitioner;
pub use config::IndexConfig;
pub use engine::{Feature, FeatureHasher, FingerprintEngine, Md5Hasher, Weight};
pub use error::*;
pub use fingerprint::Fingerprint;
pub use index::NearDuplicateIndex;
pub use storage::{BandRow, BandStatement, BandStore, MemoryBandStore};

/// Default fingerprint width in bits.
pub const DEFAULT_WIDTH: usize = 64;

/// Widest supported fingerprint; values are held in a `u128`.
pub const MAX_WIDTH: usize = 128;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(DEFAULT_WIDTH, 64);
        assert_eq!(MAX_WIDTH, u128::BITS as usize);
    }
}
