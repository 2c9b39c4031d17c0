//! Fingerprint construction by weighted bit voting.
//!
//! Every feature is hashed and votes on each of the `f` output bits with its
//! weight: `+w` where the hash bit is set, `-w` where it is clear. An output
//! bit is set only when its total is strictly positive, so ties (including
//! an empty feature set) resolve to 0.

use crate::fingerprint::{check_width, Fingerprint};
use crate::{Result, SimhashError, DEFAULT_WIDTH};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Letters, numbers and underscore plus the CJK unified ideographs block.
///
/// Spelled out rather than `\w`: combining marks and joiners are dropped,
/// numeric symbols such as `²` are kept.
pub const DEFAULT_TOKEN_PATTERN: &str = r"[\p{L}\p{N}_\x{4e00}-\x{9fcc}]+";

/// Width of the character shingles produced from text.
pub const SHINGLE_WIDTH: usize = 4;

/// Maps a feature's UTF-8 bytes to an unsigned integer.
///
/// Implementations must provide at least `f` bits of entropy; only the low
/// `f` bits of the result are read.
pub trait FeatureHasher: Send + Sync {
    fn hash(&self, bytes: &[u8]) -> u128;
}

impl<F> FeatureHasher for F
where
    F: Fn(&[u8]) -> u128 + Send + Sync,
{
    fn hash(&self, bytes: &[u8]) -> u128 {
        self(bytes)
    }
}

/// MD5 digest read as a big-endian 128-bit integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Hasher;

impl FeatureHasher for Md5Hasher {
    #[inline]
    fn hash(&self, bytes: &[u8]) -> u128 {
        u128::from_be_bytes(md5::compute(bytes).0)
    }
}

/// A numeric feature weight.
pub trait Weight {
    fn to_f64(&self) -> f64;
}

macro_rules! impl_weight {
    ($($t:ty),*) => {
        $(
            impl Weight for $t {
                #[inline]
                fn to_f64(&self) -> f64 {
                    *self as f64
                }
            }
        )*
    };
}

impl_weight!(f64, f32, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<W: Weight + ?Sized> Weight for &W {
    #[inline]
    fn to_f64(&self) -> f64 {
        (**self).to_f64()
    }
}

/// Anything that can vote: a token and its weight.
///
/// Implemented for bare tokens (weight 1), `(token, weight)` pairs, and the
/// `(&token, &weight)` items yielded when iterating a map.
pub trait Feature {
    fn token(&self) -> &str;

    fn weight(&self) -> f64 {
        1.0
    }
}

impl Feature for &str {
    fn token(&self) -> &str {
        self
    }
}

impl Feature for String {
    fn token(&self) -> &str {
        self.as_str()
    }
}

impl Feature for &String {
    fn token(&self) -> &str {
        self.as_str()
    }
}

impl<T, W> Feature for (T, W)
where
    T: AsRef<str>,
    W: Weight,
{
    fn token(&self) -> &str {
        self.0.as_ref()
    }

    fn weight(&self) -> f64 {
        self.1.to_f64()
    }
}

/// Builds fingerprints of a fixed width.
#[derive(Clone)]
pub struct FingerprintEngine {
    width: usize,
    pattern: Regex,
    hasher: Arc<dyn FeatureHasher>,
}

impl FingerprintEngine {
    /// Create an engine producing `width`-bit fingerprints with the default
    /// token pattern and [`Md5Hasher`].
    pub fn new(width: usize) -> Result<Self> {
        check_width(width)?;
        Ok(Self {
            width,
            ..Self::default()
        })
    }

    /// Replace the pattern used to pick meaningful characters out of text.
    pub fn with_token_pattern(mut self, pattern: &str) -> Result<Self> {
        self.pattern = Regex::new(pattern)
            .map_err(|e| SimhashError::Construction(format!("invalid token pattern: {e}")))?;
        Ok(self)
    }

    /// Replace the feature hash function.
    pub fn with_hasher<H>(mut self, hasher: H) -> Self
    where
        H: FeatureHasher + 'static,
    {
        self.hasher = Arc::new(hasher);
        self
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Split text into overlapping character shingles.
    ///
    /// The text is lowercased, reduced to the characters matched by the token
    /// pattern, and cut into windows of [`SHINGLE_WIDTH`] characters with stride 1.
    /// Anything shorter than one window (including the empty string) becomes a
    /// single shingle, so there is always at least one feature.
    pub fn tokenize(&self, content: &str) -> Vec<String> {
        let lowered = content.to_lowercase();
        let kept: Vec<char> = self
            .pattern
            .find_iter(&lowered)
            .flat_map(|m| m.as_str().chars())
            .collect();

        if kept.len() < SHINGLE_WIDTH {
            return vec![kept.into_iter().collect()];
        }
        kept.windows(SHINGLE_WIDTH)
            .map(|w| w.iter().collect())
            .collect()
    }

    /// Fingerprint text; each distinct shingle is weighted by its occurrence count.
    pub fn build_from_text(&self, content: &str) -> Fingerprint {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        for shingle in self.tokenize(content) {
            *counts.entry(shingle).or_insert(0) += 1;
        }

        let mut acc = vec![0f64; self.width];
        for (token, count) in &counts {
            self.vote(&mut acc, token, f64::from(*count));
        }
        self.resolve(&acc)
    }

    /// Fingerprint a collection of weighted features.
    ///
    /// Fails with [`SimhashError::InvalidArgument`] on a non-finite weight.
    pub fn build_from_features<I>(&self, features: I) -> Result<Fingerprint>
    where
        I: IntoIterator,
        I::Item: Feature,
    {
        let mut acc = vec![0f64; self.width];
        for feature in features {
            let weight = feature.weight();
            if !weight.is_finite() {
                return Err(SimhashError::InvalidArgument(format!(
                    "feature {:?} has non-finite weight {weight}",
                    feature.token()
                )));
            }
            self.vote(&mut acc, feature.token(), weight);
        }
        Ok(self.resolve(&acc))
    }

    fn vote(&self, acc: &mut [f64], token: &str, weight: f64) {
        let h = self.hasher.hash(token.as_bytes());
        for (i, slot) in acc.iter_mut().enumerate() {
            if (h >> i) & 1 == 1 {
                *slot += weight;
            } else {
                *slot -= weight;
            }
        }
    }

    fn resolve(&self, acc: &[f64]) -> Fingerprint {
        let value = acc
            .iter()
            .enumerate()
            .filter(|(_, total)| **total > 0.0)
            .fold(0u128, |bits, (i, _)| bits | (1u128 << i));
        Fingerprint::from_parts(value, self.width)
    }
}

impl Default for FingerprintEngine {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            pattern: Regex::new(DEFAULT_TOKEN_PATTERN).expect("default token pattern is valid"),
            hasher: Arc::new(Md5Hasher),
        }
    }
}

impl std::fmt::Debug for FingerprintEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintEngine")
            .field("width", &self.width)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}
