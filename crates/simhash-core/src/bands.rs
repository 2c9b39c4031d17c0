//! Splitting fingerprints into `k + 1` contiguous bands.
//!
//! If two fingerprints differ in at most `k` bits, those bits can touch at
//! most `k` of the `k + 1` disjoint bands, so at least one band is identical.
//! Exact lookups on band keys therefore find every near duplicate.

use crate::fingerprint::{check_width, low_mask, Fingerprint};
use crate::{Result, SimhashError};
use std::ops::Range;

/// Fixed band layout for a given width `f` and tolerance `k`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandPartitioner {
    width: usize,
    tolerance: usize,
    offsets: Vec<usize>,
}

impl BandPartitioner {
    pub fn new(width: usize, tolerance: usize) -> Result<Self> {
        check_width(width)?;
        if tolerance > width {
            return Err(SimhashError::InvalidArgument(format!(
                "tolerance {tolerance} exceeds fingerprint width {width}"
            )));
        }
        Ok(Self {
            width,
            tolerance,
            offsets: Self::offsets(width, tolerance),
        })
    }

    /// Start bit of each band: `floor(f / (k + 1)) * i` for `i` in `0..=k`.
    ///
    /// Bands share the floor width; the last band also takes the remainder.
    pub fn offsets(width: usize, tolerance: usize) -> Vec<usize> {
        let step = width / (tolerance + 1);
        (0..=tolerance).map(|i| step * i).collect()
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn tolerance(&self) -> usize {
        self.tolerance
    }

    /// Number of bands (`k + 1`).
    #[inline]
    pub fn band_count(&self) -> usize {
        self.offsets.len()
    }

    /// Bit range covered by each band, in band order.
    pub fn ranges(&self) -> Vec<Range<usize>> {
        self.offsets
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = self.offsets.get(i + 1).copied().unwrap_or(self.width);
                start..end
            })
            .collect()
    }

    /// Hex key of every band of `fingerprint`, in band order.
    pub fn band_keys(&self, fingerprint: &Fingerprint) -> Result<Vec<String>> {
        if fingerprint.width() != self.width {
            return Err(SimhashError::WidthMismatch {
                expected: self.width,
                actual: fingerprint.width(),
            });
        }

        Ok(self
            .ranges()
            .into_iter()
            .map(|band| {
                let bits = fingerprint.value().checked_shr(band.start as u32).unwrap_or(0);
                format!("{:x}", bits & low_mask(band.len()))
            })
            .collect())
    }
}
