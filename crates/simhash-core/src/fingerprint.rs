//! Fixed-width fingerprint value type.

use crate::engine::{Feature, FingerprintEngine};
use crate::{Result, SimhashError, DEFAULT_WIDTH, MAX_WIDTH};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// A simhash fingerprint: an unsigned integer of `width` bits.
///
/// Fingerprints are immutable. Two fingerprints compare equal when their
/// values are equal; widths are expected to agree within one index, and
/// [`Fingerprint::distance`] rejects operands of different widths.
///
/// # Example
/// ```
/// use simhash_core::Fingerprint;
///
/// let a = Fingerprint::from_text("How are you? I AM fine. Thanks. And you?");
/// let b = Fingerprint::from_text("How old are you ? :-) i am fine. Thanks. And you?");
///
/// assert_eq!(a.width(), 64);
/// assert!(a.distance(&b).unwrap() > 0);
/// assert_eq!(a.distance(&a).unwrap(), 0);
/// ```
#[derive(Clone, Copy)]
pub struct Fingerprint {
    value: u128,
    width: usize,
}

/// Bit mask covering the low `width` bits.
#[inline]
pub(crate) fn low_mask(width: usize) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

pub(crate) fn check_width(width: usize) -> Result<()> {
    if width == 0 || width > MAX_WIDTH {
        return Err(SimhashError::InvalidArgument(format!(
            "fingerprint width must be between 1 and {MAX_WIDTH} bits, got {width}"
        )));
    }
    Ok(())
}

fn default_engine() -> &'static FingerprintEngine {
    static ENGINE: OnceLock<FingerprintEngine> = OnceLock::new();
    ENGINE.get_or_init(FingerprintEngine::default)
}

impl Fingerprint {
    /// Wrap a raw value.
    ///
    /// Fails with [`SimhashError::Construction`] if `value` does not fit in `width` bits.
    pub fn from_value(value: u128, width: usize) -> Result<Self> {
        check_width(width)?;
        if value & !low_mask(width) != 0 {
            return Err(SimhashError::Construction(format!(
                "value {value:#x} does not fit in {width} bits"
            )));
        }
        Ok(Self { value, width })
    }

    /// Parse the lowercase hex form produced by [`Fingerprint::to_hex`].
    pub fn from_hex(hex: &str, width: usize) -> Result<Self> {
        if hex.is_empty() || !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(SimhashError::Construction(format!("invalid hex {hex:?}")));
        }
        let value = u128::from_str_radix(hex, 16)
            .map_err(|e| SimhashError::Construction(format!("invalid hex {hex:?}: {e}")))?;
        Self::from_value(value, width)
    }

    /// Fingerprint text with the default 64-bit MD5 engine.
    pub fn from_text(content: &str) -> Self {
        default_engine().build_from_text(content)
    }

    /// Fingerprint a feature collection with the default 64-bit MD5 engine.
    pub fn from_features<I>(features: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Feature,
    {
        default_engine().build_from_features(features)
    }

    /// Built by the engine, which guarantees the value is already masked.
    pub(crate) fn from_parts(value: u128, width: usize) -> Self {
        Self {
            value: value & low_mask(width),
            width,
        }
    }

    #[inline]
    pub fn value(&self) -> u128 {
        self.value
    }

    /// Width in bits (`f`).
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Lowercase hex without prefix or padding; this is the storage form.
    pub fn to_hex(&self) -> String {
        format!("{:x}", self.value)
    }

    /// Number of differing bits between two fingerprints of the same width.
    #[inline]
    pub fn distance(&self, other: &Self) -> Result<u32> {
        if self.width != other.width {
            return Err(SimhashError::WidthMismatch {
                expected: self.width,
                actual: other.width,
            });
        }
        Ok(((self.value ^ other.value) & low_mask(self.width)).count_ones())
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Fingerprint {}

impl Hash for Fingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self {
            value: 0,
            width: DEFAULT_WIDTH,
        }
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint({:#x}, width={})", self.value, self.width)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:x}", self.value)
    }
}

#[derive(Serialize, Deserialize)]
struct HexRepr {
    value: String,
    width: usize,
}

#[derive(Serialize, Deserialize)]
struct RawRepr {
    value: u128,
    width: usize,
}

impl Serialize for Fingerprint {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            HexRepr {
                value: self.to_hex(),
                width: self.width,
            }
            .serialize(serializer)
        } else {
            RawRepr {
                value: self.value,
                width: self.width,
            }
            .serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let repr = HexRepr::deserialize(deserializer)?;
            Self::from_hex(&repr.value, repr.width).map_err(serde::de::Error::custom)
        } else {
            let repr = RawRepr::deserialize(deserializer)?;
            Self::from_value(repr.value, repr.width).map_err(serde::de::Error::custom)
        }
    }
}
