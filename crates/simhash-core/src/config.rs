//! Index configuration.

use crate::bands::BandPartitioner;
use crate::{Result, DEFAULT_WIDTH};
use std::env;
use tracing::Dispatch;

/// Default tolerance `k`.
pub const DEFAULT_TOLERANCE: usize = 2;

/// Bucket size above which a lookup logs a warning.
pub const DEFAULT_BUCKET_WARN_THRESHOLD: usize = 200;

/// Configuration for a [`NearDuplicateIndex`](crate::NearDuplicateIndex).
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Fingerprint width `f` in bits.
    pub width: usize,
    /// Maximum Hamming distance `k` treated as a near duplicate.
    pub tolerance: usize,
    /// Drop and recreate the band partitions on initialization.
    pub reset_storage: bool,
    /// Warn when a single band bucket returns more candidates than this.
    pub bucket_warn_threshold: usize,
    /// Log sink for index events. `None` uses the ambient subscriber.
    pub logger: Option<Dispatch>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            tolerance: DEFAULT_TOLERANCE,
            reset_storage: true,
            bucket_warn_threshold: DEFAULT_BUCKET_WARN_THRESHOLD,
            logger: None,
        }
    }
}

impl IndexConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            width: env::var("SIMHASH_WIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.width),
            tolerance: env::var("SIMHASH_TOLERANCE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.tolerance),
            reset_storage: env::var("SIMHASH_RESET")
                .ok()
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.reset_storage),
            bucket_warn_threshold: env::var("SIMHASH_BUCKET_WARN_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.bucket_warn_threshold),
            logger: None,
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_tolerance(mut self, tolerance: usize) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_reset_storage(mut self, reset: bool) -> Self {
        self.reset_storage = reset;
        self
    }

    pub fn with_bucket_warn_threshold(mut self, threshold: usize) -> Self {
        self.bucket_warn_threshold = threshold;
        self
    }

    /// Route index events to `logger` instead of the ambient subscriber.
    pub fn with_logger(mut self, logger: impl Into<Dispatch>) -> Self {
        self.logger = Some(logger.into());
        self
    }

    /// Check the width/tolerance pair and return its band layout.
    pub fn validate(&self) -> Result<BandPartitioner> {
        BandPartitioner::new(self.width, self.tolerance)
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
