//! Cache configuration and validation

use crate::error::{Error, Result};

/// Bucket count used when 0 is requested
pub const DEFAULT_BUCKETS: usize = 512;

/// Upper bound on the bucket count
pub const MAX_BUCKETS: usize = 1024;

/// Default ceiling on entries per bucket
pub const MAX_ENTRIES_PER_BUCKET: usize = 2000;

/// Sizing parameters for a [`Cache`](crate::Cache)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    capacity: usize,
    bucket_count: usize,
    bucket_ceiling: usize,
}

impl CacheConfig {
    /// Create a config for `capacity` entries over `bucket_count` buckets.
    ///
    /// A `bucket_count` of 0 selects [`DEFAULT_BUCKETS`].
    pub fn new(capacity: usize, bucket_count: usize) -> Self {
        Self {
            capacity,
            bucket_count,
            bucket_ceiling: MAX_ENTRIES_PER_BUCKET,
        }
    }

    /// Override the per-bucket entry ceiling
    pub fn with_bucket_ceiling(mut self, ceiling: usize) -> Self {
        self.bucket_ceiling = ceiling;
        self
    }

    /// Requested total capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bucket count after resolving 0 to the default
    pub fn bucket_count(&self) -> usize {
        if self.bucket_count == 0 {
            DEFAULT_BUCKETS
        } else {
            self.bucket_count
        }
    }

    /// Per-bucket entry ceiling
    pub fn bucket_ceiling(&self) -> usize {
        self.bucket_ceiling
    }

    /// Entries each bucket may hold: `min(ceiling, ceil(capacity / buckets))`
    pub fn bucket_capacity(&self) -> usize {
        self.capacity
            .div_ceil(self.bucket_count())
            .min(self.bucket_ceiling)
    }

    /// Check the parameters, naming the first one out of range
    pub fn validate(&self) -> Result<()> {
        if self.bucket_count > MAX_BUCKETS {
            return Err(Error::Config(format!(
                "bucket count {} exceeds maximum of {}",
                self.bucket_count, MAX_BUCKETS
            )));
        }

        if self.bucket_ceiling == 0 {
            return Err(Error::Config(
                "bucket ceiling must be greater than 0".to_string(),
            ));
        }

        let limit = self.bucket_count().saturating_mul(self.bucket_ceiling);
        if self.capacity > limit {
            return Err(Error::Config(format!(
                "capacity {} exceeds {} buckets x {} entries",
                self.capacity,
                self.bucket_count(),
                self.bucket_ceiling
            )));
        }

        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKETS * MAX_ENTRIES_PER_BUCKET, 0)
    }
}
