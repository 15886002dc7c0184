//! Cache: routes keys to independently locked buckets

use std::fmt;
use std::hash::BuildHasher;

use ahash::RandomState;
use tracing::debug;

use crate::bucket::Bucket;
use crate::config::CacheConfig;
use crate::entry::{CostFn, Entry};
use crate::error::{Error, Result};
use crate::stats::CacheStats;

/// Fixed seeds, so a key routes to the same bucket in every process.
const KEY_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// Default hasher for routing keys to buckets
pub fn key_hasher() -> RandomState {
    RandomState::with_seeds(KEY_SEEDS[0], KEY_SEEDS[1], KEY_SEEDS[2], KEY_SEEDS[3])
}

/// Concurrent cost-based eviction cache.
///
/// Keys are hashed to 64 bits and routed to bucket `hash % bucket_count`.
/// Each bucket has its own lock and capacity, and there is no cross-bucket
/// coordination: a skewed key distribution can evict from one bucket while
/// others still have room.
///
/// A `Cache::default()` is uninitialized and answers every keyed operation
/// with [`Error::NotInitialized`] until [`Cache::init`] is called.
pub struct Cache<S = RandomState> {
    buckets: Box<[Bucket]>,
    hasher: S,
    config: Option<CacheConfig>,
}

impl Cache {
    /// Create a cache holding about `capacity` entries over `bucket_count`
    /// buckets (0 for the default of 512).
    ///
    /// # Returns
    /// * `Err(Error::Config)` if `bucket_count > 1024` or `capacity` exceeds
    ///   `bucket_count * 2000`
    pub fn new(capacity: usize, bucket_count: usize) -> Result<Self> {
        Self::with_config(CacheConfig::new(capacity, bucket_count))
    }

    /// Create a cache from a [`CacheConfig`]
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, key_hasher())
    }
}

impl Default for Cache {
    fn default() -> Self {
        Self::uninit_with_hasher(key_hasher())
    }
}

impl<S: BuildHasher> Cache<S> {
    /// Create a cache that routes keys with a custom hasher
    pub fn with_config_and_hasher(config: CacheConfig, hasher: S) -> Result<Self> {
        let mut cache = Self::uninit_with_hasher(hasher);
        cache.init_with(config)?;
        Ok(cache)
    }

    /// An uninitialized cache using `hasher`
    pub fn uninit_with_hasher(hasher: S) -> Self {
        Self {
            buckets: Box::default(),
            hasher,
            config: None,
        }
    }

    /// (Re)initialize with `capacity` entries over `bucket_count` buckets.
    ///
    /// Existing contents and counters are discarded.
    pub fn init(&mut self, capacity: usize, bucket_count: usize) -> Result<()> {
        self.init_with(CacheConfig::new(capacity, bucket_count))
    }

    /// (Re)initialize from a [`CacheConfig`]
    pub fn init_with(&mut self, config: CacheConfig) -> Result<()> {
        config.validate()?;

        let per_bucket = config.bucket_capacity();
        self.buckets = (0..config.bucket_count())
            .map(|_| Bucket::with_capacity(per_bucket))
            .collect();
        self.config = Some(config);

        debug!(
            capacity = config.capacity(),
            buckets = config.bucket_count(),
            per_bucket,
            "cache initialized"
        );
        Ok(())
    }

    fn route(&self, key: &[u8]) -> Result<(&Bucket, u64)> {
        if self.buckets.is_empty() {
            return Err(Error::NotInitialized);
        }
        let hash = self.hasher.hash_one(key);
        let idx = (hash % self.buckets.len() as u64) as usize;
        Ok((&self.buckets[idx], hash))
    }

    /// Insert `key` with its cost function, evicting the bucket's
    /// minimum-cost entry if the bucket is full.
    ///
    /// A different key already occupying the same hash slot is replaced and
    /// counted as a collision.
    pub fn add(&self, key: &[u8], value: &[u8], cost_fn: &CostFn) -> Result<()> {
        let (bucket, hash) = self.route(key)?;
        bucket.add(key, value, hash, cost_fn)
    }

    /// Read `key`, incrementing its read counter
    ///
    /// # Returns
    /// * `Result<Entry>` - snapshot taken after the read was recorded
    pub fn get(&self, key: &[u8]) -> Result<Entry> {
        let (bucket, hash) = self.route(key)?;
        bucket.get(key, hash)
    }

    /// Replace the value of `key`, incrementing its update counter
    pub fn update(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let (bucket, hash) = self.route(key)?;
        bucket.update(key, value, hash)
    }

    /// Remove `key`
    pub fn evict(&self, key: &[u8]) -> Result<()> {
        let (bucket, hash) = self.route(key)?;
        bucket.evict(key, hash)
    }

    /// Remove all entries and reset counters in every bucket
    pub fn clear(&self) {
        for bucket in self.buckets.iter() {
            bucket.clear();
        }
        debug!(buckets = self.buckets.len(), "cache cleared");
    }

    /// Total resident entries. Each bucket is read under its shared lock;
    /// the sum is not atomic across buckets.
    pub fn entries_count(&self) -> u64 {
        self.buckets.iter().map(|b| b.len() as u64).sum()
    }

    /// Total hash-slot collisions observed since init or the last clear
    pub fn collisions_count(&self) -> u64 {
        self.buckets.iter().map(Bucket::collisions).sum()
    }

    /// Hit, miss, insert, eviction and collision totals
    pub fn stats(&self) -> CacheStats {
        let mut total = CacheStats::default();
        for bucket in self.buckets.iter() {
            total += bucket.stats();
        }
        total
    }

    /// Minimum cost in the bucket `key` routes to, i.e. the cost the next
    /// capacity eviction there would target
    pub fn min_cost(&self, key: &[u8]) -> Result<Option<i64>> {
        let (bucket, _) = self.route(key)?;
        Ok(bucket.min_cost())
    }

    /// Whether `init` has succeeded
    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    /// Number of buckets (0 when uninitialized)
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Entries each bucket may hold
    pub fn bucket_capacity(&self) -> usize {
        self.config.map_or(0, |config| config.bucket_capacity())
    }

    /// Requested total capacity
    pub fn capacity(&self) -> usize {
        self.config.map_or(0, |config| config.capacity())
    }

    /// Verify that every bucket's hash index, cost lists and cost tree agree.
    ///
    /// Intended for tests and debugging. Takes each bucket's shared lock in turn.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for (idx, bucket) in self.buckets.iter().enumerate() {
            bucket
                .check_invariants()
                .map_err(|msg| format!("bucket {}: {}", idx, msg))?;
        }
        Ok(())
    }
}

impl<S> fmt::Debug for Cache<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("buckets", &self.buckets.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
