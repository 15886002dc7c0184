//! # costcache
//!
//! Concurrent in-memory cache that evicts the lowest-cost entry when full.
//!
//! ## Architecture
//! - **Cache**: fixed array of buckets, key routed by 64-bit hash (no cross-bucket locking)
//! - **Bucket**: hash index + per-cost FIFO lists + AVL tree of costs, behind one `RwLock`
//! - **Cost function**: caller-supplied per entry, recomputed on every add, get and update
//!
//! ## Example
//!
//! ```
//! use costcache::{cost_fn, Cache, Error};
//!
//! let cache = Cache::new(3, 1)?;
//! let by_size = cost_fn(|e| (e.key().len() + e.value().len()) as i64);
//!
//! cache.add(b"a", b"1", &by_size)?;
//! cache.add(b"bb", b"22", &by_size)?;
//! cache.add(b"ccc", b"333", &by_size)?;
//! cache.add(b"dddd", b"4444", &by_size)?;
//!
//! // "a" had the lowest cost
//! assert_eq!(cache.get(b"a"), Err(Error::NotFound));
//! assert_eq!(cache.get(b"dddd")?.reads(), 1);
//! # Ok::<(), Error>(())
//! ```

#![warn(missing_docs)]

mod bucket;
mod cache;
mod config;
mod entry;
mod error;
mod list;
mod stats;
mod tree;

pub use cache::{key_hasher, Cache};
pub use config::{CacheConfig, DEFAULT_BUCKETS, MAX_BUCKETS, MAX_ENTRIES_PER_BUCKET};
pub use entry::{cost_fn, CostFn, Entry};
pub use error::{Error, Result};
pub use stats::CacheStats;
