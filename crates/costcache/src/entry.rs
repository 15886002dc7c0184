//! Cache entries and cost functions

use std::fmt;
use std::sync::Arc;

/// Caller-supplied cost function.
///
/// Must be a deterministic, side-effect-free function of the entry's key,
/// value, reads and updates. The engine calls it on every add, get and
/// update to detect cost changes. Lower cost is evicted first.
pub type CostFn = Arc<dyn Fn(&Entry) -> i64 + Send + Sync>;

/// Wrap a closure as a [`CostFn`]
pub fn cost_fn<F>(f: F) -> CostFn
where
    F: Fn(&Entry) -> i64 + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Snapshot of a cached key/value pair and its access counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: Vec<u8>,
    value: Vec<u8>,
    reads: u64,
    updates: u64,
}

impl Entry {
    pub(crate) fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            key,
            value,
            reads: 0,
            updates: 0,
        }
    }

    /// Key bytes
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Value bytes
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Number of successful gets
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Number of successful updates
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

/// Resident entry inside a bucket's arena
pub(crate) struct Slot {
    pub(crate) entry: Entry,
    pub(crate) hash: u64,
    pub(crate) cost_fn: CostFn,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

impl Slot {
    pub(crate) fn new(entry: Entry, hash: u64, cost_fn: CostFn) -> Self {
        Self {
            entry,
            hash,
            cost_fn,
            prev: None,
            next: None,
        }
    }

    /// Current cost, derived from the entry's state
    pub(crate) fn cost(&self) -> i64 {
        (self.cost_fn)(&self.entry)
    }

    pub(crate) fn record_read(&mut self) {
        self.entry.reads += 1;
    }

    pub(crate) fn replace_value(&mut self, value: Vec<u8>) {
        self.entry.value = value;
        self.entry.updates += 1;
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("entry", &self.entry)
            .field("hash", &self.hash)
            .field("prev", &self.prev)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}
