//! Bucket: one independently locked shard of the cache
//!
//! A bucket keeps three structures consistent under its lock:
//! - **entries**: key hash -> arena handle (one entry per hash slot)
//! - **cost_lists**: cost -> FIFO of entries currently at that cost
//! - **tree**: the set of costs that have a non-empty list
//!
//! Costs are never stored. They are recomputed from the entry through its
//! cost function whenever an entry is filed, moved or removed.

use std::collections::HashMap;

use ahash::RandomState;
use parking_lot::RwLock;
use tracing::trace;

use crate::entry::{CostFn, Entry, Slot};
use crate::error::{Error, Result};
use crate::list::{Arena, CostList};
use crate::stats::{BucketStats, CacheStats};
use crate::tree::CostTree;

/// Structures owned by an initialized bucket
#[derive(Debug)]
struct BucketState {
    entries: HashMap<u64, usize, RandomState>,
    arena: Arena,
    cost_lists: HashMap<i64, CostList, RandomState>,
    tree: CostTree,
    max_entries: usize,
}

impl BucketState {
    fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::with_capacity_and_hasher(max_entries, RandomState::new()),
            arena: Arena::with_capacity(max_entries),
            cost_lists: HashMap::with_hasher(RandomState::new()),
            tree: CostTree::new(),
            max_entries,
        }
    }

    fn cost_of(&self, idx: usize) -> Option<i64> {
        self.arena.get(idx).map(Slot::cost)
    }

    /// Append `idx` to the list for `cost`, creating list and tree node if needed
    fn file(&mut self, idx: usize, cost: i64) {
        let list = self.cost_lists.entry(cost).or_insert_with(CostList::new);
        if list.is_empty() {
            self.tree.insert(cost);
        }
        list.push_back(&mut self.arena, idx);
    }

    /// Unlink `idx` from the list for `cost`, dropping the list and tree node if emptied
    fn unfile(&mut self, idx: usize, cost: i64) {
        let Some(list) = self.cost_lists.get_mut(&cost) else {
            return;
        };
        list.remove(&mut self.arena, idx);
        if list.is_empty() {
            self.cost_lists.remove(&cost);
            self.tree.remove(cost);
        }
    }

    /// Move `idx` to the list matching its current cost if that changed
    fn refile(&mut self, idx: usize, old_cost: i64) {
        let Some(new_cost) = self.cost_of(idx) else {
            return;
        };
        if new_cost != old_cost {
            self.unfile(idx, old_cost);
            self.file(idx, new_cost);
        }
    }

    /// Remove the occupant of a hash slot from every structure
    fn remove_slot(&mut self, hash: u64) -> Option<Slot> {
        let idx = self.entries.remove(&hash)?;
        if let Some(cost) = self.cost_of(idx) {
            self.unfile(idx, cost);
        }
        self.arena.free(idx)
    }

    /// Evict the oldest entry among those with the minimum cost
    fn evict_min(&mut self) -> Option<Slot> {
        let min_cost = self.tree.min()?;
        let head = self.cost_lists.get(&min_cost)?.head()?;
        let hash = self.arena.get(head)?.hash;
        self.remove_slot(hash)
    }

    fn insert(&mut self, slot: Slot) {
        let hash = slot.hash;
        let cost = slot.cost();
        let idx = self.arena.alloc(slot);
        self.entries.insert(hash, idx);
        self.file(idx, cost);
    }

    /// Handle for `key` at `hash`, or whether the slot holds another key
    fn lookup(&self, key: &[u8], hash: u64) -> Lookup {
        match self.entries.get(&hash) {
            None => Lookup::Vacant,
            Some(&idx) => match self.arena.get(idx) {
                Some(slot) if slot.entry.key() == key => Lookup::Hit(idx),
                Some(_) => Lookup::Collision,
                None => Lookup::Vacant,
            },
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.arena.clear();
        self.cost_lists.clear();
        self.tree.clear();
    }

    fn check_invariants(&self) -> std::result::Result<(), String> {
        self.tree.check_invariants()?;

        let mut filed = 0;
        for (&cost, list) in &self.cost_lists {
            if list.is_empty() {
                return Err(format!("empty list kept for cost {}", cost));
            }
            if !self.tree.contains(cost) {
                return Err(format!("cost {} has a list but no tree node", cost));
            }
            let mut count = 0;
            for idx in list.iter(&self.arena) {
                let slot = self
                    .arena
                    .get(idx)
                    .ok_or_else(|| format!("list {} links a freed handle {}", cost, idx))?;
                if slot.cost() != cost {
                    return Err(format!(
                        "entry filed under cost {} has cost {}",
                        cost,
                        slot.cost()
                    ));
                }
                if self.entries.get(&slot.hash) != Some(&idx) {
                    return Err(format!("handle {} is not indexed by its hash", idx));
                }
                count += 1;
            }
            if count != list.len() {
                return Err(format!(
                    "list {} has {} nodes, size says {}",
                    cost,
                    count,
                    list.len()
                ));
            }
            filed += count;
        }

        if filed != self.entries.len() {
            return Err(format!(
                "{} entries indexed, {} filed in cost lists",
                self.entries.len(),
                filed
            ));
        }
        if self.tree.len() != self.cost_lists.len() {
            return Err(format!(
                "{} tree costs, {} cost lists",
                self.tree.len(),
                self.cost_lists.len()
            ));
        }
        Ok(())
    }
}

enum Lookup {
    Hit(usize),
    Collision,
    Vacant,
}

/// One shard of the cache. All operations, including `get`, take the write lock.
#[derive(Debug, Default)]
pub(crate) struct Bucket {
    state: RwLock<Option<BucketState>>,
    stats: BucketStats,
}

impl Bucket {
    /// An initialized, empty bucket holding up to `max_entries`
    pub(crate) fn with_capacity(max_entries: usize) -> Self {
        Self {
            state: RwLock::new(Some(BucketState::new(max_entries))),
            stats: BucketStats::default(),
        }
    }

    /// Insert `key`, replacing whatever occupies its hash slot.
    ///
    /// Never fails once initialized: at capacity the minimum-cost entry is
    /// evicted first.
    pub(crate) fn add(&self, key: &[u8], value: &[u8], hash: u64, cost_fn: &CostFn) -> Result<()> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(Error::NotInitialized)?;

        if let Some(old) = state.remove_slot(hash) {
            if old.entry.key() != key {
                self.stats.record_collision();
                trace!(hash, "hash collision, replacing resident key");
            }
        }

        if state.entries.len() >= state.max_entries {
            if let Some(victim) = state.evict_min() {
                self.stats.record_eviction();
                trace!(
                    hash = victim.hash,
                    cost = victim.cost(),
                    "evicted minimum-cost entry"
                );
            }
        }

        let entry = Entry::new(key.to_vec(), value.to_vec());
        state.insert(Slot::new(entry, hash, cost_fn.clone()));
        self.stats.record_insert();

        Ok(())
    }

    /// Record a read of `key` and return a snapshot of it
    pub(crate) fn get(&self, key: &[u8], hash: u64) -> Result<Entry> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(Error::NotInitialized)?;

        let idx = match state.lookup(key, hash) {
            Lookup::Hit(idx) => idx,
            Lookup::Collision => {
                self.stats.record_collision();
                self.stats.record_miss();
                return Err(Error::NotFound);
            }
            Lookup::Vacant => {
                self.stats.record_miss();
                return Err(Error::NotFound);
            }
        };

        let slot = state.arena.get_mut(idx).ok_or(Error::NotFound)?;
        let old_cost = slot.cost();
        slot.record_read();
        let entry = slot.entry.clone();
        state.refile(idx, old_cost);
        self.stats.record_hit();

        Ok(entry)
    }

    /// Replace the value of `key`
    pub(crate) fn update(&self, key: &[u8], value: &[u8], hash: u64) -> Result<()> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(Error::NotInitialized)?;

        let idx = self.expect_hit(state, key, hash)?;
        let slot = state.arena.get_mut(idx).ok_or(Error::NotFound)?;
        let old_cost = slot.cost();
        slot.replace_value(value.to_vec());
        state.refile(idx, old_cost);

        Ok(())
    }

    /// Remove `key`
    pub(crate) fn evict(&self, key: &[u8], hash: u64) -> Result<()> {
        let mut guard = self.state.write();
        let state = guard.as_mut().ok_or(Error::NotInitialized)?;

        self.expect_hit(state, key, hash)?;
        state.remove_slot(hash);
        self.stats.record_eviction();

        Ok(())
    }

    fn expect_hit(&self, state: &BucketState, key: &[u8], hash: u64) -> Result<usize> {
        match state.lookup(key, hash) {
            Lookup::Hit(idx) => Ok(idx),
            Lookup::Collision => {
                self.stats.record_collision();
                Err(Error::NotFound)
            }
            Lookup::Vacant => Err(Error::NotFound),
        }
    }

    /// Drop every entry and reset counters. Capacity is unchanged.
    pub(crate) fn clear(&self) {
        let mut guard = self.state.write();
        if let Some(state) = guard.as_mut() {
            state.clear();
        }
        self.stats.reset();
    }

    /// Resident entries, read under the shared lock
    pub(crate) fn len(&self) -> usize {
        self.state.read().as_ref().map_or(0, |state| state.entries.len())
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.state.read().as_ref().map_or(0, |state| state.max_entries)
    }

    pub(crate) fn collisions(&self) -> u64 {
        self.stats.collisions()
    }

    pub(crate) fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Cost the next capacity eviction would target
    pub(crate) fn min_cost(&self) -> Option<i64> {
        self.state.read().as_ref().and_then(|state| state.tree.min())
    }

    pub(crate) fn check_invariants(&self) -> std::result::Result<(), String> {
        match self.state.read().as_ref() {
            Some(state) => state.check_invariants(),
            None => Ok(()),
        }
    }
}
