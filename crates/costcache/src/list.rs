//! Entry arena and per-cost FIFO lists
//!
//! Entries live in a slab indexed by handle. Each entry carries its own
//! `prev`/`next` handles, so a [`CostList`] only stores head, tail and size
//! and can unlink any entry in O(1) without searching.

use crate::entry::Slot;

/// Slab of resident entries with a free list for handle reuse
#[derive(Debug, Default)]
pub(crate) struct Arena {
    slots: Vec<Option<Slot>>,
    free_list: Vec<usize>,
}

impl Arena {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
        }
    }

    /// Store a slot and return its handle
    pub(crate) fn alloc(&mut self, slot: Slot) -> usize {
        if let Some(idx) = self.free_list.pop() {
            self.slots[idx] = Some(slot);
            idx
        } else {
            self.slots.push(Some(slot));
            self.slots.len() - 1
        }
    }

    /// Release a handle, returning its slot
    pub(crate) fn free(&mut self, idx: usize) -> Option<Slot> {
        let slot = self.slots.get_mut(idx)?.take()?;
        self.free_list.push(idx);
        Some(slot)
    }

    pub(crate) fn get(&self, idx: usize) -> Option<&Slot> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut Slot> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
    }
}

/// Doubly-linked FIFO of entries sharing one cost value
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CostList {
    head: Option<usize>,
    tail: Option<usize>,
    size: usize,
}

impl CostList {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Oldest entry in the list
    pub(crate) fn head(&self) -> Option<usize> {
        self.head
    }

    pub(crate) fn len(&self) -> usize {
        self.size
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Append `idx` at the tail, resetting its links
    pub(crate) fn push_back(&mut self, arena: &mut Arena, idx: usize) {
        let old_tail = self.tail;

        if let Some(slot) = arena.get_mut(idx) {
            slot.prev = old_tail;
            slot.next = None;
        } else {
            return;
        }

        match old_tail {
            Some(tail_idx) => {
                if let Some(tail) = arena.get_mut(tail_idx) {
                    tail.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }

        self.tail = Some(idx);
        self.size += 1;
    }

    /// Unlink `idx`, fixing head, tail and neighbor links
    pub(crate) fn remove(&mut self, arena: &mut Arena, idx: usize) {
        let (prev, next) = match arena.get_mut(idx) {
            Some(slot) => (slot.prev.take(), slot.next.take()),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_slot) = arena.get_mut(prev_idx) {
                    prev_slot.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_slot) = arena.get_mut(next_idx) {
                    next_slot.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        self.size -= 1;
    }

    /// Handles from head to tail
    pub(crate) fn iter<'a>(&self, arena: &'a Arena) -> impl Iterator<Item = usize> + 'a {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let idx = cursor?;
            cursor = arena.get(idx).and_then(|slot| slot.next);
            Some(idx)
        })
    }
}
