use costcache::{cost_fn, Cache, CostFn, Error};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add(u8, usize),
    Get(u8),
    Update(u8, usize),
    Evict(u8),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..12, 0usize..6).prop_map(|(k, n)| Op::Add(k, n)),
        (0u8..12).prop_map(Op::Get),
        (0u8..12, 0usize..6).prop_map(|(k, n)| Op::Update(k, n)),
        (0u8..12).prop_map(Op::Evict),
    ]
}

fn size_cost() -> CostFn {
    cost_fn(|e| {
        (e.key().len() + e.value().len()) as i64 + e.reads() as i64 - e.updates() as i64
    })
}

/// Reference model of a single bucket: eviction picks the lowest cost,
/// oldest first, where "age" restarts whenever an entry changes cost.
#[derive(Debug)]
struct ModelEntry {
    key: Vec<u8>,
    value: Vec<u8>,
    reads: u64,
    updates: u64,
    filed_at: u64,
}

impl ModelEntry {
    fn cost(&self) -> i64 {
        (self.key.len() + self.value.len()) as i64 + self.reads as i64 - self.updates as i64
    }
}

#[derive(Debug, Default)]
struct Model {
    entries: Vec<ModelEntry>,
    clock: u64,
}

impl Model {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn position(&self, key: &[u8]) -> Option<usize> {
        self.entries.iter().position(|e| e.key == key)
    }

    fn min_cost(&self) -> Option<i64> {
        self.entries.iter().map(ModelEntry::cost).min()
    }

    fn add(&mut self, key: Vec<u8>, value: Vec<u8>, capacity: usize) {
        if let Some(pos) = self.position(&key) {
            self.entries.remove(pos);
        }
        if self.entries.len() >= capacity {
            let victim = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| (e.cost(), e.filed_at))
                .map(|(pos, _)| pos);
            if let Some(pos) = victim {
                self.entries.remove(pos);
            }
        }
        let filed_at = self.tick();
        self.entries.push(ModelEntry {
            key,
            value,
            reads: 0,
            updates: 0,
            filed_at,
        });
    }

    fn touch(&mut self, pos: usize, change: impl FnOnce(&mut ModelEntry)) {
        let stamp = self.tick();
        let entry = &mut self.entries[pos];
        let before = entry.cost();
        change(entry);
        if entry.cost() != before {
            entry.filed_at = stamp;
        }
    }
}

fn key_of(k: u8) -> Vec<u8> {
    format!("key{}", k).into_bytes()
}

proptest! {
    #[test]
    fn test_matches_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let cache = Cache::new(capacity, 1).unwrap();
        let f = size_cost();
        let mut model = Model::default();

        for op in ops {
            match op {
                Op::Add(k, n) => {
                    let value = vec![b'a'; n];
                    cache.add(&key_of(k), &value, &f).unwrap();
                    model.add(key_of(k), value, capacity);
                }
                Op::Get(k) => {
                    let key = key_of(k);
                    match model.position(&key) {
                        Some(pos) => {
                            model.touch(pos, |e| e.reads += 1);
                            let entry = cache.get(&key).unwrap();
                            let expected = &model.entries[pos];
                            prop_assert_eq!(entry.value(), expected.value.as_slice());
                            prop_assert_eq!(entry.reads(), expected.reads);
                            prop_assert_eq!(entry.updates(), expected.updates);
                        }
                        None => {
                            prop_assert_eq!(cache.get(&key), Err(Error::NotFound));
                        }
                    }
                }
                Op::Update(k, n) => {
                    let key = key_of(k);
                    let value = vec![b'u'; n];
                    match model.position(&key) {
                        Some(pos) => {
                            cache.update(&key, &value).unwrap();
                            model.touch(pos, |e| {
                                e.value = value;
                                e.updates += 1;
                            });
                        }
                        None => {
                            prop_assert_eq!(cache.update(&key, &value), Err(Error::NotFound));
                        }
                    }
                }
                Op::Evict(k) => {
                    let key = key_of(k);
                    match model.position(&key) {
                        Some(pos) => {
                            cache.evict(&key).unwrap();
                            model.entries.remove(pos);
                        }
                        None => {
                            prop_assert_eq!(cache.evict(&key), Err(Error::NotFound));
                        }
                    }
                }
            }

            prop_assert_eq!(cache.entries_count(), model.entries.len() as u64);
            prop_assert_eq!(cache.min_cost(b"any").unwrap(), model.min_cost());
            prop_assert!(cache.check_invariants().is_ok());
        }

        for entry in &model.entries {
            prop_assert!(cache.get(&entry.key).is_ok());
        }
    }

    #[test]
    fn test_capacity_is_never_exceeded(
        buckets in 1usize..8,
        capacity in 1usize..40,
        keys in prop::collection::vec(0u16..500, 1..300),
    ) {
        let cache = Cache::new(capacity, buckets).unwrap();
        let f = size_cost();

        for k in keys {
            cache.add(format!("k{}", k).as_bytes(), b"v", &f).unwrap();
        }

        let limit = (cache.bucket_capacity() * cache.bucket_count()) as u64;
        prop_assert!(cache.entries_count() <= limit);
        prop_assert_eq!(cache.collisions_count(), 0);
        prop_assert!(cache.check_invariants().is_ok());
    }
}
