use std::thread;

use costcache::{cost_fn, Cache, CostFn};

fn size_cost() -> CostFn {
    cost_fn(|e| {
        (e.key().len() + e.value().len()) as i64 + e.reads() as i64 - e.updates() as i64
    })
}

#[test]
fn test_concurrent_adds_and_reads() {
    let cache = Cache::new(10_000, 16).unwrap();
    let f = size_cost();
    let threads = 8;
    let per_thread = 500;

    thread::scope(|s| {
        for t in 0..threads {
            let cache = &cache;
            let f = f.clone();
            s.spawn(move || {
                for i in 0..per_thread {
                    let key = format!("key{}", t * per_thread + i);
                    cache.add(key.as_bytes(), b"value", &f).unwrap();
                }
            });
        }
    });

    assert_eq!(cache.entries_count(), (threads * per_thread) as u64);
    assert_eq!(cache.collisions_count(), 0);

    thread::scope(|s| {
        for _ in 0..4 {
            let cache = &cache;
            s.spawn(move || {
                for i in 0..threads * per_thread {
                    cache.get(format!("key{}", i).as_bytes()).unwrap();
                }
            });
        }
    });

    // four readers each recorded exactly one read per key
    for i in 0..threads * per_thread {
        let entry = cache.get(format!("key{}", i).as_bytes()).unwrap();
        assert_eq!(entry.reads(), 5);
    }
    cache.check_invariants().unwrap();
}

#[test]
fn test_concurrent_mixed_ops_keep_invariants() {
    let cache = Cache::new(64, 4).unwrap();
    let f = size_cost();

    thread::scope(|s| {
        for t in 0..6 {
            let cache = &cache;
            let f = f.clone();
            s.spawn(move || {
                for i in 0..2_000usize {
                    let key = format!("key{}", (i * 7 + t) % 200);
                    match i % 4 {
                        0 => cache.add(key.as_bytes(), &vec![b'x'; i % 13], &f).unwrap(),
                        1 => {
                            let _ = cache.get(key.as_bytes());
                        }
                        2 => {
                            let _ = cache.update(key.as_bytes(), &vec![b'y'; i % 5]);
                        }
                        _ => {
                            if i % 20 == 3 {
                                let _ = cache.evict(key.as_bytes());
                            }
                        }
                    }
                }
            });
        }
    });

    assert!(cache.entries_count() <= 64);
    cache.check_invariants().unwrap();
}

#[test]
fn test_stats_readable_during_writes() {
    let cache = Cache::new(1_000, 8).unwrap();
    let f = size_cost();

    thread::scope(|s| {
        let writer = &cache;
        s.spawn(move || {
            for i in 0..1_000 {
                writer
                    .add(format!("k{}", i).as_bytes(), b"v", &f)
                    .unwrap();
            }
        });

        let reader = &cache;
        s.spawn(move || {
            let mut last = 0;
            for _ in 0..100 {
                let now = reader.entries_count();
                // only adds are running, so the count never shrinks
                assert!(now >= last);
                last = now;
            }
        });
    });

    assert!(cache.entries_count() <= 1_000);
    cache.check_invariants().unwrap();
}
