//! Sequential vs. concurrent add/get timings

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use costcache::{Cache, CostFn};
use tracing::info;

use crate::size_cost;

/// Parameters for one throughput run
#[derive(Debug, Clone)]
pub struct Settings {
    pub capacity: usize,
    pub buckets: usize,
    pub entries: usize,
    pub threads: usize,
}

fn key(i: usize) -> String {
    format!("key{}", i)
}

fn value(i: usize) -> String {
    format!("val{}", i)
}

fn add_range(cache: &Cache, start: usize, end: usize, f: &CostFn) -> Result<()> {
    for i in start..end {
        cache.add(key(i).as_bytes(), value(i).as_bytes(), f)?;
    }
    Ok(())
}

/// Returns the number of hits
fn read_range(cache: &Cache, start: usize, end: usize) -> usize {
    (start..end)
        .filter(|&i| cache.get(key(i).as_bytes()).is_ok())
        .count()
}

/// Split `0..n` into `parts` contiguous ranges
fn chunks(n: usize, parts: usize) -> Vec<(usize, usize)> {
    let size = n.div_ceil(parts.max(1)).max(1);
    (0..n)
        .step_by(size)
        .map(|start| (start, (start + size).min(n)))
        .collect()
}

fn timed<T>(f: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = f();
    (out, start.elapsed())
}

/// Run the sequential and concurrent phases, logging timings
pub fn run(settings: &Settings) -> Result<()> {
    let cache = Cache::new(settings.capacity, settings.buckets)?;
    let f = size_cost();
    let n = settings.entries;

    info!(
        "Cache capacity {} over {} buckets ({} per bucket)",
        cache.capacity(),
        cache.bucket_count(),
        cache.bucket_capacity()
    );

    let (added, elapsed) = timed(|| add_range(&cache, 0, n, &f));
    added?;
    info!("{} sequential adds took {:?}", n, elapsed);
    info!("Entries after sequential adds: {}", cache.entries_count());

    let (hits, elapsed) = timed(|| read_range(&cache, 0, n));
    info!("{} sequential reads took {:?} ({} hits)", n, elapsed, hits);

    cache.clear();
    info!("Entries after clear: {}", cache.entries_count());

    let ranges = chunks(n, settings.threads);
    let (added, elapsed) = timed(|| {
        thread::scope(|s| {
            let handles: Vec<_> = ranges
                .iter()
                .map(|&(start, end)| {
                    let cache = &cache;
                    let f = &f;
                    s.spawn(move || add_range(cache, start, end, f))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|_| Err(anyhow::anyhow!("add worker panicked"))))
                .collect::<Result<Vec<_>>>()
        })
    });
    added?;
    info!(
        "{} concurrent adds over {} threads took {:?}",
        n,
        ranges.len(),
        elapsed
    );
    info!("Entries after concurrent adds: {}", cache.entries_count());

    let (hits, elapsed) = timed(|| {
        thread::scope(|s| {
            let handles: Vec<_> = ranges
                .iter()
                .map(|&(start, end)| {
                    let cache = &cache;
                    s.spawn(move || read_range(cache, start, end))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or(0))
                .sum::<usize>()
        })
    });
    info!(
        "{} concurrent reads over {} threads took {:?} ({} hits)",
        n,
        ranges.len(),
        elapsed,
        hits
    );

    let stats = cache.stats();
    info!(
        "Collisions: {}, evictions: {}, hit ratio: {:.3}",
        cache.collisions_count(),
        stats.evictions,
        stats.hit_ratio()
    );
    info!(
        "Entries can fall short of the added count: capacity is split evenly \
         across buckets and a key's bucket is fixed by its hash, so crowded \
         buckets evict while others still have room"
    );

    Ok(())
}
