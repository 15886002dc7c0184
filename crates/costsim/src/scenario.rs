//! Eviction walkthrough on a three-entry, single-bucket cache

use anyhow::Result;
use costcache::{Cache, CostFn, Entry, Error};
use tracing::{info, warn};

use crate::size_cost;

/// Outcome of the scenario checks
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub passed: usize,
    pub failed: usize,
}

impl Report {
    fn check(&mut self, name: &str, ok: bool) {
        if ok {
            self.passed += 1;
            info!("PASS {}", name);
        } else {
            self.failed += 1;
            warn!("FAIL {}", name);
        }
    }
}

fn show(key: &str, result: &costcache::Result<Entry>) {
    match result {
        Ok(entry) => info!(
            "{} : {} reads: {} updates: {}",
            key,
            String::from_utf8_lossy(entry.value()),
            entry.reads(),
            entry.updates()
        ),
        Err(e) => info!("{} : {}", key, e),
    }
}

fn add_and_report_cost(cache: &Cache, key: &str, value: &str, f: &CostFn) -> Result<()> {
    cache.add(key.as_bytes(), value.as_bytes(), f)?;
    let entry = cache.get(key.as_bytes())?;
    info!("Cost of {} = {}", key, f(&entry));
    Ok(())
}

fn read(cache: &Cache, key: &str) -> costcache::Result<Entry> {
    let result = cache.get(key.as_bytes());
    show(key, &result);
    result
}

/// Run the walkthrough and tally each check
pub fn run() -> Result<Report> {
    let f = size_cost();
    let mut report = Report::default();

    info!("Initializing cache with capacity 3 and one bucket");
    let cache = Cache::new(3, 1)?;

    cache.add(b"key1", b"value1", &f)?;
    let result = read(&cache, "key1");
    report.check(
        "add then get returns value with one read",
        matches!(&result, Ok(e) if e.value() == b"value1" && e.reads() == 1 && e.updates() == 0),
    );

    cache.update(b"key1", b"newValue")?;
    let result = read(&cache, "key1");
    report.check(
        "update replaces value and counts the update",
        matches!(&result, Ok(e) if e.value() == b"newValue" && e.reads() == 2 && e.updates() == 1),
    );

    cache.evict(b"key1")?;
    let result = read(&cache, "key1");
    report.check("evicted key is gone", result == Err(Error::NotFound));

    for (key, value) in [
        ("key1", "val1"),
        ("key2", "val22"),
        ("key3", "val333"),
        ("key4", "val4444"),
    ] {
        add_and_report_cost(&cache, key, value, &f)?;
    }

    info!("Capacity is 3, so the minimum-cost key should have been evicted");
    report.check("key1 evicted", read(&cache, "key1").is_err());
    for key in ["key2", "key3", "key4"] {
        report.check(&format!("{} retained", key), read(&cache, key).is_ok());
    }

    cache.update(b"key2", b"13-char value")?;
    for key in ["key2", "key3", "key4"] {
        let entry = cache.get(key.as_bytes())?;
        info!("Cost of {} = {}", key, f(&entry));
    }

    info!("Adding key5; key3 now has the minimum cost");
    cache.add(b"key5", b"val5", &f)?;
    report.check("key3 evicted", read(&cache, "key3").is_err());

    cache.clear();
    report.check("clear empties the cache", cache.entries_count() == 0);

    Ok(report)
}
