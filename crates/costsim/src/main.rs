//! costsim - simulation runner for the costcache engine

mod scenario;
mod throughput;

use anyhow::{bail, Result};
use clap::Parser;
use costcache::{cost_fn, CostFn};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity for the throughput run (number of entries)
    #[arg(short, long, default_value_t = 1_000_000)]
    capacity: usize,

    /// Bucket count for the throughput run (0 = default of 512)
    #[arg(short, long, default_value_t = 0)]
    buckets: usize,

    /// Number of generated key/value pairs
    #[arg(short = 'n', long, default_value_t = 1_000_000)]
    entries: usize,

    /// Worker threads for the concurrent phases
    #[arg(short, long, default_value_t = 100)]
    threads: usize,

    /// Skip the capacity-3 eviction scenario
    #[arg(long)]
    skip_scenario: bool,

    /// Skip the throughput run
    #[arg(long)]
    skip_throughput: bool,
}

/// cost = len(key) + len(value) + reads - updates
pub(crate) fn size_cost() -> CostFn {
    cost_fn(|e| {
        (e.key().len() + e.value().len()) as i64 + e.reads() as i64 - e.updates() as i64
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!("Starting costsim v{}", env!("CARGO_PKG_VERSION"));

    if !args.skip_scenario {
        let report = scenario::run()?;
        info!(
            "Scenario finished: {} passed, {} failed",
            report.passed, report.failed
        );
        if report.failed > 0 {
            bail!("{} scenario checks failed", report.failed);
        }
    }

    if !args.skip_throughput {
        throughput::run(&throughput::Settings {
            capacity: args.capacity,
            buckets: args.buckets,
            entries: args.entries,
            threads: args.threads.max(1),
        })?;
    }

    Ok(())
}
