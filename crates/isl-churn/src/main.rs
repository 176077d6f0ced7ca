//! ISL Churn CLI
//!
//! Simulates a constellation day and reports how many inter-satellite
//! links break and how many tracked shortest routes change per minute.
//!
//! Usage:
//!   isl-churn --seed 42                                  # TLE shells 2 and 3
//!   isl-churn --lon-lat data/nonuniform_constellation.json --prefix nonuniform
//!   isl-churn --config run.json --threads 16

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use isl_churn::{
    analyze_network, export, prepare_shells, RunConfig, SeriesStats, SnapshotWorkerPool,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "isl-churn",
    about = "Measure inter-satellite link and shortest-path churn over a simulated day"
)]
struct Args {
    /// JSON run configuration (defaults to the shell 2/3 TLE analysis)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Analyze a lon/lat constellation file instead of TLE shells
    #[arg(long)]
    lon_lat: Option<PathBuf>,

    /// Route targets per satellite for route-tracking shells
    #[arg(long)]
    targets: Option<usize>,

    /// Simulation start (RFC 3339)
    #[arg(long)]
    start: Option<DateTime<Utc>>,

    /// Simulated duration in minutes
    #[arg(long)]
    duration: Option<usize>,

    /// Seed for target selection
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (default: one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output file prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn build_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("reading config {:?}", path))?,
        None => RunConfig::default(),
    };

    if let Some(path) = &args.lon_lat {
        config.use_lon_lat(path);
        config.output_prefix = "nonuniform".to_string();
    }
    if let Some(targets) = args.targets {
        config.set_targets(targets);
    }
    if let Some(start) = args.start {
        config.start = start;
    }
    if let Some(duration) = args.duration {
        config.duration_minutes = duration;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(prefix) = &args.prefix {
        config.output_prefix = prefix.clone();
    }

    config.validate()?;
    Ok(config)
}

fn log_stats(title: &str, stats: &SeriesStats) {
    info!("{} Statistics:", title);
    info!("  Max per minute: {}", stats.max);
    info!("  Min per minute: {}", stats.min);
    info!("  Average per minute: {:.2}", stats.mean);
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("{}", "=".repeat(60));
    info!("ISL Churn Analysis");
    info!("{}", "=".repeat(60));

    let config = build_config(&args)?;
    info!(
        "Start {} for {} minutes, output {:?}/{}_*",
        config.start, config.duration_minutes, config.output_dir, config.output_prefix
    );

    let seed = config.seed.unwrap_or_else(|| {
        let seed = rand::random();
        warn!("No seed configured; pass --seed {} to reproduce target selection", seed);
        seed
    });
    info!("Target selection seed: {}", seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let shells = prepare_shells(&config).context("loading constellation")?;
    for shell in &shells {
        info!(
            "Shell {}: {} satellites",
            shell.plan.shell,
            shell.ephemeris.names.len()
        );
    }

    // The pool lives for the whole run and is dropped on every exit path
    let pool = SnapshotWorkerPool::new(config.threads)?;
    let aggregator = analyze_network(&shells, &pool, &mut rng, config.progress_interval)
        .context("analyzing network changes")?;
    drop(pool);

    let summary = aggregator.summary()?;
    let series = aggregator.into_series();

    let files = export::write_outputs(&config.output_dir, &config.output_prefix, &series, &summary)
        .context("writing outputs")?;
    info!("Wrote {:?} and {:?}", files.broken_links, files.path_changes);

    info!("\n{}", "=".repeat(60));
    log_stats("ISL Breaks", &summary.broken_links);
    log_stats("Path Changes", &summary.path_changes);

    Ok(())
}
