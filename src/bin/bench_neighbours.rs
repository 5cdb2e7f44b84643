//! Benchmark one downsampling stage: sampling + neighbour search.
//!
//! Run with: cargo run --release --bin bench_neighbours
//!
//! Usage:
//!   bench_neighbours                     Run default size (100k)
//!   bench_neighbours 100k 1m             Run multiple sizes
//!   bench_neighbours -b 8 --dim 3        Split points over 8 batch elements
//!   bench_neighbours --radius 0.05 0.1   Multi-scale radius search
//!   bench_neighbours -n 10               Run 10 iterations (for profiling)
//!
//! Set RUST_LOG=debug for per-call details.

use clap::Parser;
use point_neighbours::{
    BatchedGrid, DilatedKnnFinder, KnnFinder, MultiScaleRadiusFinder, PointSet, SampleSize,
    Sampler, ShortBlockPolicy,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::error::Error;
use std::time::Instant;

/// Point count with an optional `k`/`m` suffix; underscores are ignored ("100_000", "2.5m").
fn parse_size(s: &str) -> Result<usize, String> {
    let cleaned: String = s.trim().to_lowercase().replace('_', "");
    let (digits, scale) = match cleaned.strip_suffix('m') {
        Some(rest) => (rest, 1e6),
        None => match cleaned.strip_suffix('k') {
            Some(rest) => (rest, 1e3),
            None => (cleaned.as_str(), 1.0),
        },
    };
    let value: f64 = digits
        .parse()
        .map_err(|e| format!("invalid point count '{}': {}", s, e))?;
    let count = (value * scale).round();
    if !(count >= 1.0 && count.is_finite()) {
        return Err(format!("point count '{}' must be at least 1", s));
    }
    Ok(count as usize)
}

#[derive(Parser)]
#[command(name = "bench_neighbours")]
#[command(about = "Benchmark point sampling and neighbour search at various scales")]
struct Args {
    /// Point counts to benchmark (e.g., 100k, 1m)
    #[arg(value_parser = parse_size)]
    sizes: Vec<usize>,

    /// Random seed
    #[arg(short, long, default_value_t = 12345)]
    seed: u64,

    /// Number of batch elements the points are split over
    #[arg(short, long, default_value_t = 1)]
    batches: usize,

    /// Point dimension
    #[arg(long, default_value_t = 3)]
    dim: usize,

    /// Sampling ratio for the downsampling stage
    #[arg(long, default_value_t = 0.25)]
    ratio: f64,

    /// Use random sampling instead of farthest-point sampling
    #[arg(long)]
    random: bool,

    /// Radii for the multi-scale radius search (unit cube coordinates)
    #[arg(long, num_args = 1.., default_values_t = vec![0.05f32])]
    radius: Vec<f32>,

    /// Per-query cap for radius search
    #[arg(long, default_value_t = 64)]
    max_neighbours: usize,

    /// k for kNN and dilated kNN search
    #[arg(short, long, default_value_t = 16)]
    k: usize,

    /// Dilation for dilated kNN search
    #[arg(long, default_value_t = 2)]
    dilation: usize,

    /// Number of iterations to run (useful for profiling)
    #[arg(short = 'n', long, default_value_t = 1)]
    repeat: usize,
}

/// Short count for table cells: 950, 12.5k, 3.20M.
fn format_count(n: usize) -> String {
    match n {
        0..=9_999 => n.to_string(),
        10_000..=999_999 => format!("{:.1}k", n as f64 / 1e3),
        _ => format!("{:.2}M", n as f64 / 1e6),
    }
}

/// Throughput of `items` processed in `ms`, labelled with `unit` (e.g. "queries").
fn format_throughput(items: usize, ms: f64, unit: &str) -> String {
    if items == 0 || ms <= 0.0 {
        return format!("-- {}/s", unit);
    }
    let per_sec = items as f64 * 1000.0 / ms;
    let (value, prefix) = if per_sec >= 1e6 {
        (per_sec / 1e6, "M")
    } else if per_sec >= 1e3 {
        (per_sec / 1e3, "k")
    } else {
        (per_sec, "")
    };
    format!("{:.2}{} {}/s", value, prefix, unit)
}

/// Average pairs per query, as a readability aid next to pair totals.
fn pairs_per_query(pairs: usize, queries: usize) -> f64 {
    if queries == 0 {
        0.0
    } else {
        pairs as f64 / queries as f64
    }
}

/// Uniform points in the unit cube, assigned to batch elements in contiguous runs.
fn generate_points(
    n: usize,
    dim: usize,
    batches: usize,
    seed: u64,
) -> Result<(PointSet, Vec<usize>), Box<dyn Error>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let coords: Vec<f32> = (0..n * dim).map(|_| rng.gen_range(0.0..1.0)).collect();
    let per_batch = n.div_ceil(batches.max(1)).max(1);
    let batch: Vec<usize> = (0..n).map(|i| i / per_batch).collect();
    Ok((PointSet::new(coords, dim)?, batch))
}

#[derive(Default)]
struct StageTimes {
    sample_ms: f64,
    index_ms: f64,
    radius_ms: Vec<f64>,
    knn_ms: f64,
    dilated_ms: f64,
    radius_pairs: Vec<usize>,
    knn_pairs: usize,
    num_queries: usize,
}

fn ms_since(t: Instant) -> f64 {
    t.elapsed().as_secs_f64() * 1000.0
}

fn run_stage(
    args: &Args,
    points: &PointSet,
    batch: &[usize],
    rng: &mut ChaCha8Rng,
) -> Result<StageTimes, Box<dyn Error>> {
    let mut times = StageTimes::default();
    let size = SampleSize::Ratio(args.ratio);
    let sampler = if args.random {
        Sampler::random(size)?
    } else {
        Sampler::farthest_point(size)?
    };

    let t = Instant::now();
    let idx = sampler.sample(points, batch, rng)?;
    times.sample_ms = ms_since(t);

    let queries = points.select(&idx)?;
    let query_batch: Vec<usize> = idx.iter().map(|&i| batch[i]).collect();
    times.num_queries = queries.len();

    let t = Instant::now();
    let index = BatchedGrid::build(points, batch)?;
    times.index_ms = ms_since(t);

    let multiscale = MultiScaleRadiusFinder::new(args.radius.clone(), args.max_neighbours)?;
    for scale in 0..multiscale.num_scales() {
        let t = Instant::now();
        let pairs = multiscale
            .finder(scale)?
            .find_neighbours_in(&index, &queries, &query_batch)?;
        times.radius_ms.push(ms_since(t));
        times.radius_pairs.push(pairs.len());
    }

    let t = Instant::now();
    let pairs = KnnFinder::new(args.k)?.find_neighbours_in(&index, &queries, &query_batch)?;
    times.knn_ms = ms_since(t);
    times.knn_pairs = pairs.len();

    let dilated = DilatedKnnFinder::new(args.k, args.dilation)?.with_policy(ShortBlockPolicy::Clamp);
    let t = Instant::now();
    dilated.find_neighbours(points, &queries, batch, &query_batch, rng)?;
    times.dilated_ms = ms_since(t);

    Ok(times)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    println!("point-neighbours Benchmark");
    println!("==========================\n");

    let sizes: Vec<usize> = if args.sizes.is_empty() {
        vec![100_000]
    } else {
        args.sizes.clone()
    };

    println!("Configuration:");
    println!("  seed = {}", args.seed);
    println!("  dim = {}, batches = {}", args.dim, args.batches);
    println!(
        "  sampler = {} (ratio {})",
        if args.random { "random" } else { "farthest-point" },
        args.ratio
    );
    println!("  radii = {:?}, max_neighbours = {}", args.radius, args.max_neighbours);
    println!("  k = {}, dilation = {}", args.k, args.dilation);
    println!(
        "  sizes = {:?}",
        sizes.iter().map(|&n| format_count(n)).collect::<Vec<_>>()
    );

    let mut rng = ChaCha8Rng::seed_from_u64(args.seed ^ 0x9e37_79b9);

    for &n in &sizes {
        println!("\n{}", "=".repeat(60));
        println!("Benchmarking n = {}", format_count(n));
        println!("{}", "=".repeat(60));

        let t_gen = Instant::now();
        let (points, batch) = generate_points(n, args.dim, args.batches, args.seed)?;
        println!("Point generation: {:.1}ms", ms_since(t_gen));

        for iter in 0..args.repeat.max(1) {
            if args.repeat > 1 {
                println!("\n  Iteration {}/{}", iter + 1, args.repeat);
            }
            let times = run_stage(&args, &points, &batch, &mut rng)?;

            let nq = times.num_queries;
            println!(
                "  Sampling:      {:>8.1}ms  {} -> {} points ({})",
                times.sample_ms,
                format_count(n),
                format_count(nq),
                format_throughput(n, times.sample_ms, "points")
            );
            println!(
                "  Index build:   {:>8.1}ms  ({})",
                times.index_ms,
                format_throughput(n, times.index_ms, "points")
            );
            for (scale, (ms, pairs)) in times
                .radius_ms
                .iter()
                .zip(times.radius_pairs.iter())
                .enumerate()
            {
                println!(
                    "  Radius[{}]:     {:>8.1}ms  ({}, {} pairs, {:.1}/query)",
                    scale,
                    ms,
                    format_throughput(nq, *ms, "queries"),
                    format_count(*pairs),
                    pairs_per_query(*pairs, nq)
                );
            }
            println!(
                "  kNN:           {:>8.1}ms  ({}, {} pairs)",
                times.knn_ms,
                format_throughput(nq, times.knn_ms, "queries"),
                format_count(times.knn_pairs)
            );
            println!(
                "  Dilated kNN:   {:>8.1}ms  ({})",
                times.dilated_ms,
                format_throughput(nq, times.dilated_ms, "queries")
            );
        }
    }

    println!("\nBenchmark complete.");
    Ok(())
}
