#![allow(dead_code)]

use point_neighbours::PointSet;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generate `n` points uniformly distributed in the unit cube of dimension `dim`.
pub fn random_cube_points(n: usize, dim: usize, seed: u64) -> PointSet {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    random_cube_points_with_rng(n, dim, &mut rng)
}

pub fn random_cube_points_with_rng<R: Rng + ?Sized>(n: usize, dim: usize, rng: &mut R) -> PointSet {
    let coords: Vec<f32> = (0..n * dim).map(|_| rng.gen_range(0.0..1.0)).collect();
    PointSet::new(coords, dim).unwrap()
}

/// Generate tight Gaussian-ish clusters around random centres.
///
/// Stresses grid resolution: most cells are empty, a few are crowded.
pub fn clustered_points(n: usize, clusters: usize, spread: f32, seed: u64) -> PointSet {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let centres: Vec<[f32; 3]> = (0..clusters.max(1))
        .map(|_| {
            [
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            ]
        })
        .collect();

    let rows: Vec<[f32; 3]> = (0..n)
        .map(|i| {
            let c = centres[i % centres.len()];
            // Sum of uniforms is close enough to a normal for test purposes.
            let mut jitter = || {
                let s: f32 = (0..4).map(|_| rng.gen_range(-1.0f32..1.0)).sum();
                s * 0.5 * spread
            };
            [c[0] + jitter(), c[1] + jitter(), c[2] + jitter()]
        })
        .collect();
    PointSet::from_rows(&rows).unwrap()
}

/// Points on a regular `side x side` lattice in the z = 0 plane, unit spacing.
pub fn lattice_points(side: usize) -> PointSet {
    let rows: Vec<[f32; 3]> = (0..side * side)
        .map(|i| [(i % side) as f32, (i / side) as f32, 0.0])
        .collect();
    PointSet::from_rows(&rows).unwrap()
}

/// Stack `batches` independent clouds, each shifted onto the same region so
/// that cross-batch pairs would be close if batch ids were ignored.
///
/// Batch ids are interleaved in memory to exercise non-contiguous batches.
pub fn interleaved_batches(per_batch: usize, batches: usize, dim: usize, seed: u64) -> (PointSet, Vec<usize>) {
    let cloud = random_cube_points(per_batch * batches, dim, seed);
    let batch: Vec<usize> = (0..cloud.len()).map(|i| i % batches).collect();
    (cloud, batch)
}

/// Contiguous batch vector: `sizes[b]` points with id `b`, in order.
pub fn contiguous_batch(sizes: &[usize]) -> Vec<usize> {
    sizes
        .iter()
        .enumerate()
        .flat_map(|(b, &len)| std::iter::repeat(b).take(len))
        .collect()
}

// =============================================================================
// Brute-force references
// =============================================================================

/// All same-batch reference indices within `radius` of query `q`, ascending.
pub fn brute_radius(
    x: &PointSet,
    y: &PointSet,
    batch_x: &[usize],
    batch_y: &[usize],
    q: usize,
    radius: f32,
) -> Vec<usize> {
    (0..x.len())
        .filter(|&i| batch_x[i] == batch_y[q] && x.dist_sq(i, y, q) <= radius * radius)
        .collect()
}

/// The `k` nearest same-batch reference indices of query `q`, nearest first,
/// ties by index.
pub fn brute_knn(
    x: &PointSet,
    y: &PointSet,
    batch_x: &[usize],
    batch_y: &[usize],
    q: usize,
    k: usize,
) -> Vec<usize> {
    let mut cands: Vec<(f32, usize)> = (0..x.len())
        .filter(|&i| batch_x[i] == batch_y[q])
        .map(|i| (x.dist_sq(i, y, q), i))
        .collect();
    cands.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    cands.truncate(k);
    cands.into_iter().map(|(_, i)| i).collect()
}

/// Smallest pairwise distance among the selected points.
pub fn min_pairwise_distance(points: &PointSet, idx: &[usize]) -> f32 {
    let mut best = f32::INFINITY;
    for (a, &i) in idx.iter().enumerate() {
        for &j in &idx[a + 1..] {
            best = best.min(points.dist_sq(i, points, j).sqrt());
        }
    }
    best
}
