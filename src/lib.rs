//! Spatial downsampling and neighbour search for multi-scale point-cloud pipelines.
//!
//! This crate provides the two primitive families a point-cloud backbone needs
//! to build its resolution hierarchy:
//!
//! - [`Sampler`]s select a subset of point indices, either by farthest-point
//!   sampling (deterministic, per batch element) or by uniform random draws.
//! - [`NeighbourFinder`]s pair query points with nearby reference points under
//!   a radius rule, a k-nearest rule, a dilated random-subset rule, or a
//!   multi-scale radius rule dispatched by scale index.
//!
//! Points from several clouds can be stacked into one [`PointSet`]; a batch
//! vector (one id per point) keeps them apart. Random variants take an
//! explicit RNG so results replay exactly under a fixed seed.
//!
//! # Example
//!
//! ```
//! use point_neighbours::{NeighbourFinder, PointSet, SampleSize, Sampler};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let rows: Vec<[f32; 3]> = (0..100)
//!     .map(|i| [(i % 10) as f32, (i / 10) as f32, 0.0])
//!     .collect();
//! let points = PointSet::from_rows(&rows).unwrap();
//! let batch = vec![0usize; points.len()];
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//!
//! let sampler = Sampler::farthest_point(SampleSize::Ratio(0.1)).unwrap();
//! let idx = sampler.sample(&points, &batch, &mut rng).unwrap();
//! assert_eq!(idx.len(), 10);
//!
//! let centres = points.select(&idx).unwrap();
//! let centre_batch = vec![0usize; centres.len()];
//! let finder = NeighbourFinder::radius(1.5, 16).unwrap();
//! let pairs = finder
//!     .find_neighbours(&points, &centres, &batch, &centre_batch, &mut rng)
//!     .unwrap();
//! assert!(pairs.len() >= 10);
//! ```

/// Conditionally parallel iterator over a slice.
macro_rules! maybe_par_iter {
    ($slice:expr) => {{
        #[cfg(feature = "parallel")]
        {
            $slice.par_iter()
        }
        #[cfg(not(feature = "parallel"))]
        {
            $slice.iter()
        }
    }};
}

mod batch;
mod error;
mod types;

pub mod finder;
pub mod sampler;
pub mod search;

// Internal spatial index
pub(crate) mod grid;

pub use batch::{BatchGroup, BatchIndex};
pub use error::NeighbourError;
pub use finder::{
    DilatedKnnFinder, KnnFinder, MultiScaleRadiusFinder, NeighbourFinder, RadiusFinder,
    ScaleList, ShortBlockPolicy,
};
pub use grid::{BoxGrid, GridScratch};
pub use sampler::{FarthestPointSampler, FpsStart, RandomSampler, SampleSize, Sampler};
pub use search::BatchedGrid;
pub use types::{NeighbourPairs, Point3, PointLike, PointSet};
