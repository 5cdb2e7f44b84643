//! Neighbour finders.
//!
//! A finder pairs every query point `y[j]` with reference points `x[i]` of the
//! same batch element. Results are [`NeighbourPairs`] grouped by query.
//! [`NeighbourFinder`] is the single dispatch point over all variants.

mod dilated;
mod multiscale;

pub use dilated::{DilatedKnnFinder, ShortBlockPolicy};
pub use multiscale::{MultiScaleRadiusFinder, ScaleList};

use rand::Rng;

use crate::error::NeighbourError;
use crate::search::{self, BatchedGrid};
use crate::types::{NeighbourPairs, PointSet};

/// Default per-query cap of radius finders.
pub const DEFAULT_MAX_NUM_NEIGHBOURS: usize = 64;

pub(crate) fn check_radius(radius: f32) -> Result<f32, NeighbourError> {
    if radius.is_finite() && radius >= 0.0 {
        Ok(radius)
    } else {
        Err(NeighbourError::config(format!(
            "radius must be finite and non-negative, got {}",
            radius
        )))
    }
}

pub(crate) fn check_max_neighbours(max_num_neighbours: usize) -> Result<usize, NeighbourError> {
    if max_num_neighbours == 0 {
        Err(NeighbourError::config("max_num_neighbours must be at least 1"))
    } else {
        Ok(max_num_neighbours)
    }
}

/// All same-batch reference points within `radius` of each query, at most
/// `max_num_neighbours` per query.
///
/// When more points qualify than the cap allows, the ones with the lowest
/// reference indices are kept (not necessarily the nearest).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusFinder {
    radius: f32,
    max_num_neighbours: usize,
}

impl RadiusFinder {
    pub fn new(radius: f32, max_num_neighbours: usize) -> Result<Self, NeighbourError> {
        Ok(Self {
            radius: check_radius(radius)?,
            max_num_neighbours: check_max_neighbours(max_num_neighbours)?,
        })
    }

    /// Radius finder with the default cap of 64 neighbours.
    pub fn with_radius(radius: f32) -> Result<Self, NeighbourError> {
        Self::new(radius, DEFAULT_MAX_NUM_NEIGHBOURS)
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn max_num_neighbours(&self) -> usize {
        self.max_num_neighbours
    }

    pub fn find_neighbours(
        &self,
        x: &PointSet,
        y: &PointSet,
        batch_x: &[usize],
        batch_y: &[usize],
    ) -> Result<NeighbourPairs, NeighbourError> {
        let pairs = search::radius(x, y, self.radius, batch_x, batch_y, self.max_num_neighbours)?;
        log::debug!(
            "RadiusFinder(r={}, max={}): {} pairs for {} queries",
            self.radius,
            self.max_num_neighbours,
            pairs.len(),
            y.len()
        );
        Ok(pairs)
    }

    /// Same as [`find_neighbours`](Self::find_neighbours) against a prebuilt index.
    pub fn find_neighbours_in(
        &self,
        index: &BatchedGrid,
        y: &PointSet,
        batch_y: &[usize],
    ) -> Result<NeighbourPairs, NeighbourError> {
        index.radius(y, batch_y, self.radius, self.max_num_neighbours)
    }
}

/// The `k` nearest same-batch reference points of each query, nearest first.
///
/// Queries whose batch element holds fewer than `k` reference points receive
/// all of them; there is no padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnnFinder {
    k: usize,
}

impl KnnFinder {
    pub fn new(k: usize) -> Result<Self, NeighbourError> {
        if k == 0 {
            return Err(NeighbourError::config("k must be at least 1"));
        }
        Ok(Self { k })
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn find_neighbours(
        &self,
        x: &PointSet,
        y: &PointSet,
        batch_x: &[usize],
        batch_y: &[usize],
    ) -> Result<NeighbourPairs, NeighbourError> {
        let pairs = search::knn(x, y, self.k, batch_x, batch_y)?;
        log::debug!(
            "KnnFinder(k={}): {} pairs for {} queries",
            self.k,
            pairs.len(),
            y.len()
        );
        Ok(pairs)
    }

    pub fn find_neighbours_in(
        &self,
        index: &BatchedGrid,
        y: &PointSet,
        batch_y: &[usize],
    ) -> Result<NeighbourPairs, NeighbourError> {
        index.knn(y, batch_y, self.k)
    }
}

/// Neighbour search policy.
#[derive(Debug, Clone, PartialEq)]
pub enum NeighbourFinder {
    Radius(RadiusFinder),
    Knn(KnnFinder),
    DilatedKnn(DilatedKnnFinder),
    MultiScaleRadius(MultiScaleRadiusFinder),
}

impl NeighbourFinder {
    pub fn radius(radius: f32, max_num_neighbours: usize) -> Result<Self, NeighbourError> {
        Ok(NeighbourFinder::Radius(RadiusFinder::new(
            radius,
            max_num_neighbours,
        )?))
    }

    pub fn knn(k: usize) -> Result<Self, NeighbourError> {
        Ok(NeighbourFinder::Knn(KnnFinder::new(k)?))
    }

    pub fn dilated_knn(k: usize, dilation: usize) -> Result<Self, NeighbourError> {
        Ok(NeighbourFinder::DilatedKnn(DilatedKnnFinder::new(
            k, dilation,
        )?))
    }

    pub fn multiscale_radius(
        radius: impl Into<ScaleList<f32>>,
        max_num_neighbours: impl Into<ScaleList<usize>>,
    ) -> Result<Self, NeighbourError> {
        Ok(NeighbourFinder::MultiScaleRadius(
            MultiScaleRadiusFinder::new(radius, max_num_neighbours)?,
        ))
    }

    /// Number of scales; 1 for single-scale variants.
    #[inline]
    pub fn num_scales(&self) -> usize {
        match self {
            NeighbourFinder::MultiScaleRadius(f) => f.num_scales(),
            _ => 1,
        }
    }

    /// Find neighbours at scale 0.
    pub fn find_neighbours<R: Rng + ?Sized>(
        &self,
        x: &PointSet,
        y: &PointSet,
        batch_x: &[usize],
        batch_y: &[usize],
        rng: &mut R,
    ) -> Result<NeighbourPairs, NeighbourError> {
        self.find_neighbours_at(x, y, batch_x, batch_y, 0, rng)
    }

    /// Find neighbours at `scale_idx`.
    ///
    /// The RNG is only consumed by the dilated variant.
    pub fn find_neighbours_at<R: Rng + ?Sized>(
        &self,
        x: &PointSet,
        y: &PointSet,
        batch_x: &[usize],
        batch_y: &[usize],
        scale_idx: usize,
        rng: &mut R,
    ) -> Result<NeighbourPairs, NeighbourError> {
        if scale_idx >= self.num_scales() {
            return Err(NeighbourError::ScaleOutOfRange {
                index: scale_idx,
                num_scales: self.num_scales(),
            });
        }
        match self {
            NeighbourFinder::Radius(f) => f.find_neighbours(x, y, batch_x, batch_y),
            NeighbourFinder::Knn(f) => f.find_neighbours(x, y, batch_x, batch_y),
            NeighbourFinder::DilatedKnn(f) => f.find_neighbours(x, y, batch_x, batch_y, rng),
            NeighbourFinder::MultiScaleRadius(f) => {
                f.find_neighbours(x, y, batch_x, batch_y, scale_idx)
            }
        }
    }
}
