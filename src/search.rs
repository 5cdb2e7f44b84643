//! Batched radius and k-nearest-neighbour search.
//!
//! Reference points are grouped by batch id and indexed with one [`BoxGrid`]
//! per batch element. Every query is answered against the grid of its own
//! batch id, so pairs never cross batch elements.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::batch::BatchIndex;
use crate::error::NeighbourError;
use crate::grid::{BoxGrid, GridScratch};
use crate::types::{NeighbourPairs, PointSet};

/// Per-batch spatial index over a reference point set.
#[derive(Debug, Clone)]
pub struct BatchedGrid {
    batch: BatchIndex,
    /// One grid per entry of `batch.groups()`, same order.
    grids: Vec<BoxGrid>,
    dim: usize,
}

impl BatchedGrid {
    /// Index `points`, whose batch ids are `batch`.
    pub fn build(points: &PointSet, batch: &[usize]) -> Result<Self, NeighbourError> {
        let batch = BatchIndex::new(batch, points.len())?;
        let grids: Vec<BoxGrid> = maybe_par_iter!(batch.groups())
            .map(|group| BoxGrid::new(points, &group.indices))
            .collect();
        log::trace!(
            "BatchedGrid::build: {} points in {} batch elements",
            points.len(),
            grids.len()
        );
        Ok(Self {
            batch,
            grids,
            dim: points.dim(),
        })
    }

    #[inline]
    pub fn batch(&self) -> &BatchIndex {
        &self.batch
    }

    /// Grid holding the reference points of batch `id`, if any.
    #[inline]
    pub fn grid_for(&self, id: usize) -> Option<&BoxGrid> {
        self.batch.position_of(id).map(|pos| &self.grids[pos])
    }

    fn check_queries(&self, y: &PointSet, batch_y: &[usize]) -> Result<(), NeighbourError> {
        if y.dim() != self.dim {
            return Err(NeighbourError::DimensionMismatch {
                expected: self.dim,
                found: y.dim(),
            });
        }
        if batch_y.len() != y.len() {
            return Err(NeighbourError::BatchLengthMismatch {
                points: y.len(),
                batch: batch_y.len(),
            });
        }
        Ok(())
    }

    /// For every query, all same-batch reference points within `radius`
    /// (inclusive), at most `max_num_neighbours` of them, lowest reference
    /// indices first.
    pub fn radius(
        &self,
        y: &PointSet,
        batch_y: &[usize],
        radius: f32,
        max_num_neighbours: usize,
    ) -> Result<NeighbourPairs, NeighbourError> {
        self.check_queries(y, batch_y)?;
        let blocks = self.per_query(y.len(), |q, _scratch| {
            let mut out = Vec::new();
            if let Some(grid) = self.grid_for(batch_y[q]) {
                grid.within_radius_into(y.point(q), radius, max_num_neighbours, &mut out);
            }
            out
        });
        Ok(assemble(blocks))
    }

    /// For every query, its `k` nearest same-batch reference points, nearest
    /// first. Queries whose batch holds fewer than `k` points get all of them.
    pub fn knn(
        &self,
        y: &PointSet,
        batch_y: &[usize],
        k: usize,
    ) -> Result<NeighbourPairs, NeighbourError> {
        self.check_queries(y, batch_y)?;
        let blocks = self.per_query(y.len(), |q, scratch| {
            let Some(grid) = self.grid_for(batch_y[q]) else {
                return Vec::new();
            };
            // `k` may exceed the batch size by any amount.
            let mut found = Vec::with_capacity(k.min(grid.num_points()));
            grid.knn_into(y.point(q), k, scratch, &mut found);
            found.into_iter().map(|(_, idx)| idx).collect()
        });
        Ok(assemble(blocks))
    }

    /// Run `f` for every query index with a per-thread scratch; results in query order.
    fn per_query<F>(&self, num_queries: usize, f: F) -> Vec<Vec<usize>>
    where
        F: Fn(usize, &mut GridScratch) -> Vec<usize> + Sync + Send,
    {
        #[cfg(feature = "parallel")]
        {
            (0..num_queries)
                .into_par_iter()
                .map_init(GridScratch::new, |scratch, q| f(q, scratch))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            let mut scratch = GridScratch::new();
            (0..num_queries).map(|q| f(q, &mut scratch)).collect()
        }
    }
}

fn assemble(blocks: Vec<Vec<usize>>) -> NeighbourPairs {
    let total = blocks.iter().map(Vec::len).sum();
    let mut pairs = NeighbourPairs::with_capacity(blocks.len(), total);
    for block in &blocks {
        pairs.push_block(block);
    }
    pairs
}

/// Batched radius search of `y` (queries) against `x` (references).
pub fn radius(
    x: &PointSet,
    y: &PointSet,
    radius: f32,
    batch_x: &[usize],
    batch_y: &[usize],
    max_num_neighbours: usize,
) -> Result<NeighbourPairs, NeighbourError> {
    BatchedGrid::build(x, batch_x)?.radius(y, batch_y, radius, max_num_neighbours)
}

/// Batched k-nearest-neighbour search of `y` (queries) against `x` (references).
pub fn knn(
    x: &PointSet,
    y: &PointSet,
    k: usize,
    batch_x: &[usize],
    batch_y: &[usize],
) -> Result<NeighbourPairs, NeighbourError> {
    BatchedGrid::build(x, batch_x)?.knn(y, batch_y, k)
}
