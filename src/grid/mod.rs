//! Uniform box grid for spatial queries over one batch element.
//!
//! Points are bucketed on their first `min(D, 3)` coordinates into a regular
//! axis-aligned grid. O(n) build (counting sort), O(1) cell lookup.
//!
//! Supports two query types:
//! - `knn_into`: k-nearest neighbours (best-first expansion over cells)
//! - `within_radius_into`: all points within a Euclidean radius
//!
//! Distances always use every coordinate. Cell bounds only see the gridded
//! coordinates, which makes them lower bounds of the full distance.

mod build;
mod query;


use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Target points per cell.
/// Lower = more cells, faster scans, more heap overhead.
/// Higher = fewer cells, longer scans, less overhead.
pub(crate) const GRID_TARGET_DENSITY: f64 = 16.0;

/// Upper bound on cells along one axis, keeps sparse outliers from blowing up memory.
pub(crate) const MAX_RES_PER_AXIS: usize = 1024;

/// Maximum number of coordinates the grid buckets on.
pub(crate) const MAX_GRID_DIMS: usize = 3;

/// A f32 wrapper that implements Ord using total_cmp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct OrdF32(f32);

impl Eq for OrdF32 {}

impl PartialOrd for OrdF32 {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF32 {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl OrdF32 {
    #[inline]
    pub(crate) fn new(v: f32) -> Self {
        OrdF32(v)
    }

    #[inline]
    pub(crate) fn get(self) -> f32 {
        self.0
    }
}

/// Box grid over a subset of a point set.
#[derive(Debug, Clone)]
pub struct BoxGrid {
    /// Full point dimension.
    pub(super) dim: usize,
    /// Number of gridded coordinates (`min(dim, 3)`).
    pub(super) grid_dims: usize,
    /// Cells per axis; axes past `grid_dims` have resolution 1.
    pub(super) res: [usize; MAX_GRID_DIMS],
    pub(super) origin: [f32; MAX_GRID_DIMS],
    pub(super) cell_size: [f32; MAX_GRID_DIMS],
    /// Inverse cell size, 0 for degenerate (zero-extent) axes.
    pub(super) inv_cell: [f32; MAX_GRID_DIMS],
    /// Start index into `point_indices` for each cell, plus final length.
    /// Length: num_cells + 1
    pub(super) cell_offsets: Vec<u32>,
    /// Global point indices grouped by cell, ascending within a cell.
    pub(super) point_indices: Vec<usize>,
    /// Coordinates of `point_indices`, row-major in the same order.
    pub(super) cell_coords: Vec<f32>,
}

impl BoxGrid {
    #[inline]
    pub fn num_cells(&self) -> usize {
        self.cell_offsets.len() - 1
    }

    #[inline]
    pub fn num_points(&self) -> usize {
        self.point_indices.len()
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn resolution(&self) -> [usize; MAX_GRID_DIMS] {
        self.res
    }

    /// Cell coordinate of `v` on axis `axis`, clamped into the grid.
    #[inline]
    pub(super) fn axis_cell(&self, axis: usize, v: f32) -> usize {
        let t = ((v - self.origin[axis]) * self.inv_cell[axis]).floor();
        if t <= 0.0 {
            0
        } else {
            (t as usize).min(self.res[axis] - 1)
        }
    }

    #[inline]
    pub(super) fn cell_id(&self, c: [usize; MAX_GRID_DIMS]) -> usize {
        c[0] + self.res[0] * (c[1] + self.res[1] * c[2])
    }

    #[inline]
    pub(super) fn cell_coords_of(&self, cell: usize) -> [usize; MAX_GRID_DIMS] {
        let x = cell % self.res[0];
        let rest = cell / self.res[0];
        [x, rest % self.res[1], rest / self.res[1]]
    }

    #[inline]
    pub(super) fn cell_of_point(&self, p: &[f32]) -> [usize; MAX_GRID_DIMS] {
        let mut c = [0usize; MAX_GRID_DIMS];
        for (axis, slot) in c.iter_mut().enumerate().take(self.grid_dims) {
            *slot = self.axis_cell(axis, p[axis]);
        }
        c
    }

    /// Lower bound on the squared distance from `q` to any point in `cell`.
    #[inline]
    pub(super) fn cell_bound_dist_sq(&self, q: &[f32], cell: [usize; MAX_GRID_DIMS]) -> f32 {
        let mut sum = 0.0f32;
        for axis in 0..self.grid_dims {
            let size = self.cell_size[axis];
            // Slack absorbs rounding in `axis_cell` for points on a cell boundary.
            let slack = size * 1e-4;
            let lo = self.origin[axis] + cell[axis] as f32 * size - slack;
            let hi = lo + size + 2.0 * slack;
            let v = q[axis];
            let d = if v < lo {
                lo - v
            } else if v > hi {
                v - hi
            } else {
                0.0
            };
            sum += d * d;
        }
        sum
    }

    /// Indices and coordinates stored in `cell`.
    #[inline]
    pub(super) fn cell_slice(&self, cell: usize) -> (&[usize], &[f32]) {
        let start = self.cell_offsets[cell] as usize;
        let end = self.cell_offsets[cell + 1] as usize;
        (
            &self.point_indices[start..end],
            &self.cell_coords[start * self.dim..end * self.dim],
        )
    }
}

/// Reusable per-thread buffers for grid queries.
///
/// One scratch can serve grids of different sizes; it grows to the largest
/// grid it has seen.
#[derive(Debug, Default)]
pub struct GridScratch {
    visited_stamp: Vec<u32>,
    stamp: u32,
    cell_heap: BinaryHeap<Reverse<(OrdF32, u32)>>,
    /// Max-heap of the current best candidates: (dist_sq, global index).
    best: BinaryHeap<(OrdF32, usize)>,
}

impl GridScratch {
    pub fn new() -> Self {
        Self::default()
    }

    fn begin_query(&mut self, num_cells: usize) {
        if self.visited_stamp.len() < num_cells {
            self.visited_stamp.resize(num_cells, 0);
        }
        self.cell_heap.clear();
        self.best.clear();

        // Stamp 0 means "unvisited". Avoid ever using stamp 0 for a query.
        self.stamp = self.stamp.wrapping_add(1).max(1);
        if self.stamp == u32::MAX {
            self.visited_stamp.fill(0);
            self.stamp = 1;
        }
    }

    #[inline]
    fn mark_visited(&mut self, cell: u32) -> bool {
        let idx = cell as usize;
        if self.visited_stamp[idx] == self.stamp {
            return false;
        }
        self.visited_stamp[idx] = self.stamp;
        true
    }

    #[inline]
    fn push_cell(&mut self, cell: u32, bound_dist_sq: f32) {
        self.cell_heap
            .push(Reverse((OrdF32::new(bound_dist_sq), cell)));
    }

    #[inline]
    fn pop_cell(&mut self) -> Option<(f32, u32)> {
        self.cell_heap
            .pop()
            .map(|Reverse((bound, cell))| (bound.get(), cell))
    }

    /// Worst distance among the current candidates, once `k` are held.
    #[inline]
    fn kth_dist_sq(&self, k: usize) -> Option<f32> {
        if self.best.len() >= k {
            self.best.peek().map(|(d, _)| d.get())
        } else {
            None
        }
    }

    #[inline]
    fn try_add(&mut self, k: usize, dist_sq: f32, idx: usize) {
        let entry = (OrdF32::new(dist_sq), idx);
        if self.best.len() < k {
            self.best.push(entry);
        } else if let Some(top) = self.best.peek() {
            if entry < *top {
                self.best.pop();
                self.best.push(entry);
            }
        }
    }
}
