//! Grid build for BoxGrid.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{BoxGrid, GRID_TARGET_DENSITY, MAX_GRID_DIMS, MAX_RES_PER_AXIS};
use crate::types::PointSet;

/// Below this many points the parallel paths cost more than they save.
const PARALLEL_BUILD_MIN: usize = 4096;

impl BoxGrid {
    /// Build a grid over `points[members]`.
    ///
    /// `members` are global indices into `points`; queries report these
    /// global indices back.
    pub fn new(points: &PointSet, members: &[usize]) -> Self {
        Self::new_with_density(points, members, GRID_TARGET_DENSITY)
    }

    pub fn new_with_density(points: &PointSet, members: &[usize], target_per_cell: f64) -> Self {
        let dim = points.dim();
        let grid_dims = dim.min(MAX_GRID_DIMS);
        let n = members.len();

        // Step 1: Bounds over the gridded coordinates.
        let mut lo = [0.0f32; MAX_GRID_DIMS];
        let mut hi = [0.0f32; MAX_GRID_DIMS];
        if n > 0 {
            lo = [f32::INFINITY; MAX_GRID_DIMS];
            hi = [f32::NEG_INFINITY; MAX_GRID_DIMS];
            for &i in members {
                let p = points.point(i);
                for axis in 0..grid_dims {
                    lo[axis] = lo[axis].min(p[axis]);
                    hi[axis] = hi[axis].max(p[axis]);
                }
            }
            for axis in grid_dims..MAX_GRID_DIMS {
                lo[axis] = 0.0;
                hi[axis] = 0.0;
            }
        }

        // Step 2: Resolution. Cells are roughly cubic over the non-degenerate axes.
        let res = Self::choose_resolution(&lo, &hi, grid_dims, n, target_per_cell);
        let mut cell_size = [0.0f32; MAX_GRID_DIMS];
        let mut inv_cell = [0.0f32; MAX_GRID_DIMS];
        for axis in 0..grid_dims {
            let extent = hi[axis] - lo[axis];
            if extent > 0.0 {
                cell_size[axis] = extent / res[axis] as f32;
                inv_cell[axis] = res[axis] as f32 / extent;
            }
        }

        let mut grid = BoxGrid {
            dim,
            grid_dims,
            res,
            origin: lo,
            cell_size,
            inv_cell,
            cell_offsets: Vec::new(),
            point_indices: Vec::with_capacity(n),
            cell_coords: Vec::with_capacity(n * dim),
        };
        let num_cells = res[0] * res[1] * res[2];

        // Step 3: Classify points into cells.
        let point_cells: Vec<u32> = if n >= PARALLEL_BUILD_MIN {
            maybe_par_iter!(members)
                .map(|&i| grid.cell_id(grid.cell_of_point(points.point(i))) as u32)
                .collect()
        } else {
            members
                .iter()
                .map(|&i| grid.cell_id(grid.cell_of_point(points.point(i))) as u32)
                .collect()
        };

        // Step 4: Count + prefix sum to get offsets.
        let mut cell_counts = vec![0u32; num_cells];
        for &cell in &point_cells {
            cell_counts[cell as usize] += 1;
        }
        let mut cell_offsets = Vec::with_capacity(num_cells + 1);
        cell_offsets.push(0);
        let mut sum = 0u32;
        for &count in &cell_counts {
            sum += count;
            cell_offsets.push(sum);
        }
        debug_assert_eq!(cell_offsets[num_cells] as usize, n, "prefix sum mismatch");

        // Step 5: Stable sort of members by cell, then a linear copy in that order.
        // Stability keeps point indices ascending inside each cell.
        let mut sorted_order: Vec<u32> = (0..n as u32).collect();
        #[cfg(feature = "parallel")]
        sorted_order.par_sort_by_key(|&i| point_cells[i as usize]);
        #[cfg(not(feature = "parallel"))]
        sorted_order.sort_by_key(|&i| point_cells[i as usize]);

        for &local in &sorted_order {
            let global = members[local as usize];
            grid.point_indices.push(global);
            grid.cell_coords.extend_from_slice(points.point(global));
        }
        grid.cell_offsets = cell_offsets;

        log::trace!(
            "BoxGrid::new: {} points, res {:?}, {} cells",
            n,
            grid.res,
            num_cells
        );

        grid
    }

    fn choose_resolution(
        lo: &[f32; MAX_GRID_DIMS],
        hi: &[f32; MAX_GRID_DIMS],
        grid_dims: usize,
        n: usize,
        target_per_cell: f64,
    ) -> [usize; MAX_GRID_DIMS] {
        let mut res = [1usize; MAX_GRID_DIMS];

        let live: Vec<usize> = (0..grid_dims).filter(|&a| hi[a] > lo[a]).collect();
        if live.is_empty() || n == 0 {
            return res;
        }

        let target_cells = (n as f64 / target_per_cell.max(1.0)).max(1.0);
        let volume: f64 = live.iter().map(|&a| (hi[a] - lo[a]) as f64).product();
        let side = (volume / target_cells).powf(1.0 / live.len() as f64);
        if !(side.is_finite() && side > 0.0) {
            return res;
        }

        for &axis in &live {
            let extent = (hi[axis] - lo[axis]) as f64;
            let cells = (extent / side).ceil();
            res[axis] = if cells.is_finite() {
                (cells as usize).clamp(1, MAX_RES_PER_AXIS)
            } else {
                1
            };
        }
        res
    }
}
