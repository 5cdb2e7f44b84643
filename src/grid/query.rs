//! Query helpers for BoxGrid.

use super::{BoxGrid, GridScratch, MAX_GRID_DIMS};
use crate::types::dist_sq;

impl BoxGrid {
    /// Find the `k` nearest stored points to `query`.
    ///
    /// Writes `(dist_sq, global_index)` into `out`, nearest first, ties broken
    /// by ascending index. Fewer than `k` entries are written when the grid
    /// holds fewer than `k` points.
    pub fn knn_into(
        &self,
        query: &[f32],
        k: usize,
        scratch: &mut GridScratch,
        out: &mut Vec<(f32, usize)>,
    ) {
        out.clear();
        if k == 0 || self.num_points() == 0 {
            return;
        }
        debug_assert_eq!(query.len(), self.dim);

        scratch.begin_query(self.num_cells());

        let start = self.cell_of_point(query);
        let start_id = self.cell_id(start) as u32;
        scratch.mark_visited(start_id);
        scratch.push_cell(start_id, self.cell_bound_dist_sq(query, start));

        while let Some((bound, cell)) = scratch.pop_cell() {
            if let Some(worst) = scratch.kth_dist_sq(k) {
                if bound > worst {
                    break;
                }
            }

            let (indices, coords) = self.cell_slice(cell as usize);
            for (&idx, p) in indices.iter().zip(coords.chunks_exact(self.dim)) {
                scratch.try_add(k, dist_sq(query, p), idx);
            }

            self.push_neighbour_cells(query, cell as usize, k, scratch);
        }

        out.extend(scratch.best.drain().map(|(d, idx)| (d.get(), idx)));
        out.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    }

    /// Push the unvisited 3^d neighbourhood of `cell` onto the cell heap.
    fn push_neighbour_cells(&self, query: &[f32], cell: usize, k: usize, scratch: &mut GridScratch) {
        let c = self.cell_coords_of(cell);
        let mut lo = [0usize; MAX_GRID_DIMS];
        let mut hi = [0usize; MAX_GRID_DIMS];
        for axis in 0..MAX_GRID_DIMS {
            lo[axis] = c[axis].saturating_sub(1);
            hi[axis] = (c[axis] + 1).min(self.res[axis] - 1);
        }

        for z in lo[2]..=hi[2] {
            for y in lo[1]..=hi[1] {
                for x in lo[0]..=hi[0] {
                    let nc = [x, y, z];
                    let id = self.cell_id(nc) as u32;
                    if !scratch.mark_visited(id) {
                        continue;
                    }
                    let bound = self.cell_bound_dist_sq(query, nc);
                    if let Some(worst) = scratch.kth_dist_sq(k) {
                        // The k-th distance only shrinks, so this cell can never matter.
                        if bound > worst {
                            continue;
                        }
                    }
                    scratch.push_cell(id, bound);
                }
            }
        }
    }

    /// Find all stored points within `radius` of `query` (inclusive).
    ///
    /// Writes global indices into `out` in ascending order. When more than
    /// `max_results` points qualify, only the `max_results` lowest indices are
    /// kept.
    pub fn within_radius_into(
        &self,
        query: &[f32],
        radius: f32,
        max_results: usize,
        out: &mut Vec<usize>,
    ) {
        out.clear();
        if max_results == 0 || self.num_points() == 0 {
            return;
        }
        debug_assert_eq!(query.len(), self.dim);

        let r_sq = radius * radius;
        let mut lo = [0usize; MAX_GRID_DIMS];
        let mut hi = [0usize; MAX_GRID_DIMS];
        // Ranges are clamped into the grid and padded by the same slack as
        // `cell_bound_dist_sq`; cells outside the ball are pruned below.
        for axis in 0..self.grid_dims {
            let reach = radius + self.cell_size[axis] * 1e-4;
            lo[axis] = self.axis_cell(axis, query[axis] - reach);
            hi[axis] = self.axis_cell(axis, query[axis] + reach);
        }

        for z in lo[2]..=hi[2] {
            for y in lo[1]..=hi[1] {
                for x in lo[0]..=hi[0] {
                    let nc = [x, y, z];
                    if self.cell_bound_dist_sq(query, nc) > r_sq {
                        continue;
                    }
                    let (indices, coords) = self.cell_slice(self.cell_id(nc));
                    for (&idx, p) in indices.iter().zip(coords.chunks_exact(self.dim)) {
                        if dist_sq(query, p) <= r_sq {
                            out.push(idx);
                        }
                    }
                }
            }
        }

        out.sort_unstable();
        out.truncate(max_results);
    }
}
