//! Farthest-point sampling, run independently per batch element.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use rand::Rng;

use super::SampleSize;
use crate::batch::{BatchGroup, BatchIndex};
use crate::error::NeighbourError;
use crate::types::{dist_sq, PointSet};

/// How the greedy loop picks its first point in each batch element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FpsStart {
    /// The lowest-index point of the batch element.
    #[default]
    First,
    /// A uniformly random point of the batch element, drawn from the caller's RNG.
    Random,
}

/// Greedy farthest-point sampler.
///
/// Each selected point is the one farthest (in Euclidean distance) from all
/// points already selected in its batch element. The requested total is
/// split across batch elements in proportion to their size, so the output
/// always has exactly the resolved number of indices. Output is grouped by
/// ascending batch id, in selection order within a batch element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FarthestPointSampler {
    size: SampleSize,
    start: FpsStart,
}

impl FarthestPointSampler {
    pub fn new(size: SampleSize) -> Result<Self, NeighbourError> {
        Ok(Self {
            size: size.validated()?,
            start: FpsStart::First,
        })
    }

    pub fn with_start(mut self, start: FpsStart) -> Self {
        self.start = start;
        self
    }

    #[inline]
    pub fn size(&self) -> SampleSize {
        self.size
    }

    #[inline]
    pub fn start(&self) -> FpsStart {
        self.start
    }

    /// Deterministic sampling. Fails with a configuration error if the start
    /// policy needs an RNG; use [`sample_with_rng`](Self::sample_with_rng) then.
    pub fn sample(&self, points: &PointSet, batch: &[usize]) -> Result<Vec<usize>, NeighbourError> {
        if self.start == FpsStart::Random {
            return Err(NeighbourError::config(
                "random start requires an RNG, use sample_with_rng",
            ));
        }
        self.sample_impl(points, batch, |_| 0)
    }

    pub fn sample_with_rng<R: Rng + ?Sized>(
        &self,
        points: &PointSet,
        batch: &[usize],
        rng: &mut R,
    ) -> Result<Vec<usize>, NeighbourError> {
        match self.start {
            FpsStart::First => self.sample_impl(points, batch, |_| 0),
            FpsStart::Random => self.sample_impl(points, batch, |len| rng.gen_range(0..len)),
        }
    }

    fn sample_impl<S>(
        &self,
        points: &PointSet,
        batch: &[usize],
        mut pick_start: S,
    ) -> Result<Vec<usize>, NeighbourError>
    where
        S: FnMut(usize) -> usize,
    {
        let index = BatchIndex::new(batch, points.len())?;
        let total = self.size.num_to_sample(points.len());
        if total == 0 {
            return Ok(Vec::new());
        }
        if points.is_empty() {
            return Err(NeighbourError::EmptyInput);
        }

        let quotas = allocate_quotas(total, index.groups());
        log::debug!(
            "FarthestPointSampler: {} of {} points over {} batch elements",
            total,
            points.len(),
            index.num_batches()
        );

        // Starts are drawn up front, in batch order, so the RNG stream does not
        // depend on how the per-batch work is scheduled.
        let jobs: Vec<(&BatchGroup, usize, usize)> = index
            .groups()
            .iter()
            .zip(quotas)
            .filter(|(_, quota)| *quota > 0)
            .map(|(group, quota)| (group, quota, pick_start(group.len())))
            .collect();

        let per_batch: Vec<Vec<usize>> = maybe_par_iter!(jobs)
            .map(|&(group, quota, start)| {
                log::trace!(
                    "FarthestPointSampler: batch {} selects {} of {}",
                    group.id,
                    quota,
                    group.len()
                );
                farthest_point_greedy(points, &group.indices, quota, start)
            })
            .collect();

        Ok(per_batch.into_iter().flatten().collect())
    }
}

/// Split `total` across batch elements proportionally to their size
/// (largest-remainder method, ties to the lower batch id).
pub(crate) fn allocate_quotas(total: usize, groups: &[BatchGroup]) -> Vec<usize> {
    let n: usize = groups.iter().map(BatchGroup::len).sum();
    if n == 0 {
        return vec![0; groups.len()];
    }

    let mut quotas = Vec::with_capacity(groups.len());
    let mut remainders = Vec::with_capacity(groups.len());
    for (pos, group) in groups.iter().enumerate() {
        let share = total as u128 * group.len() as u128;
        quotas.push((share / n as u128) as usize);
        remainders.push((share % n as u128, pos));
    }

    let assigned: usize = quotas.iter().sum();
    let leftover = total - assigned;
    // Largest remainder first; stable sort keeps lower positions first on ties.
    remainders.sort_by(|a, b| b.0.cmp(&a.0));
    for &(_, pos) in remainders.iter().take(leftover) {
        quotas[pos] += 1;
    }
    quotas
}

/// Select `m` of `members` greedily, starting at `members[start]`.
///
/// Returns global indices in selection order. Once every member has been
/// selected all remaining distances are zero and the lowest member repeats.
pub(crate) fn farthest_point_greedy(
    points: &PointSet,
    members: &[usize],
    m: usize,
    start: usize,
) -> Vec<usize> {
    let mut selected = Vec::with_capacity(m);
    if m == 0 || members.is_empty() {
        return selected;
    }

    let mut min_dist = vec![f32::INFINITY; members.len()];
    let mut current = start.min(members.len() - 1);

    for _ in 0..m {
        let chosen = members[current];
        selected.push(chosen);
        let c = points.point(chosen);

        let mut best = 0usize;
        let mut best_dist = f32::NEG_INFINITY;
        for (local, (&idx, d)) in members.iter().zip(min_dist.iter_mut()).enumerate() {
            let dc = dist_sq(c, points.point(idx));
            if dc < *d {
                *d = dc;
            }
            if *d > best_dist {
                best_dist = *d;
                best = local;
            }
        }
        current = best;
    }
    selected
}
