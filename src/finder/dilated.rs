//! Dilated k-nearest neighbours: a random k-subset of the k * dilation nearest.

use rand::Rng;

use super::KnnFinder;
use crate::error::NeighbourError;
use crate::types::{NeighbourPairs, PointSet};

/// What to do with a query that has fewer than `k * dilation` candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortBlockPolicy {
    /// Fail with [`NeighbourError::NeighbourShortage`].
    #[default]
    Error,
    /// Draw from the candidates the query does have: `k` picks, or one per
    /// candidate when it has fewer than `k`. A query with no candidates gets
    /// no pairs.
    Clamp,
}

/// For every query, `k` draws (uniform, with replacement) from its
/// `k * dilation` nearest same-batch reference points.
#[derive(Debug, Clone, PartialEq)]
pub struct DilatedKnnFinder {
    k: usize,
    dilation: usize,
    policy: ShortBlockPolicy,
    candidates: KnnFinder,
}

impl DilatedKnnFinder {
    pub fn new(k: usize, dilation: usize) -> Result<Self, NeighbourError> {
        if k == 0 {
            return Err(NeighbourError::config("k must be at least 1"));
        }
        if dilation == 0 {
            return Err(NeighbourError::config("dilation must be at least 1"));
        }
        let pool = k
            .checked_mul(dilation)
            .ok_or_else(|| NeighbourError::config("k * dilation overflows"))?;
        Ok(Self {
            k,
            dilation,
            policy: ShortBlockPolicy::default(),
            candidates: KnnFinder::new(pool)?,
        })
    }

    pub fn with_policy(mut self, policy: ShortBlockPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn dilation(&self) -> usize {
        self.dilation
    }

    #[inline]
    pub fn policy(&self) -> ShortBlockPolicy {
        self.policy
    }

    pub fn find_neighbours<R: Rng + ?Sized>(
        &self,
        x: &PointSet,
        y: &PointSet,
        batch_x: &[usize],
        batch_y: &[usize],
        rng: &mut R,
    ) -> Result<NeighbourPairs, NeighbourError> {
        let candidates = self.candidates.find_neighbours(x, y, batch_x, batch_y)?;
        let pool = self.candidates.k();
        let num_queries = candidates.num_queries();

        if self.policy == ShortBlockPolicy::Error {
            if let Some((query, available)) = candidates
                .count_per_query()
                .into_iter()
                .enumerate()
                .find(|&(_, count)| count < pool)
            {
                return Err(NeighbourError::NeighbourShortage {
                    query,
                    available,
                    required: pool,
                });
            }
        }

        // Never more picks per query than candidates; only reachable under Clamp.
        let capacity = num_queries
            .saturating_mul(self.k)
            .min(candidates.len());
        let mut pairs = NeighbourPairs::with_capacity(num_queries, capacity);
        let mut picks = Vec::new();
        for q in 0..num_queries {
            let block = candidates.neighbours_of(q);
            picks.clear();
            if !block.is_empty() {
                // Draws index the query's own block only.
                let span = block.len().min(pool);
                let draws = self.k.min(span);
                picks.extend((0..draws).map(|_| block[rng.gen_range(0..span)]));
            }
            pairs.push_block(&picks);
        }

        log::debug!(
            "DilatedKnnFinder(k={}, dilation={}): {} pairs for {} queries",
            self.k,
            self.dilation,
            pairs.len(),
            num_queries
        );
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn line(n: usize) -> PointSet {
        PointSet::new((0..n).map(|i| i as f32).collect(), 1).unwrap()
    }

    #[test]
    fn test_invalid_construction() {
        assert!(DilatedKnnFinder::new(0, 2).is_err());
        assert!(DilatedKnnFinder::new(2, 0).is_err());
        assert!(DilatedKnnFinder::new(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_picks_come_from_pool() {
        let x = line(50);
        let y = PointSet::new(vec![25.0], 1).unwrap();
        let finder = DilatedKnnFinder::new(3, 2).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let pairs = finder
            .find_neighbours(&x, &y, &[0; 50], &[0], &mut rng)
            .unwrap();
        assert_eq!(pairs.len(), 3);
        // Six nearest of 25: 22..=27, the tie at distance 3 goes to the lower index.
        for &r in pairs.reference() {
            assert!((22..=27).contains(&r), "reference {} outside pool", r);
        }
    }

    #[test]
    fn test_shortage_errors_by_default() {
        let x = line(5);
        let y = PointSet::new(vec![0.0, 1.0], 1).unwrap();
        let finder = DilatedKnnFinder::new(2, 3).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let err = finder
            .find_neighbours(&x, &y, &[0; 5], &[0, 0], &mut rng)
            .unwrap_err();
        assert_eq!(
            err,
            NeighbourError::NeighbourShortage {
                query: 0,
                available: 5,
                required: 6
            }
        );
    }

    #[test]
    fn test_clamp_stays_in_own_block() {
        // Batch 0 has 2 references, batch 1 has 10.
        let x = line(12);
        let batch_x = [0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1];
        let y = PointSet::new(vec![0.5, 6.0, 100.0], 1).unwrap();
        let batch_y = [0, 1, 7];
        let finder = DilatedKnnFinder::new(2, 2)
            .unwrap()
            .with_policy(ShortBlockPolicy::Clamp);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let pairs = finder
            .find_neighbours(&x, &y, &batch_x, &batch_y, &mut rng)
            .unwrap();
        assert_eq!(pairs.count_per_query(), vec![2, 2, 0]);
        assert!(pairs.neighbours_of(0).iter().all(|&r| r < 2));
        assert!(pairs.neighbours_of(1).iter().all(|&r| r >= 2));
    }
}
