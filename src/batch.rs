//! Batch membership of stacked point clouds.

use rustc_hash::FxHashMap;

use crate::error::NeighbourError;

/// Points of one batch element, in ascending point order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchGroup {
    pub id: usize,
    pub indices: Vec<usize>,
}

impl BatchGroup {
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A validated batch vector, grouped by batch id.
///
/// Ids do not have to be sorted or contiguous. Groups are exposed in ascending
/// id order and each group lists its points in ascending index order.
#[derive(Debug, Clone)]
pub struct BatchIndex {
    ids: Vec<usize>,
    groups: Vec<BatchGroup>,
    /// Batch id -> position in `groups`.
    lookup: FxHashMap<usize, usize>,
}

impl BatchIndex {
    /// Group `batch` (one id per point) for a set of `num_points` points.
    pub fn new(batch: &[usize], num_points: usize) -> Result<Self, NeighbourError> {
        if batch.len() != num_points {
            return Err(NeighbourError::BatchLengthMismatch {
                points: num_points,
                batch: batch.len(),
            });
        }

        let mut by_id: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
        for (i, &id) in batch.iter().enumerate() {
            by_id.entry(id).or_default().push(i);
        }

        let mut groups: Vec<BatchGroup> = by_id
            .into_iter()
            .map(|(id, indices)| BatchGroup { id, indices })
            .collect();
        groups.sort_unstable_by_key(|g| g.id);

        let lookup = groups
            .iter()
            .enumerate()
            .map(|(pos, g)| (g.id, pos))
            .collect();

        Ok(Self {
            ids: batch.to_vec(),
            groups,
            lookup,
        })
    }

    /// All points in batch 0.
    pub fn single(num_points: usize) -> Self {
        let ids = vec![0; num_points];
        let mut lookup = FxHashMap::default();
        let groups = if num_points == 0 {
            Vec::new()
        } else {
            lookup.insert(0, 0);
            vec![BatchGroup {
                id: 0,
                indices: (0..num_points).collect(),
            }]
        };
        Self {
            ids,
            groups,
            lookup,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn num_batches(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn groups(&self) -> &[BatchGroup] {
        &self.groups
    }

    /// Batch id of point `idx`.
    #[inline]
    pub fn id_of(&self, idx: usize) -> usize {
        self.ids[idx]
    }

    /// Position of batch `id` in [`groups`](Self::groups), if it has any points.
    #[inline]
    pub fn position_of(&self, id: usize) -> Option<usize> {
        self.lookup.get(&id).copied()
    }

    #[inline]
    pub fn group(&self, id: usize) -> Option<&BatchGroup> {
        self.position_of(id).map(|pos| &self.groups[pos])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch() {
        let err = BatchIndex::new(&[0, 0, 1], 4).unwrap_err();
        assert_eq!(
            err,
            NeighbourError::BatchLengthMismatch {
                points: 4,
                batch: 3
            }
        );
    }

    #[test]
    fn test_groups_sorted_by_id() {
        let idx = BatchIndex::new(&[2, 0, 2, 5, 0], 5).unwrap();
        let ids: Vec<usize> = idx.groups().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![0, 2, 5]);
        assert_eq!(idx.group(0).unwrap().indices, vec![1, 4]);
        assert_eq!(idx.group(2).unwrap().indices, vec![0, 2]);
        assert!(idx.group(1).is_none());
        assert_eq!(idx.id_of(3), 5);
    }

    #[test]
    fn test_single() {
        let idx = BatchIndex::single(4);
        assert_eq!(idx.num_batches(), 1);
        assert_eq!(idx.group(0).unwrap().len(), 4);
        assert_eq!(BatchIndex::single(0).num_batches(), 0);
    }
}
