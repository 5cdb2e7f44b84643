//! Radius search over an ordered list of scales.

use super::RadiusFinder;
use crate::error::NeighbourError;
use crate::search::BatchedGrid;
use crate::types::{NeighbourPairs, PointSet};

/// A per-scale parameter: one value shared by every scale, or one per scale.
#[derive(Debug, Clone, PartialEq)]
pub enum ScaleList<T> {
    Single(T),
    PerScale(Vec<T>),
}

macro_rules! impl_scale_list_from {
    ($($t:ty),*) => {$(
        impl From<$t> for ScaleList<$t> {
            fn from(v: $t) -> Self {
                ScaleList::Single(v)
            }
        }

        impl From<Vec<$t>> for ScaleList<$t> {
            fn from(v: Vec<$t>) -> Self {
                ScaleList::PerScale(v)
            }
        }

        impl From<&[$t]> for ScaleList<$t> {
            fn from(v: &[$t]) -> Self {
                ScaleList::PerScale(v.to_vec())
            }
        }

        impl<const N: usize> From<[$t; N]> for ScaleList<$t> {
            fn from(v: [$t; N]) -> Self {
                ScaleList::PerScale(v.to_vec())
            }
        }
    )*};
}

impl_scale_list_from!(f32, usize);

/// Pair up radii and caps. A single value is broadcast to the length of the
/// other list; two lists must have equal length.
fn normalize_scales(
    radius: ScaleList<f32>,
    max_num_neighbours: ScaleList<usize>,
) -> Result<Vec<(f32, usize)>, NeighbourError> {
    let pairs: Vec<(f32, usize)> = match (radius, max_num_neighbours) {
        (ScaleList::Single(r), ScaleList::Single(m)) => vec![(r, m)],
        (ScaleList::PerScale(rs), ScaleList::Single(m)) => rs.into_iter().map(|r| (r, m)).collect(),
        (ScaleList::Single(r), ScaleList::PerScale(ms)) => ms.into_iter().map(|m| (r, m)).collect(),
        (ScaleList::PerScale(rs), ScaleList::PerScale(ms)) => {
            if rs.len() != ms.len() {
                return Err(NeighbourError::config(format!(
                    "both lists max_num_neighbours ({}) and radius ({}) should be of the same length",
                    ms.len(),
                    rs.len()
                )));
            }
            rs.into_iter().zip(ms).collect()
        }
    };
    if pairs.is_empty() {
        return Err(NeighbourError::config("at least one scale is required"));
    }
    Ok(pairs)
}

/// Radius finder holding a fixed, ordered list of `(radius, max_num_neighbours)`
/// scales, dispatched by scale index.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiScaleRadiusFinder {
    scales: Vec<RadiusFinder>,
}

impl MultiScaleRadiusFinder {
    /// ```
    /// use point_neighbours::MultiScaleRadiusFinder;
    ///
    /// let finder = MultiScaleRadiusFinder::new(vec![1.0, 2.0], 64).unwrap();
    /// assert_eq!(finder.num_scales(), 2);
    /// assert!(MultiScaleRadiusFinder::new(vec![1.0, 2.0, 3.0], vec![10, 20]).is_err());
    /// ```
    pub fn new(
        radius: impl Into<ScaleList<f32>>,
        max_num_neighbours: impl Into<ScaleList<usize>>,
    ) -> Result<Self, NeighbourError> {
        let scales = normalize_scales(radius.into(), max_num_neighbours.into())?
            .into_iter()
            .map(|(r, m)| RadiusFinder::new(r, m))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { scales })
    }

    #[inline]
    pub fn num_scales(&self) -> usize {
        self.scales.len()
    }

    /// `(radius, max_num_neighbours)` of scale `scale_idx`.
    pub fn scale(&self, scale_idx: usize) -> Result<(f32, usize), NeighbourError> {
        let f = self.finder(scale_idx)?;
        Ok((f.radius(), f.max_num_neighbours()))
    }

    /// The radius finder used for `scale_idx`.
    pub fn finder(&self, scale_idx: usize) -> Result<&RadiusFinder, NeighbourError> {
        self.scales
            .get(scale_idx)
            .ok_or(NeighbourError::ScaleOutOfRange {
                index: scale_idx,
                num_scales: self.scales.len(),
            })
    }

    pub fn find_neighbours(
        &self,
        x: &PointSet,
        y: &PointSet,
        batch_x: &[usize],
        batch_y: &[usize],
        scale_idx: usize,
    ) -> Result<NeighbourPairs, NeighbourError> {
        self.finder(scale_idx)?
            .find_neighbours(x, y, batch_x, batch_y)
    }

    /// Search every scale against one shared index of `x`.
    pub fn find_all_scales(
        &self,
        x: &PointSet,
        y: &PointSet,
        batch_x: &[usize],
        batch_y: &[usize],
    ) -> Result<Vec<NeighbourPairs>, NeighbourError> {
        let index = BatchedGrid::build(x, batch_x)?;
        self.scales
            .iter()
            .map(|f| f.find_neighbours_in(&index, y, batch_y))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_radius_list() {
        let f = MultiScaleRadiusFinder::new(vec![0.5, 1.0, 2.0], 32).unwrap();
        assert_eq!(f.num_scales(), 3);
        assert_eq!(f.scale(2).unwrap(), (2.0, 32));
    }

    #[test]
    fn test_broadcast_cap_list() {
        let f = MultiScaleRadiusFinder::new(0.75, [8, 16]).unwrap();
        assert_eq!(f.num_scales(), 2);
        assert_eq!(f.scale(0).unwrap(), (0.75, 8));
        assert_eq!(f.scale(1).unwrap(), (0.75, 16));
    }

    #[test]
    fn test_both_scalar() {
        let f = MultiScaleRadiusFinder::new(1.0, 64).unwrap();
        assert_eq!(f.num_scales(), 1);
    }

    #[test]
    fn test_both_lists_equal_length() {
        let f = MultiScaleRadiusFinder::new([1.0, 2.0], vec![10, 20]).unwrap();
        assert_eq!(f.scale(1).unwrap(), (2.0, 20));
    }

    #[test]
    fn test_length_mismatch() {
        let err = MultiScaleRadiusFinder::new(vec![1.0, 2.0, 3.0], vec![10, 20]).unwrap_err();
        assert!(matches!(err, NeighbourError::Configuration(_)));
    }

    #[test]
    fn test_empty_lists() {
        assert!(MultiScaleRadiusFinder::new(Vec::<f32>::new(), 64).is_err());
        assert!(MultiScaleRadiusFinder::new(1.0, Vec::<usize>::new()).is_err());
    }

    #[test]
    fn test_invalid_scale_values() {
        assert!(MultiScaleRadiusFinder::new(vec![1.0, -2.0], 64).is_err());
        assert!(MultiScaleRadiusFinder::new(1.0, vec![4, 0]).is_err());
    }

    #[test]
    fn test_scale_out_of_range() {
        let f = MultiScaleRadiusFinder::new(vec![1.0, 2.0], 64).unwrap();
        assert_eq!(
            f.scale(2).unwrap_err(),
            NeighbourError::ScaleOutOfRange {
                index: 2,
                num_scales: 2
            }
        );
    }
}
