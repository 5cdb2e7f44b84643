//! Core point and neighbour-pair types.

use bytemuck::{Pod, Zeroable};

use crate::error::NeighbourError;

/// A 3D point with a stable `#[repr(C)]` layout.
///
/// Slices of `Point3` can be reinterpreted as flat coordinate buffers without
/// copying, which is how [`PointSet::from_point3s`] ingests them.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<[f32; 3]> for Point3 {
    #[inline]
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Point3> for [f32; 3] {
    #[inline]
    fn from(p: Point3) -> Self {
        [p.x, p.y, p.z]
    }
}

/// Trait for 3D types that can be used as input points.
pub trait PointLike {
    fn x(&self) -> f32;
    fn y(&self) -> f32;
    fn z(&self) -> f32;
}

impl PointLike for Point3 {
    #[inline]
    fn x(&self) -> f32 {
        self.x
    }
    #[inline]
    fn y(&self) -> f32 {
        self.y
    }
    #[inline]
    fn z(&self) -> f32 {
        self.z
    }
}

impl PointLike for [f32; 3] {
    #[inline]
    fn x(&self) -> f32 {
        self[0]
    }
    #[inline]
    fn y(&self) -> f32 {
        self[1]
    }
    #[inline]
    fn z(&self) -> f32 {
        self[2]
    }
}

impl PointLike for (f32, f32, f32) {
    #[inline]
    fn x(&self) -> f32 {
        self.0
    }
    #[inline]
    fn y(&self) -> f32 {
        self.1
    }
    #[inline]
    fn z(&self) -> f32 {
        self.2
    }
}

#[cfg(feature = "glam")]
impl PointLike for glam::Vec3 {
    #[inline]
    fn x(&self) -> f32 {
        self.x
    }
    #[inline]
    fn y(&self) -> f32 {
        self.y
    }
    #[inline]
    fn z(&self) -> f32 {
        self.z
    }
}

/// An ordered set of N points with D coordinates each, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    coords: Vec<f32>,
    dim: usize,
}

impl PointSet {
    /// Wrap a flat row-major coordinate buffer.
    ///
    /// Fails if `dim` is zero, if the buffer is not a whole number of rows, or
    /// if any coordinate is NaN or infinite.
    pub fn new(coords: Vec<f32>, dim: usize) -> Result<Self, NeighbourError> {
        if dim == 0 {
            return Err(NeighbourError::InvalidPoints(
                "dimension must be at least 1".to_string(),
            ));
        }
        if coords.len() % dim != 0 {
            return Err(NeighbourError::InvalidPoints(format!(
                "{} coordinates do not form rows of dimension {}",
                coords.len(),
                dim
            )));
        }
        if let Some(pos) = coords.iter().position(|c| !c.is_finite()) {
            return Err(NeighbourError::InvalidPoints(format!(
                "non-finite coordinate in point {}",
                pos / dim
            )));
        }
        Ok(Self { coords, dim })
    }

    /// Build from fixed-size rows.
    pub fn from_rows<const D: usize>(rows: &[[f32; D]]) -> Result<Self, NeighbourError> {
        let flat: &[f32] = bytemuck::cast_slice(rows);
        Self::new(flat.to_vec(), D)
    }

    /// Build from a slice of [`Point3`] without per-point conversion.
    pub fn from_point3s(points: &[Point3]) -> Result<Self, NeighbourError> {
        let flat: &[f32] = bytemuck::cast_slice(points);
        Self::new(flat.to_vec(), 3)
    }

    /// Build from any 3D point type.
    pub fn from_points<P: PointLike>(points: &[P]) -> Result<Self, NeighbourError> {
        let mut coords = Vec::with_capacity(points.len() * 3);
        for p in points {
            coords.extend_from_slice(&[p.x(), p.y(), p.z()]);
        }
        Self::new(coords, 3)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len() / self.dim
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Coordinates of point `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx >= self.len()`.
    #[inline]
    pub fn point(&self, idx: usize) -> &[f32] {
        let start = idx * self.dim;
        &self.coords[start..start + self.dim]
    }

    #[inline]
    pub fn as_flat(&self) -> &[f32] {
        &self.coords
    }

    /// Squared Euclidean distance between point `i` of `self` and point `j` of `other`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range, or if the dimensions differ in
    /// debug builds.
    #[inline]
    pub fn dist_sq(&self, i: usize, other: &PointSet, j: usize) -> f32 {
        dist_sq(self.point(i), other.point(j))
    }

    /// Gather the points at `indices` into a new set (e.g. the output of a sampler).
    pub fn select(&self, indices: &[usize]) -> Result<PointSet, NeighbourError> {
        let len = self.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(NeighbourError::IndexOutOfRange { index, len });
        }
        let mut coords = Vec::with_capacity(indices.len() * self.dim);
        for &i in indices {
            coords.extend_from_slice(self.point(i));
        }
        Ok(PointSet {
            coords,
            dim: self.dim,
        })
    }
}

#[cfg(feature = "glam")]
impl TryFrom<&[glam::Vec3]> for PointSet {
    type Error = NeighbourError;

    fn try_from(points: &[glam::Vec3]) -> Result<Self, Self::Error> {
        let mut coords = Vec::with_capacity(points.len() * 3);
        for p in points {
            coords.extend_from_slice(&p.to_array());
        }
        PointSet::new(coords, 3)
    }
}

#[inline(always)]
pub(crate) fn dist_sq(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Neighbour pairs grouped by query.
///
/// Entry `i` of [`reference`](Self::reference) / [`query`](Self::query) means
/// "reference point `reference[i]` is a neighbour of query point `query[i]`".
/// Pairs are stored query-major, with `offsets` delimiting each query's block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighbourPairs {
    reference: Vec<usize>,
    query: Vec<usize>,
    /// `offsets[q]..offsets[q + 1]` is the block of query `q`. Length: num_queries + 1.
    offsets: Vec<usize>,
}

impl NeighbourPairs {
    pub(crate) fn with_capacity(num_queries: usize, pairs: usize) -> Self {
        let mut offsets = Vec::with_capacity(num_queries + 1);
        offsets.push(0);
        Self {
            reference: Vec::with_capacity(pairs),
            query: Vec::with_capacity(pairs),
            offsets,
        }
    }

    /// Append the block of the next query. Queries must be pushed in order.
    pub(crate) fn push_block(&mut self, refs: &[usize]) {
        let q = self.offsets.len() - 1;
        self.reference.extend_from_slice(refs);
        self.query.extend(std::iter::repeat(q).take(refs.len()));
        self.offsets.push(self.reference.len());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.reference.is_empty()
    }

    /// Number of query points the pairs were computed for (including those
    /// without neighbours).
    #[inline]
    pub fn num_queries(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    #[inline]
    pub fn reference(&self) -> &[usize] {
        &self.reference
    }

    #[inline]
    pub fn query(&self) -> &[usize] {
        &self.query
    }

    /// Reference indices paired with query `q`.
    ///
    /// # Panics
    ///
    /// Panics if `q >= self.num_queries()`.
    #[inline]
    pub fn neighbours_of(&self, q: usize) -> &[usize] {
        &self.reference[self.offsets[q]..self.offsets[q + 1]]
    }

    /// Number of pairs for each query.
    pub fn count_per_query(&self) -> Vec<usize> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Iterate `(reference, query)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.reference.iter().copied().zip(self.query.iter().copied())
    }

    /// Split into `(reference_indices, query_indices)`.
    pub fn into_parts(self) -> (Vec<usize>, Vec<usize>) {
        (self.reference, self.query)
    }
}
