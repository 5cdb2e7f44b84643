//! Point subset selection.
//!
//! A sampler is configured with either an exact number of points or a ratio of
//! the input size, never both. [`Sampler`] is the single dispatch point over
//! the available policies.

mod fps;

pub use fps::{FarthestPointSampler, FpsStart};

use rand::Rng;

use crate::error::NeighbourError;
use crate::types::PointSet;

/// How many points a sampler selects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleSize {
    /// Exactly this many points, whatever the input size.
    Count(usize),
    /// `floor(n * ratio)` points for an input of `n` points. Must be in `(0, 1]`.
    Ratio(f64),
}

impl SampleSize {
    /// Resolve optional `ratio` / `num_to_sample` arguments.
    ///
    /// Exactly one of the two must be set.
    pub fn from_options(
        ratio: Option<f64>,
        num_to_sample: Option<usize>,
    ) -> Result<Self, NeighbourError> {
        match (ratio, num_to_sample) {
            (Some(_), Some(_)) => Err(NeighbourError::config(
                "can only specify ratio or num_to_sample, not both",
            )),
            (None, None) => Err(NeighbourError::config(
                "one of ratio or num_to_sample is required",
            )),
            (Some(r), None) => SampleSize::Ratio(r).validated(),
            (None, Some(c)) => SampleSize::Count(c).validated(),
        }
    }

    /// Check the value is usable: a positive count, or a ratio in `(0, 1]`.
    pub fn validated(self) -> Result<Self, NeighbourError> {
        match self {
            SampleSize::Count(0) => Err(NeighbourError::config(
                "num_to_sample must be at least 1",
            )),
            SampleSize::Ratio(r) if !(r > 0.0 && r <= 1.0) => Err(NeighbourError::config(
                format!("ratio must be in (0, 1], got {}", r),
            )),
            ok => Ok(ok),
        }
    }

    /// Number of points to select from an input of `n` points.
    #[inline]
    pub fn num_to_sample(&self, n: usize) -> usize {
        match *self {
            SampleSize::Count(c) => c,
            SampleSize::Ratio(r) => (n as f64 * r).floor() as usize,
        }
    }

    /// Fraction of an input of `n` points that will be selected.
    #[inline]
    pub fn ratio_to_sample(&self, n: usize) -> f64 {
        match *self {
            SampleSize::Ratio(r) => r,
            SampleSize::Count(_) if n == 0 => 0.0,
            SampleSize::Count(c) => c as f64 / n as f64,
        }
    }
}

/// Uniform random draws over the whole point set, with replacement.
///
/// The batch vector is length-checked but does not partition the draw: a
/// sample can land in any batch element, and one batch element may receive
/// none. Use [`FarthestPointSampler`] for per-batch selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomSampler {
    size: SampleSize,
}

impl RandomSampler {
    pub fn new(size: SampleSize) -> Result<Self, NeighbourError> {
        Ok(Self {
            size: size.validated()?,
        })
    }

    #[inline]
    pub fn size(&self) -> SampleSize {
        self.size
    }

    pub fn sample<R: Rng + ?Sized>(
        &self,
        points: &PointSet,
        batch: &[usize],
        rng: &mut R,
    ) -> Result<Vec<usize>, NeighbourError> {
        let n = points.len();
        if batch.len() != n {
            return Err(NeighbourError::BatchLengthMismatch {
                points: n,
                batch: batch.len(),
            });
        }
        let count = self.size.num_to_sample(n);
        if count == 0 {
            return Ok(Vec::new());
        }
        if n == 0 {
            return Err(NeighbourError::EmptyInput);
        }
        log::debug!("RandomSampler: drawing {} of {} points", count, n);
        Ok((0..count).map(|_| rng.gen_range(0..n)).collect())
    }
}

/// Sampling policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sampler {
    FarthestPoint(FarthestPointSampler),
    Random(RandomSampler),
}

impl Sampler {
    /// Farthest-point sampler seeded at the first point of each batch element.
    pub fn farthest_point(size: SampleSize) -> Result<Self, NeighbourError> {
        Ok(Sampler::FarthestPoint(FarthestPointSampler::new(size)?))
    }

    pub fn random(size: SampleSize) -> Result<Self, NeighbourError> {
        Ok(Sampler::Random(RandomSampler::new(size)?))
    }

    #[inline]
    pub fn size(&self) -> SampleSize {
        match self {
            Sampler::FarthestPoint(s) => s.size(),
            Sampler::Random(s) => s.size(),
        }
    }

    /// Select indices into `points`. `batch` holds one batch id per point.
    ///
    /// The RNG is only consumed by random policies.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        points: &PointSet,
        batch: &[usize],
        rng: &mut R,
    ) -> Result<Vec<usize>, NeighbourError> {
        match self {
            Sampler::FarthestPoint(s) => s.sample_with_rng(points, batch, rng),
            Sampler::Random(s) => s.sample(points, batch, rng),
        }
    }
}
