//! Error types for sampling and neighbour search.

use std::fmt;

/// Errors that can occur while configuring or running samplers and finders.
#[derive(Debug, Clone, PartialEq)]
pub enum NeighbourError {
    /// Invalid construction parameters (mutually exclusive options, bad ratios,
    /// mismatched per-scale lists, ...). Raised before any search runs.
    Configuration(String),

    /// A multi-scale finder was asked for a scale it does not have.
    ScaleOutOfRange { index: usize, num_scales: usize },

    /// A query has fewer same-batch candidates than the dilated finder needs.
    NeighbourShortage {
        query: usize,
        available: usize,
        required: usize,
    },

    /// A batch vector does not have one entry per point.
    BatchLengthMismatch { points: usize, batch: usize },

    /// Reference and query points do not share a dimension.
    DimensionMismatch { expected: usize, found: usize },

    /// Coordinate data is malformed (ragged rows, non-finite values, zero dimension).
    InvalidPoints(String),

    /// A non-empty selection was requested from an empty point set.
    EmptyInput,

    /// A point index does not address a point of the set.
    IndexOutOfRange { index: usize, len: usize },
}

impl NeighbourError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        NeighbourError::Configuration(msg.into())
    }
}

impl fmt::Display for NeighbourError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeighbourError::Configuration(msg) => write!(f, "invalid configuration: {}", msg),
            NeighbourError::ScaleOutOfRange { index, num_scales } => {
                write!(f, "scale {} is out of bounds {}", index, num_scales)
            }
            NeighbourError::NeighbourShortage {
                query,
                available,
                required,
            } => {
                write!(
                    f,
                    "query {} has {} candidate neighbours, {} required",
                    query, available, required
                )
            }
            NeighbourError::BatchLengthMismatch { points, batch } => {
                write!(
                    f,
                    "batch vector has {} entries for {} points",
                    batch, points
                )
            }
            NeighbourError::DimensionMismatch { expected, found } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, found {}",
                    expected, found
                )
            }
            NeighbourError::InvalidPoints(msg) => write!(f, "invalid points: {}", msg),
            NeighbourError::EmptyInput => write!(f, "cannot sample from an empty point set"),
            NeighbourError::IndexOutOfRange { index, len } => {
                write!(f, "point index {} is out of range for {} points", index, len)
            }
        }
    }
}

impl std::error::Error for NeighbourError {}
