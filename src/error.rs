//! Error types for voxel access.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VoxelError>;

/// Errors reported by the checked voxel access paths.
///
/// Missing backing data in a composed volume is not an error: reads return
/// `None` and writes return `false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoxelError {
    /// An IJK coordinate outside the volume dimensions.
    #[error("coordinate ({i}, {j}, {k}) is outside dimensions {width}x{height}x{depth}")]
    InvalidCoordinate {
        i: usize,
        j: usize,
        k: usize,
        width: usize,
        height: usize,
        depth: usize,
    },

    /// A linear index outside `[0, voxel_count)`.
    #[error("index {index} is outside [0, {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// Slice extraction along an axis other than 0, 1 or 2.
    #[error("unsupported slice axis {0}, expected 0, 1 or 2")]
    UnsupportedAxis(u8),

    /// The flood fill seed is not covered by any run.
    #[error("flood fill seed ({i}, {j}, {k}) is not covered by any run")]
    FloodFillSeedMissing { i: usize, j: usize, k: usize },

    /// The flood fill value equals the value at the seed.
    #[error("flood fill source and destination values are identical")]
    FloodFillSameValue,

    /// A bulk buffer whose length does not match the volume.
    #[error("buffer holds {actual} elements, expected {expected}")]
    BufferLength { expected: usize, actual: usize },

    /// A time point outside a dynamic volume.
    #[error("time point {time_point} is outside [0, {count})")]
    TimePointOutOfRange { time_point: usize, count: usize },
}
