//! Uniform per-voxel access over 3D scalar and vector volumes.
//!
//! A [`VoxelAccessor`] hides its storage (dense, sparse map, run-length
//! encoded, lazily allocated planes, per-plane composition or a history
//! overlay) behind one get/set/iterate/slice contract.

pub mod accessors;
pub mod core;
pub mod error;

pub use accessors::{
    DynamicVoxelAccessor, ForEachOptions, HistoryConfig, PlaneComposition, SlicePlane,
    VoxelAccess, VoxelAccessor, VoxelPoint,
};
pub use error::{Result, VoxelError};

pub mod prelude {
    pub use crate::accessors::*;
    pub use crate::core::bounds::BoundsIjk;
    pub use crate::core::index::{Connectivity, Dimensions, VoxelIndex};
    pub use crate::core::prelude::*;
    pub use crate::core::rle::{FloodFillConfig, Run, RunTable};
    pub use crate::core::transform::WorldTransform;
    pub use crate::core::voxel::{Scalar, ScalarType, Voxel};
    pub use crate::error::{Result, VoxelError};
}

#[cfg(test)]
pub(crate) fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
