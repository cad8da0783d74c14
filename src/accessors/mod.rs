pub mod accessor;
pub mod backend;
pub mod composed;
pub mod dynamic;
pub mod history;
pub mod iteration;

pub use accessor::{SlicePlane, VoxelAccess, VoxelAccessor};
pub use backend::VoxelBackend;
pub use composed::PlaneComposition;
pub use dynamic::DynamicVoxelAccessor;
pub use history::{DiffStore, DiffStoreKind, HistoryBackend, HistoryConfig, SharedVoxels};
pub use iteration::{ForEachOptions, VoxelPoint};
