use super::composed::PlaneComposition;
use super::history::HistoryBackend;
use crate::core::index::Dimensions;
use crate::core::rle::RunTable;
use crate::core::storage::{DenseStorage, LazyPlaneStorage, SparseMapStorage};
use crate::core::voxel::Voxel;

/// Storage behind a [`super::VoxelAccessor`].
#[derive(Debug, Clone)]
pub enum VoxelBackend<T: Voxel> {
    /// One sample per voxel.
    Dense(DenseStorage<T>),
    /// Only written voxels, keyed by linear index.
    SparseMap(SparseMapStorage<T>),
    /// Run-length encoded rows.
    Rle(RunTable<T>),
    /// Dense planes allocated on first write.
    LazyPlanes(LazyPlaneStorage<T>),
    /// One child accessor per plane, possibly not loaded.
    Planes(PlaneComposition<T>),
    /// Write-through overlay recording original values of a source.
    History(HistoryBackend<T>),
}

impl<T: Voxel> VoxelBackend<T> {
    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        match self {
            VoxelBackend::Dense(storage) => Some(storage.get(index)),
            VoxelBackend::SparseMap(storage) => storage.get(index),
            VoxelBackend::Rle(table) => table.get(index),
            VoxelBackend::LazyPlanes(storage) => storage.get(index),
            VoxelBackend::Planes(planes) => planes.get(index),
            VoxelBackend::History(history) => history.get(index),
        }
    }

    /// The value a write would replace. Differs from [`VoxelBackend::get`]
    /// only for history overlays, which read back recorded originals.
    #[inline]
    pub fn current(&self, index: usize) -> Option<T> {
        match self {
            VoxelBackend::History(history) => history.current(index),
            backend => backend.get(index),
        }
    }

    /// Whether writes into plane `k` can be stored. Only compositions with an
    /// unloaded plane drop writes.
    pub fn accepts_plane(&self, k: usize) -> bool {
        match self {
            VoxelBackend::Planes(planes) => planes.is_plane_loaded(k),
            _ => true,
        }
    }

    /// Returns whether the stored state changed.
    #[inline]
    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self {
            VoxelBackend::Dense(storage) => storage.set(index, value),
            VoxelBackend::SparseMap(storage) => storage.set(index, value),
            VoxelBackend::Rle(table) => table.set(index, value),
            VoxelBackend::LazyPlanes(storage) => storage.set(index, value),
            VoxelBackend::Planes(planes) => planes.set(index, value),
            VoxelBackend::History(history) => history.set(index, value),
        }
    }

    pub fn clear(&mut self) {
        match self {
            VoxelBackend::Dense(storage) => storage.fill_zero(),
            VoxelBackend::SparseMap(storage) => storage.clear(),
            VoxelBackend::Rle(table) => table.clear(),
            VoxelBackend::LazyPlanes(storage) => storage.clear(),
            VoxelBackend::Planes(planes) => planes.clear(),
            VoxelBackend::History(history) => {
                history.commit();
            }
        }
    }

    /// Sparse backends are iterated by stored entry instead of by bounding box.
    pub fn is_sparse(&self) -> bool {
        match self {
            VoxelBackend::Dense(_) | VoxelBackend::Planes(_) => false,
            VoxelBackend::SparseMap(_)
            | VoxelBackend::Rle(_)
            | VoxelBackend::LazyPlanes(_)
            | VoxelBackend::History(_) => true,
        }
    }

    /// Visits the stored entries of a sparse backend in ascending index order.
    /// Dense backends visit nothing.
    pub fn for_each_stored<F: FnMut(usize, T)>(&self, mut callback: F) {
        match self {
            VoxelBackend::Dense(_) | VoxelBackend::Planes(_) => {}
            VoxelBackend::SparseMap(storage) => {
                storage.iter().for_each(|(index, value)| callback(index, value))
            }
            VoxelBackend::Rle(table) => table.for_each(callback),
            VoxelBackend::LazyPlanes(storage) => {
                for (k, plane) in storage.allocated_planes() {
                    let base = k * plane.voxel_count();
                    for offset in 0..plane.voxel_count() {
                        callback(base + offset, plane.get(offset));
                    }
                }
            }
            VoxelBackend::History(history) => {
                for index in history.recorded_indices() {
                    if let Some(value) = history.get(index) {
                        callback(index, value);
                    }
                }
            }
        }
    }

    /// Writes plane `k` into `out`, which must hold one plane of zeroed components.
    pub fn write_plane(&self, dimensions: &Dimensions, k: usize, out: &mut [T::Component]) {
        let frame_size = dimensions.frame_size();

        match self {
            VoxelBackend::Dense(storage) => {
                out.copy_from_slice(storage.voxel_range(k * frame_size, frame_size));
            }
            VoxelBackend::Rle(table) => table.materialize_into(k, out),
            VoxelBackend::LazyPlanes(storage) => {
                if let Some(plane) = storage.plane(k) {
                    out.copy_from_slice(plane.as_slice());
                }
            }
            VoxelBackend::SparseMap(storage) => {
                let base = k * frame_size;
                for (index, value) in storage.range(base..base + frame_size) {
                    let offset = (index - base) * T::COMPONENTS;
                    value.write_components(&mut out[offset..offset + T::COMPONENTS]);
                }
            }
            VoxelBackend::Planes(planes) => planes.write_plane(k, out),
            VoxelBackend::History(history) => {
                let base = k * frame_size;
                for offset in 0..frame_size {
                    if let Some(value) = history.get(base + offset) {
                        let offset = offset * T::COMPONENTS;
                        value.write_components(&mut out[offset..offset + T::COMPONENTS]);
                    }
                }
            }
        }
    }
}
