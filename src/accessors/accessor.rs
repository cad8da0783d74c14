use std::collections::{BTreeSet, HashSet};

use super::backend::VoxelBackend;
use super::composed::PlaneComposition;
use super::history::{HistoryBackend, HistoryConfig, SharedVoxels};
use crate::core::bounds::BoundsIjk;
use crate::core::index::{Dimensions, VoxelIndex};
use crate::core::rle::{FloodFillConfig, RunTable};
use crate::core::storage::{DenseStorage, LazyPlaneStorage, SparseMapStorage};
use crate::core::voxel::{Scalar, ScalarType, Voxel};
use crate::error::{Result, VoxelError};

/// The per-voxel contract shared by every accessor.
pub trait VoxelAccess<T: Voxel> {
    fn dimensions(&self) -> Dimensions;

    /// `None` when the voxel holds no data.
    fn get_at_index(&self, index: usize) -> Option<T>;

    /// Returns whether the stored value changed.
    fn set_at_index(&mut self, index: usize, value: T) -> bool;

    fn bounds_ijk(&self) -> BoundsIjk;

    fn clear(&mut self);

    fn get_at_ijk(&self, i: usize, j: usize, k: usize) -> Option<T> {
        let dimensions = self.dimensions();
        assert_ijk(&dimensions, i, j, k);
        self.get_at_index(dimensions.to_index(i, j, k))
    }

    fn set_at_ijk(&mut self, i: usize, j: usize, k: usize, value: T) -> bool {
        let dimensions = self.dimensions();
        assert_ijk(&dimensions, i, j, k);
        self.set_at_index(dimensions.to_index(i, j, k), value)
    }

    fn try_get_at_ijk(&self, i: usize, j: usize, k: usize) -> Result<Option<T>> {
        let dimensions = self.dimensions();
        dimensions.check_ijk(i, j, k)?;
        Ok(self.get_at_index(dimensions.to_index(i, j, k)))
    }

    fn try_set_at_ijk(&mut self, i: usize, j: usize, k: usize, value: T) -> Result<bool> {
        let dimensions = self.dimensions();
        dimensions.check_ijk(i, j, k)?;
        Ok(self.set_at_index(dimensions.to_index(i, j, k), value))
    }
}

fn assert_ijk(dimensions: &Dimensions, i: usize, j: usize, k: usize) {
    if let Err(err) = dimensions.check_ijk(i, j, k) {
        panic!("{err}");
    }
}

fn assert_index(dimensions: &Dimensions, index: usize) {
    if let Err(err) = dimensions.check_index(index) {
        panic!("{err}");
    }
}

/// Axis a 2D slice is extracted along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SlicePlane {
    /// Constant `i`, a `height x depth` slice.
    Sagittal = 0,
    /// Constant `j`, a `width x depth` slice.
    Coronal = 1,
    /// Constant `k`, a `width x height` slice.
    Axial = 2,
}

impl TryFrom<u8> for SlicePlane {
    type Error = VoxelError;

    fn try_from(axis: u8) -> Result<Self> {
        match axis {
            0 => Ok(SlicePlane::Sagittal),
            1 => Ok(SlicePlane::Coronal),
            2 => Ok(SlicePlane::Axial),
            _ => Err(VoxelError::UnsupportedAxis(axis)),
        }
    }
}

/// Uniform accessor over a voxel volume.
///
/// Writes that change the stored value grow the tracked bounding box and mark
/// their plane as modified. Writes that leave the value unchanged are not
/// tracked.
#[derive(Debug, Clone)]
pub struct VoxelAccessor<T: Voxel> {
    dimensions: Dimensions,
    bounds_ijk: BoundsIjk,
    modified_planes: BTreeSet<usize>,
    points: BTreeSet<usize>,
    plane_ranges: Vec<Option<[T::Component; 2]>>,
    backend: VoxelBackend<T>,
}

impl<T: Voxel> VoxelAccessor<T> {
    fn with_backend(dimensions: Dimensions, backend: VoxelBackend<T>) -> Self {
        Self {
            dimensions,
            bounds_ijk: BoundsIjk::empty(),
            modified_planes: BTreeSet::new(),
            points: BTreeSet::new(),
            plane_ranges: vec![None; dimensions.depth],
            backend,
        }
    }

    /// Zero-filled dense volume.
    pub fn dense(dimensions: Dimensions) -> Self {
        let storage = DenseStorage::new(dimensions.voxel_count());
        Self::with_backend(dimensions, VoxelBackend::Dense(storage))
    }

    /// Dense volume over an existing component buffer.
    pub fn from_scalar_data(dimensions: Dimensions, data: Vec<T::Component>) -> Result<Self> {
        let expected = dimensions.voxel_count() * T::COMPONENTS;
        if data.len() != expected {
            return Err(VoxelError::BufferLength {
                expected,
                actual: data.len(),
            });
        }
        let storage = DenseStorage::from_components(data);
        Ok(Self::with_backend(dimensions, VoxelBackend::Dense(storage)))
    }

    /// Single-plane dense image.
    pub fn image(width: usize, height: usize) -> Self {
        Self::dense(Dimensions::new(width, height, 1))
    }

    pub fn sparse_map(dimensions: Dimensions) -> Self {
        Self::with_backend(
            dimensions,
            VoxelBackend::SparseMap(SparseMapStorage::new()),
        )
    }

    pub fn rle(dimensions: Dimensions) -> Self {
        Self::rle_with_default(dimensions, None)
    }

    /// RLE volume where voxels without a run read as `default_value`.
    pub fn rle_with_default(dimensions: Dimensions, default_value: Option<T>) -> Self {
        let table = RunTable::with_default_value(dimensions, default_value);
        Self::with_backend(dimensions, VoxelBackend::Rle(table))
    }

    pub fn lazy_planes(dimensions: Dimensions) -> Self {
        let storage = LazyPlaneStorage::new(dimensions.frame_size(), dimensions.depth);
        Self::with_backend(dimensions, VoxelBackend::LazyPlanes(storage))
    }

    /// Volume composed of one `width x height x 1` accessor per plane.
    pub fn composed(planes: PlaneComposition<T>) -> Self {
        let dimensions = planes.dimensions();
        Self::with_backend(dimensions, VoxelBackend::Planes(planes))
    }

    /// Overlay recording the original values of `source` for undo.
    pub fn history(source: SharedVoxels<T>, config: &HistoryConfig) -> Self {
        let history = HistoryBackend::new(source, config);
        let dimensions = history.dimensions();
        Self::with_backend(dimensions, VoxelBackend::History(history))
    }

    #[inline]
    pub fn frame_size(&self) -> usize {
        self.dimensions.frame_size()
    }

    #[inline]
    pub fn number_of_components(&self) -> usize {
        T::COMPONENTS
    }

    /// Native element type of the buffers this accessor produces.
    pub fn scalar_type(&self) -> ScalarType {
        <T::Component as Scalar>::SCALAR_TYPE
    }

    /// Number of components in a complete scalar buffer.
    pub fn scalar_data_len(&self) -> usize {
        self.dimensions.voxel_count() * T::COMPONENTS
    }

    pub fn backend(&self) -> &VoxelBackend<T> {
        &self.backend
    }

    pub fn rle_table(&self) -> Option<&RunTable<T>> {
        match &self.backend {
            VoxelBackend::Rle(table) => Some(table),
            _ => None,
        }
    }

    pub fn planes(&self) -> Option<&PlaneComposition<T>> {
        match &self.backend {
            VoxelBackend::Planes(planes) => Some(planes),
            _ => None,
        }
    }

    pub fn planes_mut(&mut self) -> Option<&mut PlaneComposition<T>> {
        match &mut self.backend {
            VoxelBackend::Planes(planes) => Some(planes),
            _ => None,
        }
    }

    pub fn history_backend(&self) -> Option<&HistoryBackend<T>> {
        match &self.backend {
            VoxelBackend::History(history) => Some(history),
            _ => None,
        }
    }

    pub fn history_backend_mut(&mut self) -> Option<&mut HistoryBackend<T>> {
        match &mut self.backend {
            VoxelBackend::History(history) => Some(history),
            _ => None,
        }
    }

    /// The tracked bounding box, empty until the first changing write.
    pub fn tracked_bounds(&self) -> &BoundsIjk {
        &self.bounds_ijk
    }

    pub fn modified_planes(&self) -> &BTreeSet<usize> {
        &self.modified_planes
    }

    pub fn reset_modified_planes(&mut self) {
        self.modified_planes.clear();
    }

    fn mark_modified(&mut self, i: usize, j: usize, k: usize) {
        self.bounds_ijk.include(i, j, k);
        self.modified_planes.insert(k);
        self.plane_ranges[k] = None;
    }

    pub fn add_point(&mut self, index: usize) {
        assert_index(&self.dimensions, index);
        self.points.insert(index);
    }

    /// The explicitly added points, in ascending index order.
    pub fn points(&self) -> Vec<VoxelIndex> {
        self.points
            .iter()
            .map(|index| self.dimensions.to_ijk(*index))
            .collect()
    }

    /// Extracts a 2D slice. Voxels without data are zero.
    pub fn slice_data(&self, slice_index: usize, plane: SlicePlane) -> Vec<T::Component> {
        let Dimensions {
            width,
            height,
            depth,
        } = self.dimensions;
        let components = T::COMPONENTS;
        let zero = T::Component::default();

        match plane {
            SlicePlane::Axial => {
                assert_ijk(&self.dimensions, 0, 0, slice_index);
                let mut out = vec![zero; self.frame_size() * components];
                self.backend
                    .write_plane(&self.dimensions, slice_index, &mut out);
                out
            }
            SlicePlane::Coronal => {
                assert_ijk(&self.dimensions, 0, slice_index, 0);
                let mut out = vec![zero; width * depth * components];
                for k in 0..depth {
                    for i in 0..width {
                        let index = self.dimensions.to_index(i, slice_index, k);
                        if let Some(value) = self.backend.get(index) {
                            let offset = (k * width + i) * components;
                            value.write_components(&mut out[offset..offset + components]);
                        }
                    }
                }
                out
            }
            SlicePlane::Sagittal => {
                assert_ijk(&self.dimensions, slice_index, 0, 0);
                let mut out = vec![zero; height * depth * components];
                for k in 0..depth {
                    for j in 0..height {
                        let index = self.dimensions.to_index(slice_index, j, k);
                        if let Some(value) = self.backend.get(index) {
                            let offset = (k * height + j) * components;
                            value.write_components(&mut out[offset..offset + components]);
                        }
                    }
                }
                out
            }
        }
    }

    /// Snapshot of the whole volume. Changes to the returned buffer are not
    /// reflected back.
    pub fn complete_scalar_data(&self) -> Vec<T::Component> {
        if let VoxelBackend::Dense(storage) = &self.backend {
            return storage.as_slice().to_vec();
        }

        let plane_len = self.frame_size() * T::COMPONENTS;
        let mut out = vec![T::Component::default(); self.scalar_data_len()];
        if plane_len > 0 {
            for (k, plane) in out.chunks_exact_mut(plane_len).enumerate() {
                self.backend.write_plane(&self.dimensions, k, plane);
            }
        }
        out
    }

    /// Byte view of [`VoxelAccessor::complete_scalar_data`], for upload to renderers.
    pub fn complete_scalar_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.complete_scalar_data()).to_vec()
    }

    /// Overwrites every voxel from `data`, marks every plane as modified and
    /// recomputes the per-plane value ranges.
    pub fn set_complete_scalar_data(&mut self, data: &[T::Component]) -> Result<()> {
        firestorm::profile_fn!(set_complete_scalar_data);

        let expected = self.scalar_data_len();
        if data.len() != expected {
            return Err(VoxelError::BufferLength {
                expected,
                actual: data.len(),
            });
        }

        let components = T::COMPONENTS;
        let voxel_at = |index: usize| T::from_components(&data[index * components..]);

        match &mut self.backend {
            VoxelBackend::Dense(storage) => storage.as_mut_slice().copy_from_slice(data),
            VoxelBackend::Rle(table) => {
                let dimensions = self.dimensions;
                table.fill_from(
                    |i, j, k| Some(voxel_at(dimensions.to_index(i, j, k))),
                    &BoundsIjk::full(&dimensions),
                );
            }
            backend => {
                let frame_size = self.dimensions.frame_size();
                for k in 0..self.dimensions.depth {
                    if !backend.accepts_plane(k) {
                        log::trace!("skipped bulk write to unloaded plane {k}");
                        continue;
                    }
                    for index in k * frame_size..(k + 1) * frame_size {
                        backend.set(index, voxel_at(index));
                    }
                }
            }
        }

        // only planes that stored the buffer are tracked
        let accepted: Vec<usize> = (0..self.dimensions.depth)
            .filter(|k| self.backend.accepts_plane(*k))
            .collect();
        let plane_len = self.frame_size() * components;

        self.plane_ranges.iter_mut().for_each(|range| *range = None);
        if plane_len > 0 {
            for &k in &accepted {
                self.plane_ranges[k] = component_range(&data[k * plane_len..(k + 1) * plane_len]);
            }
        }
        self.modified_planes.extend(accepted.iter().copied());
        if let (Some(&first), Some(&last)) = (accepted.first(), accepted.last()) {
            let Dimensions { width, height, .. } = self.dimensions;
            if width > 0 && height > 0 {
                self.bounds_ijk.include(0, 0, first);
                self.bounds_ijk.include(width - 1, height - 1, last);
            }
        }

        log::debug!(
            "overwrote {} voxels of a {}x{}x{} volume",
            self.dimensions.voxel_count(),
            self.dimensions.width,
            self.dimensions.height,
            self.dimensions.depth
        );

        Ok(())
    }

    /// Minimum and maximum component of plane `k`.
    /// `None` for a plane whose data is not loaded.
    pub fn plane_range(&self, k: usize) -> Option<[T::Component; 2]> {
        assert_ijk(&self.dimensions, 0, 0, k);
        if !self.backend.accepts_plane(k) {
            return None;
        }
        self.plane_ranges[k].or_else(|| component_range(&self.slice_data(k, SlicePlane::Axial)))
    }

    /// Minimum and maximum component of the whole volume.
    pub fn range(&self) -> Option<[T::Component; 2]> {
        (0..self.dimensions.depth)
            .filter_map(|k| self.plane_range(k))
            .reduce(|[min, max], [plane_min, plane_max]| {
                [
                    if plane_min < min { plane_min } else { min },
                    if plane_max > max { plane_max } else { max },
                ]
            })
    }

    /// Repaints the region connected to `(i, j, k)` holding the seed's value.
    ///
    /// RLE volumes fill whole runs at a time; other backends are filled voxel
    /// by voxel with the same connectivity rules.
    pub fn flood_fill(
        &mut self,
        i: usize,
        j: usize,
        k: usize,
        value: T,
        config: &FloodFillConfig,
    ) -> Result<usize> {
        self.dimensions.check_ijk(i, j, k)?;

        if let VoxelBackend::Rle(table) = &mut self.backend {
            let mut changed = BoundsIjk::empty();
            let count = table.flood_fill_tracked(i, j, k, value, config, &mut changed)?;
            if !changed.is_empty() {
                let ([i_min, i_max], [j_min, j_max], [k_min, k_max]) =
                    (changed.i(), changed.j(), changed.k());
                self.mark_modified(i_min, j_min, k_min);
                self.mark_modified(i_max, j_max, k_max);
                // a connected region passes through every plane between its extremes
                for plane in k_min..=k_max {
                    self.modified_planes.insert(plane);
                    self.plane_ranges[plane] = None;
                }
            }
            return Ok(count);
        }

        self.flood_fill_voxels(VoxelIndex::new(i, j, k), value, config)
    }

    fn flood_fill_voxels(
        &mut self,
        seed: VoxelIndex,
        value: T,
        config: &FloodFillConfig,
    ) -> Result<usize> {
        firestorm::profile_fn!(flood_fill_voxels);

        let dimensions = self.dimensions;
        let seed_index = seed.linear_index(&dimensions);
        // history overlays read back originals, the fill must see present values
        let Some(source_value) = self.backend.current(seed_index) else {
            return Err(VoxelError::FloodFillSeedMissing {
                i: seed.x,
                j: seed.y,
                k: seed.z,
            });
        };
        if source_value == value {
            return Err(VoxelError::FloodFillSameValue);
        }

        let mut visited = HashSet::new();
        let mut stack = vec![seed];
        let mut count = 0;

        while let Some(voxel) = stack.pop() {
            let index = voxel.linear_index(&dimensions);
            if !visited.insert(index) || self.backend.current(index) != Some(source_value) {
                continue;
            }

            self.set_at_index(index, value);
            count += 1;

            stack.extend(
                voxel
                    .neighbours(&dimensions, config.connectivity)
                    .filter(|neighbour| !config.single_plane || neighbour.z == voxel.z),
            );
        }

        log::debug!(
            "flood fill from ({}, {}, {}) repainted {count} voxels",
            seed.x,
            seed.y,
            seed.z
        );

        Ok(count)
    }
}

fn component_range<C: Scalar>(components: &[C]) -> Option<[C; 2]> {
    let (first, rest) = components.split_first()?;
    Some(rest.iter().fold([*first, *first], |[min, max], value| {
        [
            if *value < min { *value } else { min },
            if *value > max { *value } else { max },
        ]
    }))
}

impl<T: Voxel> VoxelAccess<T> for VoxelAccessor<T> {
    #[inline]
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    #[inline]
    fn get_at_index(&self, index: usize) -> Option<T> {
        assert_index(&self.dimensions, index);
        self.backend.get(index)
    }

    fn set_at_index(&mut self, index: usize, value: T) -> bool {
        assert_index(&self.dimensions, index);

        let changed = self.backend.set(index, value);
        if changed {
            let ijk = self.dimensions.to_ijk(index);
            self.mark_modified(ijk.x, ijk.y, ijk.z);
        }
        changed
    }

    /// The tracked box, or the whole volume when nothing was written yet.
    fn bounds_ijk(&self) -> BoundsIjk {
        if self.bounds_ijk.is_empty() {
            BoundsIjk::full(&self.dimensions)
        } else {
            self.bounds_ijk
        }
    }

    fn clear(&mut self) {
        self.backend.clear();
        self.bounds_ijk = BoundsIjk::empty();
        self.modified_planes.clear();
        self.points.clear();
        self.plane_ranges.iter_mut().for_each(|range| *range = None);

        log::trace!("cleared voxel accessor");
    }
}
