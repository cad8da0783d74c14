use super::accessor::{VoxelAccess, VoxelAccessor};
use crate::core::index::Dimensions;
use crate::core::voxel::Voxel;

/// A volume assembled from independently owned `width x height x 1` planes.
///
/// Planes may be missing, e.g. while their image is still loading. Reads
/// from a missing plane return `None` and writes to it are dropped.
#[derive(Debug, Clone)]
pub struct PlaneComposition<T: Voxel> {
    plane_dimensions: Dimensions,
    planes: Vec<Option<VoxelAccessor<T>>>,
}

impl<T: Voxel> PlaneComposition<T> {
    /// A composition with no plane loaded.
    pub fn new(dimensions: Dimensions) -> Self {
        Self {
            plane_dimensions: dimensions.plane(),
            planes: vec![None; dimensions.depth],
        }
    }

    /// Loads every plane `k` for which `provider(k)` returns one.
    pub fn from_source<F>(dimensions: Dimensions, mut provider: F) -> Self
    where
        F: FnMut(usize) -> Option<VoxelAccessor<T>>,
    {
        let mut composition = Self::new(dimensions);
        for k in 0..dimensions.depth {
            if let Some(plane) = provider(k) {
                composition.insert_plane(k, plane);
            }
        }
        composition
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(
            self.plane_dimensions.width,
            self.plane_dimensions.height,
            self.planes.len(),
        )
    }

    /// Installs `plane` at depth `k`, returning the plane it replaced.
    pub fn insert_plane(
        &mut self,
        k: usize,
        plane: VoxelAccessor<T>,
    ) -> Option<VoxelAccessor<T>> {
        assert_eq!(
            plane.dimensions(),
            self.plane_dimensions,
            "plane {k} does not match the composition"
        );
        self.planes[k].replace(plane)
    }

    pub fn remove_plane(&mut self, k: usize) -> Option<VoxelAccessor<T>> {
        self.planes[k].take()
    }

    pub fn is_plane_loaded(&self, k: usize) -> bool {
        self.plane(k).is_some()
    }

    pub fn plane(&self, k: usize) -> Option<&VoxelAccessor<T>> {
        self.planes.get(k).and_then(Option::as_ref)
    }

    pub fn plane_mut(&mut self, k: usize) -> Option<&mut VoxelAccessor<T>> {
        self.planes.get_mut(k).and_then(Option::as_mut)
    }

    pub fn loaded_plane_count(&self) -> usize {
        self.planes.iter().filter(|plane| plane.is_some()).count()
    }

    #[inline]
    fn locate(&self, index: usize) -> (usize, usize) {
        num_integer::div_rem(index, self.plane_dimensions.frame_size())
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        let (k, offset) = self.locate(index);
        self.plane(k)?.get_at_index(offset)
    }

    pub fn set(&mut self, index: usize, value: T) -> bool {
        let (k, offset) = self.locate(index);
        match self.plane_mut(k) {
            Some(plane) => plane.set_at_index(offset, value),
            None => {
                log::trace!("dropped write to unloaded plane {k}");
                false
            }
        }
    }

    /// Clears every loaded plane. Planes stay loaded.
    pub fn clear(&mut self) {
        self.planes.iter_mut().flatten().for_each(|plane| plane.clear());
    }

    /// Writes plane `k` into zeroed `out`. A missing plane leaves `out` untouched.
    pub fn write_plane(&self, k: usize, out: &mut [T::Component]) {
        if let Some(plane) = self.plane(k) {
            out.copy_from_slice(&plane.complete_scalar_data());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::accessors::SlicePlane;

    fn ramp_plane(dims: Dimensions, k: usize) -> VoxelAccessor<u16> {
        let plane = dims.plane();
        let data = (0..plane.voxel_count())
            .map(|offset| (offset + k * plane.voxel_count()) as u16)
            .collect();
        VoxelAccessor::from_scalar_data(plane, data).unwrap()
    }

    #[test]
    fn test_routes_to_planes() {
        let dims = Dimensions::new(3, 2, 3);
        let mut composition = PlaneComposition::from_source(dims, |k| Some(ramp_plane(dims, k)));
        assert_eq!(composition.dimensions(), dims);
        assert_eq!(composition.loaded_plane_count(), 3);

        for index in 0..dims.voxel_count() {
            assert_eq!(composition.get(index), Some(index as u16));
        }

        assert!(composition.set(dims.to_index(2, 1, 1), 100));
        assert_eq!(composition.plane(1).unwrap().get_at_ijk(2, 1, 0), Some(100));
        assert_eq!(composition.plane(0).unwrap().get_at_ijk(2, 1, 0), Some(5));
    }

    #[test]
    fn test_missing_planes() {
        let dims = Dimensions::new(2, 2, 3);
        let composition = PlaneComposition::from_source(dims, |k| {
            (k != 1).then(|| ramp_plane(dims, k))
        });
        assert!(composition.is_plane_loaded(0));
        assert!(!composition.is_plane_loaded(1));

        let mut accessor = VoxelAccessor::composed(composition);
        assert_eq!(accessor.get_at_ijk(0, 0, 1), None);
        assert!(!accessor.set_at_ijk(0, 0, 1, 3));
        assert!(accessor.modified_planes().is_empty());

        // missing planes read as zero in bulk output
        assert_eq!(accessor.slice_data(1, SlicePlane::Axial), vec![0; 4]);
        assert_eq!(accessor.slice_data(2, SlicePlane::Axial), vec![8, 9, 10, 11]);

        let planes = accessor.planes_mut().unwrap();
        assert!(planes.insert_plane(1, VoxelAccessor::dense(dims.plane())).is_none());
        assert!(accessor.set_at_ijk(0, 0, 1, 3));
        assert_eq!(accessor.get_at_ijk(0, 0, 1), Some(3));

        let removed = accessor.planes_mut().unwrap().remove_plane(1);
        assert_eq!(removed.unwrap().get_at_index(0), Some(3));
        assert_eq!(accessor.get_at_ijk(0, 0, 1), None);
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_rejects_mismatched_plane() {
        let mut composition = PlaneComposition::<u8>::new(Dimensions::new(4, 4, 2));
        composition.insert_plane(0, VoxelAccessor::dense(Dimensions::new(4, 3, 1)));
    }

    #[test]
    fn test_clear_keeps_planes_loaded() {
        let dims = Dimensions::new(2, 2, 2);
        let mut composition = PlaneComposition::from_source(dims, |k| Some(ramp_plane(dims, k)));
        composition.clear();

        assert_eq!(composition.loaded_plane_count(), 2);
        assert_eq!(composition.get(7), Some(0));
    }
}
