use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::ops::Range;

use super::voxel::Voxel;

/// Contiguous voxel buffer, `T::COMPONENTS` scalars per voxel.
#[derive(Debug, Clone)]
pub struct DenseStorage<T: Voxel> {
    data: Vec<T::Component>,
    _marker: PhantomData<T>,
}

impl<T: Voxel> DenseStorage<T> {
    /// Zero-filled storage for `voxel_count` voxels.
    pub fn new(voxel_count: usize) -> Self {
        Self {
            data: vec![Default::default(); voxel_count * T::COMPONENTS],
            _marker: PhantomData,
        }
    }

    /// Wraps an existing component buffer.
    pub fn from_components(data: Vec<T::Component>) -> Self {
        assert_eq!(data.len() % T::COMPONENTS, 0);
        Self {
            data,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[T::Component] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T::Component] {
        &mut self.data
    }

    pub fn into_components(self) -> Vec<T::Component> {
        self.data
    }

    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.data.len() / T::COMPONENTS
    }

    #[inline]
    pub fn get(&self, index: usize) -> T {
        let offset = index * T::COMPONENTS;
        T::from_components(&self.data[offset..offset + T::COMPONENTS])
    }

    /// Returns `false` when the voxel already held `value`.
    #[inline]
    pub fn set(&mut self, index: usize, value: T) -> bool {
        if self.get(index) == value {
            return false;
        }
        let offset = index * T::COMPONENTS;
        value.write_components(&mut self.data[offset..offset + T::COMPONENTS]);
        true
    }

    /// Components of the voxels in `first..first + count`.
    #[inline]
    pub fn voxel_range(&self, first: usize, count: usize) -> &[T::Component] {
        &self.data[first * T::COMPONENTS..(first + count) * T::COMPONENTS]
    }

    pub fn fill_zero(&mut self) {
        self.data.fill(Default::default());
    }
}

/// Dense planes allocated on first write.
#[derive(Debug, Clone)]
pub struct LazyPlaneStorage<T: Voxel> {
    frame_size: usize,
    planes: Vec<Option<DenseStorage<T>>>,
}

impl<T: Voxel> LazyPlaneStorage<T> {
    pub fn new(frame_size: usize, depth: usize) -> Self {
        Self {
            frame_size,
            planes: vec![None; depth],
        }
    }

    #[inline]
    fn locate(&self, index: usize) -> (usize, usize) {
        num_integer::div_rem(index, self.frame_size)
    }

    /// `None` while the voxel's plane has not been written.
    pub fn get(&self, index: usize) -> Option<T> {
        let (k, offset) = self.locate(index);
        self.planes[k].as_ref().map(|plane| plane.get(offset))
    }

    /// Writing into an unallocated plane always counts as a change.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        let (k, offset) = self.locate(index);
        if let Some(plane) = self.planes[k].as_mut() {
            return plane.set(offset, value);
        }

        log::trace!("allocating plane {k}");
        let mut plane = DenseStorage::new(self.frame_size);
        plane.set(offset, value);
        self.planes[k] = Some(plane);
        true
    }

    pub fn plane(&self, k: usize) -> Option<&DenseStorage<T>> {
        self.planes.get(k).and_then(Option::as_ref)
    }

    pub fn allocated_planes(&self) -> impl Iterator<Item = (usize, &DenseStorage<T>)> {
        self.planes
            .iter()
            .enumerate()
            .filter_map(|(k, plane)| plane.as_ref().map(|plane| (k, plane)))
    }

    pub fn allocated_plane_count(&self) -> usize {
        self.planes.iter().filter(|plane| plane.is_some()).count()
    }

    pub fn clear(&mut self) {
        self.planes.iter_mut().for_each(|plane| *plane = None);
    }
}

/// Voxels stored by linear index, ordered.
#[derive(Debug, Clone)]
pub struct SparseMapStorage<T> {
    voxels: BTreeMap<usize, T>,
}

impl<T> Default for SparseMapStorage<T> {
    fn default() -> Self {
        Self {
            voxels: BTreeMap::new(),
        }
    }
}

impl<T: Copy + PartialEq> SparseMapStorage<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        self.voxels.get(&index).copied()
    }

    pub fn set(&mut self, index: usize, value: T) -> bool {
        self.voxels.insert(index, value) != Some(value)
    }

    pub fn remove(&mut self, index: usize) -> Option<T> {
        self.voxels.remove(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.voxels.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.voxels.iter().map(|(index, value)| (*index, *value))
    }

    /// Stored voxels with an index in `range`.
    pub fn range(&self, range: Range<usize>) -> impl Iterator<Item = (usize, T)> + '_ {
        self.voxels
            .range(range)
            .map(|(index, value)| (*index, *value))
    }

    pub fn clear(&mut self) {
        self.voxels.clear();
    }
}
