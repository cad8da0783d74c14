use super::accessor::{SlicePlane, VoxelAccess, VoxelAccessor};
use super::iteration::{ForEachOptions, VoxelPoint};
use crate::core::bounds::BoundsIjk;
use crate::core::index::Dimensions;
use crate::core::voxel::Voxel;
use crate::error::{Result, VoxelError};

/// A 4D volume: one accessor per time point, all with the same dimensions.
/// Every access goes to the current time point.
#[derive(Debug, Clone)]
pub struct DynamicVoxelAccessor<T: Voxel> {
    time_points: Vec<VoxelAccessor<T>>,
    time_point: usize,
}

impl<T: Voxel> DynamicVoxelAccessor<T> {
    /// Panics when `time_points` is empty or the dimensions disagree.
    pub fn new(time_points: Vec<VoxelAccessor<T>>) -> Self {
        let Some(first) = time_points.first() else {
            panic!("a dynamic volume needs at least one time point");
        };
        let dimensions = first.dimensions();
        assert!(
            time_points
                .iter()
                .all(|accessor| accessor.dimensions() == dimensions),
            "time points have different dimensions"
        );

        Self {
            time_points,
            time_point: 0,
        }
    }

    /// `count` zero-filled dense time points.
    pub fn dense(dimensions: Dimensions, count: usize) -> Self {
        Self::new((0..count).map(|_| VoxelAccessor::dense(dimensions)).collect())
    }

    /// One dense time point per buffer.
    pub fn from_scalar_data(
        dimensions: Dimensions,
        buffers: Vec<Vec<T::Component>>,
    ) -> Result<Self> {
        let time_points = buffers
            .into_iter()
            .map(|data| VoxelAccessor::from_scalar_data(dimensions, data))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(time_points))
    }

    #[inline]
    pub fn time_point_index(&self) -> usize {
        self.time_point
    }

    pub fn set_time_point(&mut self, time_point: usize) -> Result<()> {
        if time_point >= self.time_points.len() {
            return Err(VoxelError::TimePointOutOfRange {
                time_point,
                count: self.time_points.len(),
            });
        }

        log::trace!("switched to time point {time_point}");
        self.time_point = time_point;
        Ok(())
    }

    pub fn time_point_count(&self) -> usize {
        self.time_points.len()
    }

    #[inline]
    pub fn current(&self) -> &VoxelAccessor<T> {
        &self.time_points[self.time_point]
    }

    #[inline]
    pub fn current_mut(&mut self) -> &mut VoxelAccessor<T> {
        &mut self.time_points[self.time_point]
    }

    pub fn time_point(&self, time_point: usize) -> Option<&VoxelAccessor<T>> {
        self.time_points.get(time_point)
    }

    pub fn time_point_mut(&mut self, time_point: usize) -> Option<&mut VoxelAccessor<T>> {
        self.time_points.get_mut(time_point)
    }

    /// Snapshot of time point `time_point`, independent of the current one.
    pub fn complete_scalar_data_at(&self, time_point: usize) -> Result<Vec<T::Component>> {
        self.time_point(time_point)
            .map(VoxelAccessor::complete_scalar_data)
            .ok_or(VoxelError::TimePointOutOfRange {
                time_point,
                count: self.time_points.len(),
            })
    }

    pub fn complete_scalar_data(&self) -> Vec<T::Component> {
        self.current().complete_scalar_data()
    }

    pub fn set_complete_scalar_data(&mut self, data: &[T::Component]) -> Result<()> {
        self.current_mut().set_complete_scalar_data(data)
    }

    pub fn slice_data(&self, slice_index: usize, plane: SlicePlane) -> Vec<T::Component> {
        self.current().slice_data(slice_index, plane)
    }

    pub fn for_each<F>(
        &self,
        callback: F,
        options: &ForEachOptions<T>,
    ) -> Option<Vec<VoxelPoint<T>>>
    where
        F: FnMut(&VoxelPoint<T>),
    {
        self.current().for_each(callback, options)
    }
}

impl<T: Voxel> VoxelAccess<T> for DynamicVoxelAccessor<T> {
    fn dimensions(&self) -> Dimensions {
        self.current().dimensions()
    }

    #[inline]
    fn get_at_index(&self, index: usize) -> Option<T> {
        self.current().get_at_index(index)
    }

    #[inline]
    fn set_at_index(&mut self, index: usize, value: T) -> bool {
        self.current_mut().set_at_index(index, value)
    }

    fn bounds_ijk(&self) -> BoundsIjk {
        self.current().bounds_ijk()
    }

    /// Clears the current time point only.
    fn clear(&mut self) {
        self.current_mut().clear();
    }
}
