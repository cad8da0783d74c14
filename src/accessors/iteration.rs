use super::accessor::{VoxelAccess, VoxelAccessor};
use crate::core::bounds::BoundsIjk;
use crate::core::index::VoxelIndex;
use crate::core::prelude::*;
use crate::core::transform::WorldTransform;
use crate::core::voxel::Voxel;

/// A voxel visited by [`VoxelAccessor::for_each`].
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelPoint<T> {
    pub value: T,
    pub index: usize,
    pub point_ijk: VoxelIndex,
    /// Only set when iterating with a world transform.
    pub point_lps: Option<Point3<Real>>,
}

pub struct ForEachOptions<'a, T> {
    /// Restricts the walk. Defaults to the accessor's bounds.
    pub bounds: Option<BoundsIjk>,
    /// Voxels for which this returns `false` are skipped entirely.
    pub is_in_object: Option<&'a dyn Fn(&VoxelPoint<T>) -> bool>,
    /// Collect every visited voxel.
    pub return_points: bool,
    pub world_transform: Option<&'a WorldTransform>,
}

impl<T> Default for ForEachOptions<'_, T> {
    fn default() -> Self {
        Self {
            bounds: None,
            is_in_object: None,
            return_points: false,
            world_transform: None,
        }
    }
}

impl<T: Voxel> VoxelAccessor<T> {
    /// Calls `callback` for every voxel holding data.
    ///
    /// Sparse backends visit their stored entries in index order, filtered by
    /// `options.bounds` when given. Dense backends walk the bounding box.
    /// Returns the visited points when `options.return_points` is set.
    pub fn for_each<F>(
        &self,
        mut callback: F,
        options: &ForEachOptions<T>,
    ) -> Option<Vec<VoxelPoint<T>>>
    where
        F: FnMut(&VoxelPoint<T>),
    {
        firestorm::profile_fn!(for_each);

        let dimensions = self.dimensions();
        let mut points = options.return_points.then(Vec::new);
        let mut visit = |point: VoxelPoint<T>| {
            if let Some(is_in_object) = options.is_in_object {
                if !is_in_object(&point) {
                    return;
                }
            }
            callback(&point);
            if let Some(points) = points.as_mut() {
                points.push(point);
            }
        };

        let step_i = options
            .world_transform
            .map(|transform| transform.step_vectors()[0]);

        if self.backend().is_sparse() {
            // last position computed, stepped along `i` while entries stay contiguous
            let mut previous: Option<(usize, Point3<Real>)> = None;

            self.backend().for_each_stored(|index, value| {
                let point_ijk = dimensions.to_ijk(index);
                if let Some(bounds) = &options.bounds {
                    if !bounds.contains(&point_ijk) {
                        return;
                    }
                }
                let point_lps = options.world_transform.map(|transform| {
                    match (previous, step_i) {
                        (Some((previous_index, point)), Some(step))
                            if point_ijk.x > 0 && previous_index + 1 == index =>
                        {
                            point + step
                        }
                        _ => transform.ijk_to_lps(&point_ijk),
                    }
                });
                previous = point_lps.map(|point| (index, point));
                visit(VoxelPoint {
                    value,
                    index,
                    point_ijk,
                    point_lps,
                });
            });
        } else if let Some(bounds) = options
            .bounds
            .unwrap_or_else(|| self.bounds_ijk())
            .clamped(&dimensions)
        {
            let [i_min, i_max] = bounds.i();
            let [j_min, j_max] = bounds.j();
            let [k_min, k_max] = bounds.k();

            for k in k_min..=k_max {
                for j in j_min..=j_max {
                    let mut point_lps = options
                        .world_transform
                        .map(|transform| transform.ijk_to_lps(&VoxelIndex::new(i_min, j, k)));

                    for i in i_min..=i_max {
                        let index = dimensions.to_index(i, j, k);
                        if let Some(value) = self.backend().get(index) {
                            visit(VoxelPoint {
                                value,
                                index,
                                point_ijk: VoxelIndex::new(i, j, k),
                                point_lps,
                            });
                        }
                        if let (Some(point), Some(step)) = (point_lps.as_mut(), step_i) {
                            *point += step;
                        }
                    }
                }
            }
        }

        points
    }

    /// Rewrites voxels selected by `modify`, which returns the new value or
    /// `None` to leave a voxel alone. Writes are applied after the walk.
    /// Returns the number of voxels that changed.
    pub fn modify_each<F>(&mut self, options: &ForEachOptions<T>, mut modify: F) -> usize
    where
        F: FnMut(&VoxelPoint<T>) -> Option<T>,
    {
        let mut edits = Vec::new();
        self.for_each(
            |point| {
                if let Some(value) = modify(point) {
                    edits.push((point.index, value));
                }
            },
            &ForEachOptions {
                bounds: options.bounds,
                is_in_object: options.is_in_object,
                return_points: false,
                world_transform: options.world_transform,
            },
        );

        let changed = edits
            .into_iter()
            .filter(|(index, value)| self.set_at_index(*index, *value))
            .count();

        log::trace!("modified {changed} voxels");

        changed
    }
}
