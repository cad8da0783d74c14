use super::index::{Dimensions, VoxelIndex};

/// Inclusive IJK bounding box, `[[i_min, i_max], [j_min, j_max], [k_min, k_max]]`.
///
/// A freshly created box is inverted (every min above every max) and contains
/// nothing until the first call to [`BoundsIjk::include`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsIjk(pub [[usize; 2]; 3]);

impl Default for BoundsIjk {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundsIjk {
    pub const fn empty() -> Self {
        Self([[usize::MAX, 0]; 3])
    }

    /// The box covering every voxel of `dimensions`.
    pub fn full(dimensions: &Dimensions) -> Self {
        Self([
            [0, dimensions.width.saturating_sub(1)],
            [0, dimensions.height.saturating_sub(1)],
            [0, dimensions.depth.saturating_sub(1)],
        ])
    }

    pub fn new(i: [usize; 2], j: [usize; 2], k: [usize; 2]) -> Self {
        Self([i, j, k])
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().any(|[min, max]| min > max)
    }

    pub fn include(&mut self, i: usize, j: usize, k: usize) {
        for (axis, value) in [i, j, k].into_iter().enumerate() {
            let [min, max] = &mut self.0[axis];
            *min = (*min).min(value);
            *max = (*max).max(value);
        }
    }

    pub fn contains(&self, index: &VoxelIndex) -> bool {
        self.0
            .iter()
            .zip([index.x, index.y, index.z])
            .all(|([min, max], value)| *min <= value && value <= *max)
    }

    /// Restricts the box to the volume, returning `None` when nothing remains.
    pub fn clamped(&self, dimensions: &Dimensions) -> Option<Self> {
        let mut clamped = self.0;
        for (axis, size) in dimensions.as_array().into_iter().enumerate() {
            if size == 0 {
                return None;
            }
            clamped[axis][1] = clamped[axis][1].min(size - 1);
        }
        let clamped = Self(clamped);
        (!clamped.is_empty()).then_some(clamped)
    }

    #[inline]
    pub fn i(&self) -> [usize; 2] {
        self.0[0]
    }

    #[inline]
    pub fn j(&self) -> [usize; 2] {
        self.0[1]
    }

    #[inline]
    pub fn k(&self) -> [usize; 2] {
        self.0[2]
    }
}
