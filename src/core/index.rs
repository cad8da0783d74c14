use std::ops::Deref;

use super::prelude::*;
use crate::error::{Result, VoxelError};

/// Volume dimensions in voxels. `width` is the fastest varying axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Dimensions {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Number of voxels in one `k` plane.
    #[inline]
    pub fn frame_size(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn voxel_count(&self) -> usize {
        self.frame_size() * self.depth
    }

    /// Dimensions of a single plane of this volume.
    pub fn plane(&self) -> Dimensions {
        Dimensions::new(self.width, self.height, 1)
    }

    pub fn as_array(&self) -> [usize; 3] {
        [self.width, self.height, self.depth]
    }

    #[inline]
    pub fn contains_ijk(&self, i: usize, j: usize, k: usize) -> bool {
        i < self.width && j < self.height && k < self.depth
    }

    #[inline]
    pub fn contains_index(&self, index: usize) -> bool {
        index < self.voxel_count()
    }

    /// Linear index of `(i, j, k)`. The coordinate is not range checked.
    #[inline]
    pub fn to_index(&self, i: usize, j: usize, k: usize) -> usize {
        i + j * self.width + k * self.frame_size()
    }

    #[inline]
    pub fn to_ijk(&self, index: usize) -> VoxelIndex {
        let (k, rem) = num_integer::div_rem(index, self.frame_size());
        let (j, i) = num_integer::div_rem(rem, self.width);

        VoxelIndex(Point3::new(i, j, k))
    }

    /// Key of the `(j, k)` row in run-length tables.
    #[inline]
    pub fn row_key(&self, j: usize, k: usize) -> usize {
        j + k * self.height
    }

    pub fn check_ijk(&self, i: usize, j: usize, k: usize) -> Result<()> {
        if self.contains_ijk(i, j, k) {
            Ok(())
        } else {
            Err(VoxelError::InvalidCoordinate {
                i,
                j,
                k,
                width: self.width,
                height: self.height,
                depth: self.depth,
            })
        }
    }

    pub fn check_index(&self, index: usize) -> Result<()> {
        if self.contains_index(index) {
            Ok(())
        } else {
            Err(VoxelError::IndexOutOfRange {
                index,
                count: self.voxel_count(),
            })
        }
    }
}

impl From<[usize; 3]> for Dimensions {
    fn from(value: [usize; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

/// Voxel Index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoxelIndex(pub Point3<usize>);

impl Deref for VoxelIndex {
    type Target = Point3<usize>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl VoxelIndex {
    pub fn new(i: usize, j: usize, k: usize) -> Self {
        Self(Point3::new(i, j, k))
    }

    pub fn linear_index(&self, dimensions: &Dimensions) -> usize {
        dimensions.to_index(self.x, self.y, self.z)
    }

    /// In-volume neighbours of this voxel under `connectivity`.
    pub fn neighbours<'a>(
        &'a self,
        dimensions: &'a Dimensions,
        connectivity: Connectivity,
    ) -> impl Iterator<Item = VoxelIndex> + 'a {
        connectivity.offsets().iter().filter_map(move |offset| {
            let i = self.x.checked_add_signed(offset.x)?;
            let j = self.y.checked_add_signed(offset.y)?;
            let k = self.z.checked_add_signed(offset.z)?;
            dimensions
                .contains_ijk(i, j, k)
                .then(|| VoxelIndex::new(i, j, k))
        })
    }
}

/// Which neighbours count as connected.
///
/// - `Face`: 6-connected, voxels sharing a face.
/// - `Edge`: 18-connected, voxels sharing a face or an edge.
/// - `Vertex`: 26-connected, voxels sharing a face, an edge or a corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    Face,
    #[default]
    Edge,
    Vertex,
}

impl Connectivity {
    /// Offsets to the connected neighbours, faces first, then edges, then corners.
    pub fn offsets(&self) -> &'static [Vector3<isize>] {
        const NEIGHBOUR_OFFSETS: [Vector3<isize>; 26] = [
            Vector3::new(-1, 0, 0),
            Vector3::new(1, 0, 0),
            Vector3::new(0, -1, 0),
            Vector3::new(0, 1, 0),
            Vector3::new(0, 0, -1),
            Vector3::new(0, 0, 1),
            Vector3::new(-1, -1, 0),
            Vector3::new(-1, 1, 0),
            Vector3::new(1, -1, 0),
            Vector3::new(1, 1, 0),
            Vector3::new(-1, 0, -1),
            Vector3::new(-1, 0, 1),
            Vector3::new(1, 0, -1),
            Vector3::new(1, 0, 1),
            Vector3::new(0, -1, -1),
            Vector3::new(0, -1, 1),
            Vector3::new(0, 1, -1),
            Vector3::new(0, 1, 1),
            Vector3::new(-1, -1, -1),
            Vector3::new(-1, -1, 1),
            Vector3::new(-1, 1, -1),
            Vector3::new(-1, 1, 1),
            Vector3::new(1, -1, -1),
            Vector3::new(1, -1, 1),
            Vector3::new(1, 1, -1),
            Vector3::new(1, 1, 1),
        ];

        let count = match self {
            Connectivity::Face => 6,
            Connectivity::Edge => 18,
            Connectivity::Vertex => 26,
        };

        &NEIGHBOUR_OFFSETS[..count]
    }
}
