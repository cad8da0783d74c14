use super::{index::VoxelIndex, prelude::*};

/// Maps IJK voxel coordinates to patient (LPS) world coordinates.
///
/// Column `a` of `direction` is the unit direction of IJK axis `a`.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldTransform {
    pub origin: Point3<Real>,
    pub spacing: Vector3<Real>,
    pub direction: Matrix3<Real>,
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self {
            origin: Point3::origin(),
            spacing: Vector3::new(1.0, 1.0, 1.0),
            direction: Matrix3::identity(),
        }
    }
}

impl WorldTransform {
    pub fn new(origin: Point3<Real>, spacing: Vector3<Real>, direction: Matrix3<Real>) -> Self {
        Self {
            origin,
            spacing,
            direction,
        }
    }

    /// World displacement of a unit step along each IJK axis.
    pub fn step_vectors(&self) -> [Vector3<Real>; 3] {
        [0, 1, 2].map(|axis| self.direction.column(axis) * self.spacing[axis])
    }

    pub fn ijk_to_lps(&self, index: &VoxelIndex) -> Point3<Real> {
        let [step_i, step_j, step_k] = self.step_vectors();
        self.origin
            + step_i * index.x as Real
            + step_j * index.y as Real
            + step_k * index.z as Real
    }

    /// Continuous IJK coordinate of a world point, `None` for a singular transform.
    pub fn lps_to_continuous_ijk(&self, point: &Point3<Real>) -> Option<Point3<Real>> {
        let [step_i, step_j, step_k] = self.step_vectors();
        let inverse = Matrix3::from_columns(&[step_i, step_j, step_k]).try_inverse()?;
        Some((inverse * (point - self.origin)).into())
    }

    /// Nearest voxel to a world point, `None` when it falls at negative IJK.
    pub fn lps_to_ijk(&self, point: &Point3<Real>) -> Option<VoxelIndex> {
        let continuous = self.lps_to_continuous_ijk(point)?;
        let rounded = continuous.map(|value| (value + Real::EPSILON).round());
        if rounded.iter().any(|value| *value < 0.0) {
            return None;
        }
        Some(VoxelIndex::new(
            rounded.x as usize,
            rounded.y as usize,
            rounded.z as usize,
        ))
    }
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_identity_transform() {
        let transform = WorldTransform::default();
        let point = transform.ijk_to_lps(&VoxelIndex::new(1, 2, 3));
        assert_abs_diff_eq!(point, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_oblique_transform_round_trip() {
        // i -> +y, j -> -x, k -> +z
        let direction = Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let transform = WorldTransform::new(
            Point3::new(10.0, -5.0, 2.5),
            Vector3::new(0.5, 0.25, 2.0),
            direction,
        );

        let index = VoxelIndex::new(4, 8, 3);
        let point = transform.ijk_to_lps(&index);
        assert_abs_diff_eq!(point, Point3::new(8.0, -3.0, 8.5), epsilon = 1e-12);
        assert_eq!(transform.lps_to_ijk(&point), Some(index));
    }

    #[test]
    fn test_singular_transform() {
        let transform = WorldTransform::new(
            Point3::origin(),
            Vector3::new(1.0, 0.0, 1.0),
            Matrix3::identity(),
        );
        assert_eq!(transform.lps_to_continuous_ijk(&Point3::origin()), None);
    }
}
