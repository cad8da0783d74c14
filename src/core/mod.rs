pub mod bounds;
pub mod index;
pub mod rle;
pub mod storage;
pub mod transform;
pub mod voxel;

pub mod prelude {
    pub type Real = f64;

    pub use nalgebra::Point3;

    pub use nalgebra::Vector3;

    pub use nalgebra::Matrix3;
}
