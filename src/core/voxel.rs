use std::fmt::Debug;

use bytemuck::Pod;

/// Native element type of a voxel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Uint8,
    Int8,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Float32,
    Float64,
}

impl ScalarType {
    pub fn bytes_per_element(&self) -> usize {
        match self {
            ScalarType::Uint8 | ScalarType::Int8 => 1,
            ScalarType::Uint16 | ScalarType::Int16 => 2,
            ScalarType::Uint32 | ScalarType::Int32 | ScalarType::Float32 => 4,
            ScalarType::Float64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ScalarType::Float32 | ScalarType::Float64)
    }
}

/// A single buffer element. Zero is `Default::default()`.
pub trait Scalar: Pod + Default + Debug + PartialEq + PartialOrd {
    const SCALAR_TYPE: ScalarType;
}

/// A voxel sample made of [`Voxel::COMPONENTS`] scalars.
///
/// Scalars are single component voxels; `[C; N]` arrays are multi component
/// (e.g. RGB) voxels.
pub trait Voxel: Clone + Copy + Debug + PartialEq {
    type Component: Scalar;

    const COMPONENTS: usize;

    fn zero() -> Self;

    /// Writes the components into `out[..Self::COMPONENTS]`.
    fn write_components(&self, out: &mut [Self::Component]);

    /// Reads a voxel from `components[..Self::COMPONENTS]`.
    fn from_components(components: &[Self::Component]) -> Self;
}

macro_rules! impl_voxel {
    ($($t:ty => $scalar_type:ident),* $(,)?) => {
        $(
            impl Scalar for $t {
                const SCALAR_TYPE: ScalarType = ScalarType::$scalar_type;
            }

            impl Voxel for $t {
                type Component = $t;

                const COMPONENTS: usize = 1;

                #[inline]
                fn zero() -> Self {
                    <$t>::default()
                }

                #[inline]
                fn write_components(&self, out: &mut [$t]) {
                    out[0] = *self;
                }

                #[inline]
                fn from_components(components: &[$t]) -> Self {
                    components[0]
                }
            }

            impl<const N: usize> Voxel for [$t; N] {
                type Component = $t;

                const COMPONENTS: usize = N;

                #[inline]
                fn zero() -> Self {
                    [<$t>::default(); N]
                }

                #[inline]
                fn write_components(&self, out: &mut [$t]) {
                    out[..N].copy_from_slice(self);
                }

                #[inline]
                fn from_components(components: &[$t]) -> Self {
                    let mut voxel = [<$t>::default(); N];
                    voxel.copy_from_slice(&components[..N]);
                    voxel
                }
            }
        )*
    };
}

impl_voxel!(
    u8 => Uint8,
    i8 => Int8,
    u16 => Uint16,
    i16 => Int16,
    u32 => Uint32,
    i32 => Int32,
    f32 => Float32,
    f64 => Float64,
);
