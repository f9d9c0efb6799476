use bytemuck::Pod;
use glam::{Mat4, UVec3, UVec4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::effect::VariableDesc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableKind {
    Scalar,
    Vector,
    Matrix,
    MatrixArray,
    Texture,
    Struct,
}

/// A CPU value with a fixed shader-side representation.
///
/// `Raw` is the exact bytes written to the slot, so its size is the stride
/// the variable must declare.
pub trait ShaderValue: Sized {
    type Raw: Pod;
    const KIND: VariableKind;
    /// Kind of a slot holding an array of this value.
    const ARRAY_KIND: VariableKind = Self::KIND;

    fn to_raw(&self) -> Self::Raw;
    fn from_raw(raw: Self::Raw) -> Self;

    fn stride() -> usize {
        std::mem::size_of::<Self::Raw>()
    }

    fn desc(name: &str) -> VariableDesc {
        VariableDesc::new(name, Self::KIND, Self::stride(), 1)
    }

    fn array_desc(name: &str, capacity: usize) -> VariableDesc {
        VariableDesc::new(name, Self::ARRAY_KIND, Self::stride(), capacity)
    }
}

macro_rules! impl_scalar_value {
    ($($ty:ty),*) => {
        $(
            impl ShaderValue for $ty {
                type Raw = $ty;
                const KIND: VariableKind = VariableKind::Scalar;

                fn to_raw(&self) -> Self::Raw {
                    *self
                }

                fn from_raw(raw: Self::Raw) -> Self {
                    raw
                }
            }
        )*
    };
}

impl_scalar_value!(f32, u32, i32);

// Shader booleans occupy a full 32-bit register.
impl ShaderValue for bool {
    type Raw = u32;
    const KIND: VariableKind = VariableKind::Scalar;

    fn to_raw(&self) -> u32 {
        *self as u32
    }

    fn from_raw(raw: u32) -> Self {
        raw != 0
    }
}

impl ShaderValue for Vec2 {
    type Raw = [f32; 2];
    const KIND: VariableKind = VariableKind::Vector;

    fn to_raw(&self) -> Self::Raw {
        self.to_array()
    }

    fn from_raw(raw: Self::Raw) -> Self {
        Vec2::from_array(raw)
    }
}

impl ShaderValue for Vec3 {
    type Raw = [f32; 3];
    const KIND: VariableKind = VariableKind::Vector;

    fn to_raw(&self) -> Self::Raw {
        self.to_array()
    }

    fn from_raw(raw: Self::Raw) -> Self {
        Vec3::from_array(raw)
    }
}

impl ShaderValue for Vec4 {
    type Raw = [f32; 4];
    const KIND: VariableKind = VariableKind::Vector;

    fn to_raw(&self) -> Self::Raw {
        self.to_array()
    }

    fn from_raw(raw: Self::Raw) -> Self {
        Vec4::from_array(raw)
    }
}

impl ShaderValue for UVec3 {
    type Raw = [u32; 3];
    const KIND: VariableKind = VariableKind::Vector;

    fn to_raw(&self) -> Self::Raw {
        self.to_array()
    }

    fn from_raw(raw: Self::Raw) -> Self {
        UVec3::from_array(raw)
    }
}

impl ShaderValue for UVec4 {
    type Raw = [u32; 4];
    const KIND: VariableKind = VariableKind::Vector;

    fn to_raw(&self) -> Self::Raw {
        self.to_array()
    }

    fn from_raw(raw: Self::Raw) -> Self {
        UVec4::from_array(raw)
    }
}

impl ShaderValue for Mat4 {
    type Raw = [[f32; 4]; 4];
    const KIND: VariableKind = VariableKind::Matrix;
    const ARRAY_KIND: VariableKind = VariableKind::MatrixArray;

    fn to_raw(&self) -> Self::Raw {
        self.to_cols_array_2d()
    }

    fn from_raw(raw: Self::Raw) -> Self {
        Mat4::from_cols_array_2d(&raw)
    }
}

/// Implements [`ShaderValue`] for `#[repr(C)]` Pod structs written verbatim.
#[macro_export]
macro_rules! impl_struct_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::binding::ShaderValue for $ty {
                type Raw = $ty;
                const KIND: $crate::binding::VariableKind = $crate::binding::VariableKind::Struct;

                fn to_raw(&self) -> Self::Raw {
                    *self
                }

                fn from_raw(raw: Self::Raw) -> Self {
                    raw
                }
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides_match_shader_sizes() {
        assert_eq!(<f32 as ShaderValue>::stride(), 4);
        assert_eq!(<bool as ShaderValue>::stride(), 4);
        assert_eq!(<Vec3 as ShaderValue>::stride(), 12);
        assert_eq!(<UVec3 as ShaderValue>::stride(), 12);
        assert_eq!(<Mat4 as ShaderValue>::stride(), 64);
    }

    #[test]
    fn matrix_arrays_have_their_own_kind() {
        let desc = Mat4::array_desc("bones", 96);
        assert_eq!(desc.kind, VariableKind::MatrixArray);
        assert_eq!(desc.byte_size(), 96 * 64);
        assert_eq!(Mat4::desc("world").kind, VariableKind::Matrix);
    }

    #[test]
    fn bool_maps_to_register() {
        assert_eq!(true.to_raw(), 1);
        assert!(!bool::from_raw(0));
    }
}
