use std::marker::PhantomData;

use bytemuck::Zeroable;
use glam::Mat4;

use crate::effect::{Effect, EffectError, Result, VariableHandle};

use super::variable::validate;
use super::ShaderValue;

/// Bone transforms a skinning technique can address.
pub const MAX_BONE_TRANSFORMS: usize = 96;

/// Fixed-capacity array slot.
///
/// Shorter writes are zero-filled up to capacity because GPU memory is not
/// guaranteed to be cleared. Longer writes are rejected before reaching the
/// backend.
pub struct ArrayVariable<T: ShaderValue> {
    effect: Effect,
    handle: VariableHandle,
    name: String,
    capacity: usize,
    _marker: PhantomData<T>,
}

pub type MatrixArrayVariable = ArrayVariable<Mat4>;

impl<T: ShaderValue> ArrayVariable<T> {
    /// Binds an array slot of whatever capacity the effect declares.
    pub fn bind(effect: &Effect, name: &str) -> Result<Self> {
        let (handle, desc) = effect.variable(name)?;
        validate(&desc, T::ARRAY_KIND, T::stride(), None)?;

        Ok(Self {
            effect: effect.clone(),
            handle,
            capacity: desc.elements,
            name: desc.name,
            _marker: PhantomData,
        })
    }

    /// Binds an array slot that must hold exactly `capacity` elements.
    pub fn bind_with_capacity(effect: &Effect, name: &str, capacity: usize) -> Result<Self> {
        let (handle, desc) = effect.variable(name)?;
        validate(&desc, T::ARRAY_KIND, T::stride(), Some(capacity))?;

        Ok(Self {
            effect: effect.clone(),
            handle,
            capacity,
            name: desc.name,
            _marker: PhantomData,
        })
    }

    pub fn set(&self, values: &[T]) -> Result<()> {
        if values.len() > self.capacity {
            log::debug!(
                "{}: rejected {} elements for '{}' (capacity {})",
                self.effect.name(),
                values.len(),
                self.name,
                self.capacity
            );
            return Err(EffectError::CapacityExceeded {
                name: self.name.clone(),
                capacity: self.capacity,
                len: values.len(),
            });
        }

        let mut raw = vec![T::Raw::zeroed(); self.capacity];
        for (dst, src) in raw.iter_mut().zip(values) {
            *dst = src.to_raw();
        }
        self.effect.write(self.handle, bytemuck::cast_slice(&raw));
        Ok(())
    }

    /// All `capacity` elements currently in the slot.
    pub fn get(&self) -> Vec<T> {
        let bytes = self.effect.read(self.handle);
        bytes
            .chunks_exact(T::stride())
            .map(|chunk| T::from_raw(bytemuck::pod_read_unaligned(chunk)))
            .collect()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
