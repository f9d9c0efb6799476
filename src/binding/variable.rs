use std::marker::PhantomData;

use crate::effect::{Effect, EffectError, Result, VariableDesc, VariableHandle};

use super::{ShaderValue, VariableKind};

/// Checks a resolved variable against what the binder will write.
pub(crate) fn validate(
    desc: &VariableDesc,
    kind: VariableKind,
    stride: usize,
    elements: Option<usize>,
) -> Result<()> {
    if desc.kind != kind {
        return Err(EffectError::VariableKindMismatch {
            name: desc.name.clone(),
            expected: kind,
            found: desc.kind,
        });
    }
    if desc.stride != stride {
        return Err(EffectError::StrideMismatch {
            name: desc.name.clone(),
            expected: stride,
            found: desc.stride,
        });
    }
    if let Some(expected) = elements {
        if desc.elements != expected {
            return Err(EffectError::ElementCountMismatch {
                name: desc.name.clone(),
                expected,
                found: desc.elements,
            });
        }
    }
    Ok(())
}

/// Typed accessor over a single scalar, vector, matrix or struct slot.
pub struct ShaderVariable<T: ShaderValue> {
    effect: Effect,
    handle: VariableHandle,
    name: String,
    _marker: PhantomData<T>,
}

impl<T: ShaderValue> ShaderVariable<T> {
    pub fn bind(effect: &Effect, name: &str) -> Result<Self> {
        let (handle, desc) = effect.variable(name)?;
        validate(&desc, T::KIND, T::stride(), Some(1))?;

        Ok(Self {
            effect: effect.clone(),
            handle,
            name: desc.name,
            _marker: PhantomData,
        })
    }

    pub fn set(&self, value: T) {
        let raw = value.to_raw();
        self.effect.write(self.handle, bytemuck::bytes_of(&raw));
    }

    pub fn get(&self) -> T {
        let bytes = self.effect.read(self.handle);
        T::from_raw(bytemuck::pod_read_unaligned(&bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectManifest, MemoryEffect};
    use glam::{Mat4, Vec3};

    fn effect() -> Effect {
        let manifest = EffectManifest::new("Test").with_variables([
            Mat4::desc("world"),
            Vec3::desc("eye_position"),
            f32::desc("fog_start"),
            VariableDesc::new("short", VariableKind::Matrix, 48, 1),
        ]);
        Effect::new("Test", MemoryEffect::from_manifest(&manifest))
    }

    #[test]
    fn values_roundtrip_through_the_slot() {
        let effect = effect();
        let world = ShaderVariable::<Mat4>::bind(&effect, "world").unwrap();
        let eye = ShaderVariable::<Vec3>::bind(&effect, "eye_position").unwrap();

        let matrix = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        world.set(matrix);
        eye.set(Vec3::new(0.0, 5.0, -10.0));

        assert_eq!(world.get(), matrix);
        assert_eq!(eye.get(), Vec3::new(0.0, 5.0, -10.0));
    }

    #[test]
    fn missing_variable_fails_binding() {
        let err = ShaderVariable::<f32>::bind(&effect(), "fog_range")
            .err()
            .unwrap();
        assert!(matches!(err, EffectError::MissingVariable { ref name, .. } if name == "fog_range"));
    }

    #[test]
    fn kind_and_stride_are_checked() {
        let effect = effect();
        let err = ShaderVariable::<f32>::bind(&effect, "world").err().unwrap();
        assert!(matches!(err, EffectError::VariableKindMismatch { .. }));

        let err = ShaderVariable::<Mat4>::bind(&effect, "short").err().unwrap();
        assert!(matches!(
            err,
            EffectError::StrideMismatch {
                expected: 64,
                found: 48,
                ..
            }
        ));
    }
}
