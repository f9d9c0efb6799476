use std::collections::HashMap;
use std::ops::Range;

use crate::binding::VariableKind;
use crate::effect::{
    EffectBackend, EffectManifest, TechniqueDesc, TechniqueHandle, TextureHandle, VariableDesc,
    VariableHandle,
};

use super::{UniformBlockLayout, UniformShadow};

pub(crate) const UNIFORM_BINDING: u32 = 0;
pub(crate) const SAMPLER_BINDING: u32 = 1;
pub(crate) const FIRST_TEXTURE_BINDING: u32 = 2;

struct Slot {
    desc: VariableDesc,
    offset: Option<usize>,
    texture_binding: Option<u32>,
    texture: Option<TextureHandle>,
}

/// Host side of a GPU effect: variable slots mapped onto the uniform block
/// and texture bindings, with the CPU copy of the block.
///
/// Texture slots get bindings from `2` upward in manifest order.
pub struct SlotTable {
    techniques: Vec<TechniqueDesc>,
    technique_lookup: HashMap<String, u32>,
    slots: Vec<Slot>,
    slot_lookup: HashMap<String, u32>,
    layout: UniformBlockLayout,
    shadow: UniformShadow,
}

impl SlotTable {
    pub fn new(manifest: &EffectManifest) -> Self {
        let layout = UniformBlockLayout::new(&manifest.variables);

        let mut next_texture_binding = FIRST_TEXTURE_BINDING;
        let mut slot_lookup = HashMap::with_capacity(manifest.variables.len());
        let slots = manifest
            .variables
            .iter()
            .enumerate()
            .map(|(index, desc)| {
                slot_lookup.insert(desc.name.clone(), index as u32);
                let texture_binding = (desc.kind == VariableKind::Texture).then(|| {
                    let binding = next_texture_binding;
                    next_texture_binding += 1;
                    binding
                });
                Slot {
                    desc: desc.clone(),
                    offset: layout.entry(&desc.name).map(|entry| entry.offset),
                    texture_binding,
                    texture: None,
                }
            })
            .collect();

        let technique_lookup = manifest
            .techniques
            .iter()
            .enumerate()
            .map(|(index, technique)| (technique.name.clone(), index as u32))
            .collect();

        Self {
            techniques: manifest.techniques.clone(),
            technique_lookup,
            slots,
            slot_lookup,
            shadow: UniformShadow::new(layout.size()),
            layout,
        }
    }

    pub fn layout(&self) -> &UniformBlockLayout {
        &self.layout
    }

    pub fn technique_count(&self) -> usize {
        self.techniques.len()
    }

    pub fn variable_count(&self) -> usize {
        self.slots.len()
    }

    /// Texture binding index and bound handle of every texture slot.
    pub fn texture_bindings(&self) -> impl Iterator<Item = (u32, Option<TextureHandle>)> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| slot.texture_binding.map(|binding| (binding, slot.texture)))
    }

    pub fn texture_binding(&self, name: &str) -> Option<u32> {
        let index = *self.slot_lookup.get(name)?;
        self.slots[index as usize].texture_binding
    }

    pub fn dirty(&self) -> Option<Range<usize>> {
        self.shadow.dirty()
    }

    /// See [`UniformShadow::take_dirty`].
    pub fn take_dirty(&mut self) -> Option<(usize, &[u8])> {
        self.shadow.take_dirty()
    }

    pub fn uniform_bytes(&self) -> &[u8] {
        self.shadow.read(0, self.shadow.len())
    }
}

impl EffectBackend for SlotTable {
    fn technique(&self, name: &str) -> Option<(TechniqueHandle, &TechniqueDesc)> {
        let index = *self.technique_lookup.get(name)?;
        Some((TechniqueHandle::new(index), &self.techniques[index as usize]))
    }

    fn variable(&self, name: &str) -> Option<(VariableHandle, &VariableDesc)> {
        let index = *self.slot_lookup.get(name)?;
        Some((VariableHandle::new(index), &self.slots[index as usize].desc))
    }

    fn write(&mut self, variable: VariableHandle, bytes: &[u8]) {
        if let Some(offset) = self
            .slots
            .get(variable.index() as usize)
            .and_then(|slot| slot.offset)
        {
            self.shadow.write(offset, bytes);
        }
    }

    fn read(&self, variable: VariableHandle) -> Vec<u8> {
        self.slots
            .get(variable.index() as usize)
            .and_then(|slot| {
                slot.offset
                    .map(|offset| self.shadow.read(offset, slot.desc.byte_size()).to_vec())
            })
            .unwrap_or_default()
    }

    fn bind_texture(&mut self, variable: VariableHandle, texture: Option<TextureHandle>) {
        if let Some(slot) = self.slots.get_mut(variable.index() as usize) {
            slot.texture = texture;
        }
    }

    fn texture(&self, variable: VariableHandle) -> Option<TextureHandle> {
        self.slots
            .get(variable.index() as usize)
            .and_then(|slot| slot.texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{ShaderValue, ShaderVariable, TextureVariable};
    use crate::effect::telemetry::null_telemetry;
    use crate::effect::Effect;
    use crate::lights::{PointLight, MAX_POINT_LIGHTS};
    use crate::technique::{RenderMode, TechniqueKey, VertexFormat};
    use glam::{Mat4, Vec2, Vec3};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manifest() -> EffectManifest {
        EffectManifest::new("Slots")
            .with_techniques(&[TechniqueKey::drawing(
                RenderMode::Forward,
                VertexFormat::PositionNormalTexture,
                false,
            )])
            .with_variables([
                f32::desc("alpha"),
                VariableDesc::texture("diffuse_map"),
                Vec3::desc("eye_position"),
                Mat4::desc("world"),
                VariableDesc::texture("normal_map"),
                Vec2::desc("texel_size"),
                PointLight::array_desc("point_lights", MAX_POINT_LIGHTS),
                VariableDesc::texture("shadow_map"),
            ])
    }

    #[test]
    fn writes_land_at_layout_offsets() {
        let manifest = manifest();
        let mut table = SlotTable::new(&manifest);
        let (handle, _) = table.variable("eye_position").unwrap();
        let eye = Vec3::new(1.0, 2.0, 3.0);
        table.write(handle, bytemuck::bytes_of(&eye.to_array()));

        let offset = table.layout().entry("eye_position").unwrap().offset;
        assert_eq!(offset, 16);
        assert_eq!(table.dirty(), Some(offset..offset + 12));
        assert_eq!(
            &table.uniform_bytes()[offset..offset + 12],
            bytemuck::bytes_of(&eye.to_array())
        );
    }

    #[test]
    fn reads_return_the_declared_size() {
        let manifest = manifest();
        let table = SlotTable::new(&manifest);
        for desc in &manifest.variables {
            let (handle, _) = table.variable(&desc.name).unwrap();
            let expected = if desc.kind == VariableKind::Texture {
                0
            } else {
                desc.byte_size()
            };
            assert_eq!(table.read(handle).len(), expected, "{}", desc.name);
        }
    }

    #[test]
    fn texture_bindings_follow_manifest_order() {
        let table = SlotTable::new(&manifest());
        assert_eq!(table.texture_binding("diffuse_map"), Some(2));
        assert_eq!(table.texture_binding("normal_map"), Some(3));
        assert_eq!(table.texture_binding("shadow_map"), Some(4));
        assert_eq!(table.texture_binding("world"), None);
        assert_eq!(table.texture_bindings().count(), 3);
    }

    #[test]
    fn binders_drive_the_table() {
        let table = Rc::new(RefCell::new(SlotTable::new(&manifest())));
        let effect = Effect::shared("Slots", table.clone());

        let world = ShaderVariable::<Mat4>::bind(&effect, "world").unwrap();
        world.set(Mat4::from_translation(Vec3::X));
        assert_eq!(world.get(), Mat4::from_translation(Vec3::X));

        let normal_map =
            TextureVariable::bind(&effect, "normal_map", null_telemetry()).unwrap();
        normal_map.set(Some(TextureHandle::new(7)));
        assert_eq!(normal_map.get(), Some(TextureHandle::new(7)));

        let bound: Vec<_> = table.borrow().texture_bindings().collect();
        assert_eq!(
            bound,
            vec![(2, None), (3, Some(TextureHandle::new(7))), (4, None)]
        );
        assert!(effect.technique("Forward_PositionNormalTexture").is_ok());
    }

    #[test]
    fn take_dirty_clears_the_range() {
        let manifest = manifest();
        let mut table = SlotTable::new(&manifest);
        let (handle, _) = table.variable("alpha").unwrap();
        table.write(handle, &1.5f32.to_ne_bytes());
        let (offset, bytes) = table.take_dirty().unwrap();
        assert_eq!((offset, bytes.len()), (0, 4));
        assert!(table.dirty().is_none());
    }
}
