use glam::Vec2;

use crate::binding::{ShaderValue, ShaderVariable, TextureVariable};
use crate::effect::{Effect, EffectManifest, Result, TextureHandle, VariableDesc};
use crate::technique::{RenderMode, TechniqueDispatch, TechniqueKey, TechniqueTable, VertexFormat};

use super::common::{CameraBindings, FogBindings, LightBindings};
use super::{BindingContext, FrameState, UpdateGuard, UpdateStage};

const FAMILY: &str = "Billboard";

/// Per-object billboard parameters: a texture array the vertices index into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BillboardState {
    pub textures: Option<TextureHandle>,
    pub texture_count: u32,
    pub material_index: u32,
    /// Scales the per-vertex quad size.
    pub size_scale: Vec2,
}

impl Default for BillboardState {
    fn default() -> Self {
        Self {
            textures: None,
            texture_count: 0,
            material_index: 0,
            size_scale: Vec2::ONE,
        }
    }
}

/// Camera-facing quads expanded from point vertices.
pub struct BillboardEffect {
    effect: Effect,
    techniques: TechniqueTable,
    guard: UpdateGuard,
    camera: CameraBindings,
    fog: FogBindings,
    lights: LightBindings,
    textures: TextureVariable,
    texture_count: ShaderVariable<u32>,
    material_index: ShaderVariable<u32>,
    size_scale: ShaderVariable<Vec2>,
}

impl BillboardEffect {
    pub fn technique_keys() -> Vec<TechniqueKey> {
        [RenderMode::Forward, RenderMode::Deferred, RenderMode::ShadowMap]
            .into_iter()
            .map(|mode| TechniqueKey::drawing(mode, VertexFormat::Billboard, false))
            .collect()
    }

    pub fn manifest() -> EffectManifest {
        EffectManifest::new(FAMILY)
            .with_techniques(&Self::technique_keys())
            .with_variables(CameraBindings::variables())
            .with_variables(FogBindings::variables())
            .with_variables(LightBindings::variables())
            .with_variables([
                VariableDesc::texture("billboard_textures"),
                u32::desc("texture_count"),
                u32::desc("material_index"),
                Vec2::desc("size_scale"),
            ])
    }

    pub fn new(effect: &Effect, context: &BindingContext) -> Result<Self> {
        let wrapper = Self {
            effect: effect.clone(),
            techniques: TechniqueTable::resolve(effect, FAMILY, &Self::technique_keys())?,
            guard: UpdateGuard::new(FAMILY, context.order_check),
            camera: CameraBindings::bind(effect)?,
            fog: FogBindings::bind(effect)?,
            lights: LightBindings::bind(effect)?,
            textures: TextureVariable::bind(
                effect,
                "billboard_textures",
                context.telemetry.clone(),
            )?,
            texture_count: ShaderVariable::bind(effect, "texture_count")?,
            material_index: ShaderVariable::bind(effect, "material_index")?,
            size_scale: ShaderVariable::bind(effect, "size_scale")?,
        };

        log::info!("Created {FAMILY} effect from '{}'", effect.name());
        Ok(wrapper)
    }

    pub fn update_per_frame(&self, frame: &FrameState) -> Result<()> {
        self.guard.record(UpdateStage::PerFrame);
        self.camera.update(frame);
        self.fog.update(frame);
        self.lights.update(frame)
    }

    pub fn update_per_object(&self, state: &BillboardState) {
        self.guard.record(UpdateStage::PerObject);
        self.textures.set(state.textures);
        self.texture_count.set(state.texture_count);
        self.material_index.set(state.material_index);
        self.size_scale.set(state.size_scale);
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn guard(&self) -> &UpdateGuard {
        &self.guard
    }

    pub fn lights(&self) -> &LightBindings {
        &self.lights
    }
}

impl TechniqueDispatch for BillboardEffect {
    fn techniques(&self) -> &TechniqueTable {
        &self.techniques
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technique::assert_dispatch_over_every_descriptor;
    use crate::effect::{MemoryEffect, RebindCounter, Telemetry};
    use crate::lights::LightsData;
    use crate::settings::OrderCheck;
    use crate::technique::DrawCallDescriptor;
    use glam::Mat4;

    #[test]
    fn selects_billboard_techniques_only() {
        let effect = Effect::new(
            FAMILY,
            MemoryEffect::from_manifest(&BillboardEffect::manifest()),
        );
        let billboard = BillboardEffect::new(&effect, &BindingContext::default()).unwrap();

        let shadow = DrawCallDescriptor::new(VertexFormat::Billboard).with_mode(RenderMode::ShadowMap);
        assert_eq!(
            billboard.select(&shadow).unwrap().name(),
            "ShadowMap_Billboard"
        );
        assert!(billboard
            .select(&DrawCallDescriptor::new(VertexFormat::Particle))
            .is_err());
    }

    #[test]
    fn texture_array_is_rebound_only_on_change() {
        let counter = RebindCounter::new();
        let telemetry: Telemetry = counter.clone();
        let context = BindingContext::new(telemetry, OrderCheck::Panic);
        let effect = Effect::new(
            FAMILY,
            MemoryEffect::from_manifest(&BillboardEffect::manifest()),
        );
        let billboard = BillboardEffect::new(&effect, &context).unwrap();

        let lights = LightsData::new();
        billboard
            .update_per_frame(&FrameState::new(Mat4::IDENTITY, Mat4::IDENTITY, &lights))
            .unwrap();

        let state = BillboardState {
            textures: Some(TextureHandle::new(4)),
            texture_count: 3,
            ..BillboardState::default()
        };
        billboard.update_per_object(&state);
        billboard.update_per_object(&state);

        assert_eq!(counter.total(), 1);
        assert_eq!(counter.for_slot("billboard_textures"), 1);
    }

    #[test]
    fn only_billboard_keys_are_accepted() {
        let effect = Effect::new(
            FAMILY,
            MemoryEffect::from_manifest(&BillboardEffect::manifest()),
        );
        let dispatch = BillboardEffect::new(&effect, &BindingContext::default()).unwrap();
        let accepted =
            assert_dispatch_over_every_descriptor(&dispatch, &BillboardEffect::technique_keys());
        assert_eq!(accepted, 9);
    }
}
