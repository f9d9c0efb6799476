use glam::Mat4;

use crate::binding::{ShaderValue, ShaderVariable};
use crate::effect::{Effect, EffectManifest, Result};
use crate::technique::{RenderMode, TechniqueDispatch, TechniqueKey, TechniqueTable, VertexFormat};

use super::common::{
    CameraBindings, FogBindings, GlobalBindings, LightBindings, ObjectBindings, ShadowBindings,
    SkinningBindings,
};
use super::{BindingContext, FrameState, GlobalState, ObjectState, UpdateGuard, UpdateStage};

const FAMILY: &str = "Basic";

const LIT_FORMATS: [VertexFormat; 7] = [
    VertexFormat::PositionColor,
    VertexFormat::PositionTexture,
    VertexFormat::PositionNormalColor,
    VertexFormat::PositionNormalTexture,
    VertexFormat::PositionNormalTextureSkinned,
    VertexFormat::PositionNormalTextureTangent,
    VertexFormat::PositionNormalTextureTangentSkinned,
];

const SHADOW_FORMATS: [VertexFormat; 4] = [
    VertexFormat::PositionNormalTexture,
    VertexFormat::PositionNormalTextureSkinned,
    VertexFormat::PositionNormalTextureTangent,
    VertexFormat::PositionNormalTextureTangentSkinned,
];

fn supports_instancing(format: VertexFormat) -> bool {
    !matches!(
        format,
        VertexFormat::PositionColor | VertexFormat::PositionTexture
    )
}

/// General mesh effect: forward and deferred lit drawing plus shadow casting,
/// with skinned and instanced variants.
pub struct BasicEffect {
    effect: Effect,
    techniques: TechniqueTable,
    guard: UpdateGuard,
    camera: CameraBindings,
    fog: FogBindings,
    lights: LightBindings,
    shadow: ShadowBindings,
    globals: GlobalBindings,
    object: ObjectBindings,
    skinning: SkinningBindings,
    instance_texture_index: ShaderVariable<u32>,
}

impl BasicEffect {
    pub fn technique_keys() -> Vec<TechniqueKey> {
        let mut keys = Vec::new();
        for mode in [RenderMode::Forward, RenderMode::Deferred] {
            for format in LIT_FORMATS {
                keys.push(TechniqueKey::drawing(mode, format, false));
                if supports_instancing(format) {
                    keys.push(TechniqueKey::drawing(mode, format, true));
                }
            }
        }
        for format in SHADOW_FORMATS {
            keys.push(TechniqueKey::drawing(RenderMode::ShadowMap, format, false));
            keys.push(TechniqueKey::drawing(RenderMode::ShadowMap, format, true));
        }
        keys
    }

    pub fn manifest() -> EffectManifest {
        EffectManifest::new(FAMILY)
            .with_techniques(&Self::technique_keys())
            .with_variables(CameraBindings::variables())
            .with_variables(FogBindings::variables())
            .with_variables(LightBindings::variables())
            .with_variables(ShadowBindings::variables())
            .with_variables(GlobalBindings::variables())
            .with_variables(ObjectBindings::variables())
            .with_variables(SkinningBindings::variables())
            .with_variables([u32::desc("instance_texture_index")])
    }

    pub fn new(effect: &Effect, context: &BindingContext) -> Result<Self> {
        let telemetry = &context.telemetry;
        let wrapper = Self {
            effect: effect.clone(),
            techniques: TechniqueTable::resolve(effect, FAMILY, &Self::technique_keys())?,
            guard: UpdateGuard::new(FAMILY, context.order_check),
            camera: CameraBindings::bind(effect)?,
            fog: FogBindings::bind(effect)?,
            lights: LightBindings::bind(effect)?,
            shadow: ShadowBindings::bind(effect, telemetry)?,
            globals: GlobalBindings::bind(effect, telemetry)?,
            object: ObjectBindings::bind(effect, telemetry)?,
            skinning: SkinningBindings::bind(effect)?,
            instance_texture_index: ShaderVariable::bind(effect, "instance_texture_index")?,
        };

        log::info!(
            "Created {FAMILY} effect from '{}' with {} techniques",
            effect.name(),
            wrapper.techniques.len()
        );
        Ok(wrapper)
    }

    pub fn update_globals(&self, globals: &GlobalState) {
        self.guard.record(UpdateStage::Globals);
        self.globals.update(globals);
    }

    pub fn update_per_frame(&self, frame: &FrameState) -> Result<()> {
        self.guard.record(UpdateStage::PerFrame);
        self.camera.update(frame);
        self.fog.update(frame);
        self.lights.update(frame)?;
        self.shadow.update(frame);
        Ok(())
    }

    pub fn update_per_object(&self, object: &ObjectState) {
        self.guard.record(UpdateStage::PerObject);
        self.object.update(object);
    }

    /// Writes the bone palette. Returns whether anything was written.
    pub fn update_per_skinning(&self, bones: Option<&[Mat4]>) -> Result<bool> {
        self.guard.record(UpdateStage::PerSkinning);
        self.skinning.update(bones)
    }

    pub fn update_per_instance(&self, texture_index: u32) {
        self.guard.record(UpdateStage::PerInstance);
        self.instance_texture_index.set(texture_index);
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

    pub fn skinning(&self) -> &SkinningBindings {
        &self.skinning
    }

    pub fn camera(&self) -> &CameraBindings {
        &self.camera
    }
}

impl TechniqueDispatch for BasicEffect {
    fn techniques(&self) -> &TechniqueTable {
        &self.techniques
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technique::assert_dispatch_over_every_descriptor;
    use crate::effect::{EffectError, MemoryEffect};
    use crate::settings::OrderCheck;
    use crate::technique::{DrawCallDescriptor, InputLayout, PipelineStage};

    fn basic() -> BasicEffect {
        let effect = Effect::new(FAMILY, MemoryEffect::from_manifest(&BasicEffect::manifest()));
        let context = BindingContext::default();
        BasicEffect::new(&effect, &context).unwrap()
    }

    #[test]
    fn every_supported_key_selects_a_matching_layout() {
        let basic = basic();
        for key in BasicEffect::technique_keys() {
            let technique = basic.select(&key.descriptor()).unwrap();
            assert_eq!(
                technique.layout(),
                &InputLayout::for_format(key.format, key.instanced)
            );
            assert_eq!(technique.name(), key.technique_name());
        }
    }

    #[test]
    fn unsupported_tuples_fail() {
        let basic = basic();
        let unsupported = [
            DrawCallDescriptor::new(VertexFormat::Terrain),
            DrawCallDescriptor::new(VertexFormat::PositionColor).instanced(true),
            DrawCallDescriptor::new(VertexFormat::PositionColor).with_mode(RenderMode::ShadowMap),
            DrawCallDescriptor::new(VertexFormat::PositionNormalTexture)
                .with_stage(PipelineStage::StreamOut),
        ];
        for descriptor in unsupported {
            assert!(matches!(
                basic.select(&descriptor),
                Err(EffectError::UnsupportedCombination { family: "Basic", .. })
            ));
        }
    }

    #[test]
    fn missing_variable_makes_construction_fail() {
        let mut manifest = BasicEffect::manifest();
        manifest.remove_variable("bone_transforms");
        let effect = Effect::new(FAMILY, MemoryEffect::from_manifest(&manifest));

        let result = BasicEffect::new(&effect, &BindingContext::default());
        assert!(matches!(
            result,
            Err(EffectError::MissingVariable { ref name, .. }) if name == "bone_transforms"
        ));
    }

    #[test]
    fn out_of_order_updates_are_counted() {
        let effect = Effect::new(FAMILY, MemoryEffect::from_manifest(&BasicEffect::manifest()));
        let context = BindingContext {
            order_check: OrderCheck::Warn,
            ..BindingContext::default()
        };
        let basic = BasicEffect::new(&effect, &context).unwrap();

        basic.update_per_object(&ObjectState::default());
        basic.update_per_instance(3);
        assert_eq!(basic.guard().violations(), 1);
    }

    #[test]
    fn every_descriptor_outside_the_table_is_rejected() {
        let dispatch = basic();
        // Rotation is ignored for mesh formats, so each key is reached three ways.
        let accepted =
            assert_dispatch_over_every_descriptor(&dispatch, &BasicEffect::technique_keys());
        assert_eq!(accepted, 96);
    }
}
