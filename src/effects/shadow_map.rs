use glam::Mat4;

use crate::binding::{ShaderValue, ShaderVariable, TextureVariable};
use crate::effect::{Effect, EffectManifest, Result, TextureHandle, VariableDesc};
use crate::technique::{RenderMode, TechniqueDispatch, TechniqueKey, TechniqueTable, VertexFormat};

use super::common::SkinningBindings;
use super::{BindingContext, UpdateGuard, UpdateStage};

const FAMILY: &str = "ShadowMap";

const CASTER_FORMATS: [VertexFormat; 3] = [
    VertexFormat::Position,
    VertexFormat::PositionNormalTexture,
    VertexFormat::PositionNormalTextureSkinned,
];

/// Depth-only rendering from a light's point of view.
pub struct ShadowMapEffect {
    effect: Effect,
    techniques: TechniqueTable,
    guard: UpdateGuard,
    light_view_projection: ShaderVariable<Mat4>,
    world: ShaderVariable<Mat4>,
    alpha_map: TextureVariable,
    alpha_cutoff: ShaderVariable<f32>,
    skinning: SkinningBindings,
}

impl ShadowMapEffect {
    pub fn technique_keys() -> Vec<TechniqueKey> {
        CASTER_FORMATS
            .into_iter()
            .flat_map(|format| {
                [false, true]
                    .map(|instanced| TechniqueKey::drawing(RenderMode::ShadowMap, format, instanced))
            })
            .collect()
    }

    pub fn manifest() -> EffectManifest {
        EffectManifest::new(FAMILY)
            .with_techniques(&Self::technique_keys())
            .with_variables([
                Mat4::desc("light_view_projection"),
                Mat4::desc("world"),
                VariableDesc::texture("alpha_map"),
                f32::desc("alpha_cutoff"),
            ])
            .with_variables(SkinningBindings::variables())
    }

    pub fn new(effect: &Effect, context: &BindingContext) -> Result<Self> {
        let wrapper = Self {
            effect: effect.clone(),
            techniques: TechniqueTable::resolve(effect, FAMILY, &Self::technique_keys())?,
            guard: UpdateGuard::new(FAMILY, context.order_check),
            light_view_projection: ShaderVariable::bind(effect, "light_view_projection")?,
            world: ShaderVariable::bind(effect, "world")?,
            alpha_map: TextureVariable::bind(effect, "alpha_map", context.telemetry.clone())?,
            alpha_cutoff: ShaderVariable::bind(effect, "alpha_cutoff")?,
            skinning: SkinningBindings::bind(effect)?,
        };

        log::info!("Created {FAMILY} effect from '{}'", effect.name());
        Ok(wrapper)
    }

    pub fn update_per_frame(&self, light_view_projection: Mat4) {
        self.guard.record(UpdateStage::PerFrame);
        self.light_view_projection.set(light_view_projection);
    }

    /// `alpha_map` enables alpha-tested casters; `None` casts solid.
    pub fn update_per_object(&self, world: Mat4, alpha_map: Option<TextureHandle>, alpha_cutoff: f32) {
        self.guard.record(UpdateStage::PerObject);
        self.world.set(world);
        self.alpha_map.set(alpha_map);
        self.alpha_cutoff.set(alpha_cutoff);
    }

    pub fn update_per_skinning(&self, bones: Option<&[Mat4]>) -> Result<bool> {
        self.guard.record(UpdateStage::PerSkinning);
        self.skinning.update(bones)
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn guard(&self) -> &UpdateGuard {
        &self.guard
    }

    pub fn skinning(&self) -> &SkinningBindings {
        &self.skinning
    }

    pub fn light_view_projection(&self) -> Mat4 {
        self.light_view_projection.get()
    }
}

impl TechniqueDispatch for ShadowMapEffect {
    fn techniques(&self) -> &TechniqueTable {
        &self.techniques
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technique::assert_dispatch_over_every_descriptor;
    use crate::effect::{EffectError, MemoryEffect};
    use crate::technique::DrawCallDescriptor;
    use glam::Vec3;

    fn shadow_map() -> ShadowMapEffect {
        let effect = Effect::new(
            FAMILY,
            MemoryEffect::from_manifest(&ShadowMapEffect::manifest()),
        );
        ShadowMapEffect::new(&effect, &BindingContext::default()).unwrap()
    }

    #[test]
    fn casters_select_by_format_and_instancing() {
        let shadow = shadow_map();
        assert_eq!(shadow.techniques().len(), 6);

        let skinned = DrawCallDescriptor::new(VertexFormat::PositionNormalTextureSkinned)
            .with_mode(RenderMode::ShadowMap);
        let single = shadow.select(&skinned).unwrap();
        let batched = shadow.select(&skinned.instanced(true)).unwrap();
        assert_ne!(single.handle(), batched.handle());
        assert_eq!(
            batched.name(),
            "ShadowMap_PositionNormalTextureSkinned_Instanced"
        );
    }

    #[test]
    fn only_shadow_mode_is_supported() {
        let shadow = shadow_map();
        let forward = DrawCallDescriptor::new(VertexFormat::Position);
        assert!(matches!(
            shadow.select(&forward),
            Err(EffectError::UnsupportedCombination { family: "ShadowMap", .. })
        ));
    }

    #[test]
    fn skinning_without_bones_keeps_previous_pose() {
        let shadow = shadow_map();
        let pose = vec![Mat4::from_translation(Vec3::X); 8];

        shadow.update_per_frame(Mat4::IDENTITY);
        shadow.update_per_object(Mat4::IDENTITY, None, 0.5);
        assert!(shadow.update_per_skinning(Some(&pose)).unwrap());
        assert!(!shadow.update_per_skinning(None).unwrap());

        assert_eq!(&shadow.skinning().bones()[..8], &pose[..]);
    }

    #[test]
    fn only_caster_keys_are_accepted() {
        let dispatch = shadow_map();
        let accepted =
            assert_dispatch_over_every_descriptor(&dispatch, &ShadowMapEffect::technique_keys());
        assert_eq!(accepted, 18);
    }
}
