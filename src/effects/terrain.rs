use glam::{Mat4, Vec2};

use crate::binding::{ShaderValue, ShaderVariable, TextureVariable};
use crate::effect::{Effect, EffectManifest, Result, VariableDesc};
use crate::technique::{RenderMode, TechniqueDispatch, TechniqueKey, TechniqueTable, VertexFormat};

use super::common::{CameraBindings, FogBindings, GlobalBindings, LightBindings, ShadowBindings};
use super::{BindingContext, FrameState, GlobalState, TerrainState, UpdateGuard, UpdateStage};

const FAMILY: &str = "Terrain";

struct TerrainBindings {
    world: ShaderVariable<Mat4>,
    material_index: ShaderVariable<u32>,
    height_map: TextureVariable,
    blend_map: TextureVariable,
    layer_maps: TextureVariable,
    normal_maps: TextureVariable,
    alpha: ShaderVariable<f32>,
    slope_range: ShaderVariable<Vec2>,
    texture_scale: ShaderVariable<f32>,
    cell_spacing: ShaderVariable<f32>,
}

/// Height-mapped terrain patches. Drawing stage only, never instanced.
pub struct TerrainEffect {
    effect: Effect,
    techniques: TechniqueTable,
    guard: UpdateGuard,
    camera: CameraBindings,
    fog: FogBindings,
    lights: LightBindings,
    shadow: ShadowBindings,
    globals: GlobalBindings,
    terrain: TerrainBindings,
}

impl TerrainEffect {
    pub fn technique_keys() -> Vec<TechniqueKey> {
        [RenderMode::Forward, RenderMode::Deferred, RenderMode::ShadowMap]
            .into_iter()
            .map(|mode| TechniqueKey::drawing(mode, VertexFormat::Terrain, false))
            .collect()
    }

    pub fn manifest() -> EffectManifest {
        EffectManifest::new(FAMILY)
            .with_techniques(&Self::technique_keys())
            .with_variables(CameraBindings::variables())
            .with_variables(FogBindings::variables())
            .with_variables(LightBindings::variables())
            .with_variables(ShadowBindings::variables())
            .with_variables(GlobalBindings::variables())
            .with_variables([
                Mat4::desc("world"),
                u32::desc("material_index"),
                VariableDesc::texture("height_map"),
                VariableDesc::texture("blend_map"),
                VariableDesc::texture("layer_maps"),
                VariableDesc::texture("layer_normal_maps"),
                f32::desc("terrain_alpha"),
                Vec2::desc("slope_range"),
                f32::desc("texture_scale"),
                f32::desc("cell_spacing"),
            ])
    }

    pub fn new(effect: &Effect, context: &BindingContext) -> Result<Self> {
        let telemetry = &context.telemetry;
        let terrain = TerrainBindings {
            world: ShaderVariable::bind(effect, "world")?,
            material_index: ShaderVariable::bind(effect, "material_index")?,
            height_map: TextureVariable::bind(effect, "height_map", telemetry.clone())?,
            blend_map: TextureVariable::bind(effect, "blend_map", telemetry.clone())?,
            layer_maps: TextureVariable::bind(effect, "layer_maps", telemetry.clone())?,
            normal_maps: TextureVariable::bind(effect, "layer_normal_maps", telemetry.clone())?,
            alpha: ShaderVariable::bind(effect, "terrain_alpha")?,
            slope_range: ShaderVariable::bind(effect, "slope_range")?,
            texture_scale: ShaderVariable::bind(effect, "texture_scale")?,
            cell_spacing: ShaderVariable::bind(effect, "cell_spacing")?,
        };

        let wrapper = Self {
            effect: effect.clone(),
            techniques: TechniqueTable::resolve(effect, FAMILY, &Self::technique_keys())?,
            guard: UpdateGuard::new(FAMILY, context.order_check),
            camera: CameraBindings::bind(effect)?,
            fog: FogBindings::bind(effect)?,
            lights: LightBindings::bind(effect)?,
            shadow: ShadowBindings::bind(effect, telemetry)?,
            globals: GlobalBindings::bind(effect, telemetry)?,
            terrain,
        };

        log::info!("Created {FAMILY} effect from '{}'", effect.name());
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

    pub fn update_per_object(&self, state: &TerrainState) {
        self.guard.record(UpdateStage::PerObject);
        let terrain = &self.terrain;
        terrain.world.set(state.world);
        terrain.material_index.set(state.material_index);
        terrain.height_map.set(state.height_map);
        terrain.blend_map.set(state.blend_map);
        terrain.layer_maps.set(state.layer_maps);
        terrain.normal_maps.set(state.normal_maps);
        terrain.alpha.set(state.alpha.clamp(0.0, 1.0));
        terrain.slope_range.set(state.slope_range);
        terrain.texture_scale.set(state.texture_scale);
        terrain.cell_spacing.set(state.cell_spacing);
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn guard(&self) -> &UpdateGuard {
        &self.guard
    }

    pub fn alpha(&self) -> f32 {
        self.terrain.alpha.get()
    }

    pub fn slope_range(&self) -> Vec2 {
        self.terrain.slope_range.get()
    }
}

impl TechniqueDispatch for TerrainEffect {
    fn techniques(&self) -> &TechniqueTable {
        &self.techniques
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technique::assert_dispatch_over_every_descriptor;
    use crate::effect::{EffectError, MemoryEffect};
    use crate::lights::LightsData;
    use crate::technique::DrawCallDescriptor;

    fn terrain() -> TerrainEffect {
        let effect = Effect::new(FAMILY, MemoryEffect::from_manifest(&TerrainEffect::manifest()));
        TerrainEffect::new(&effect, &BindingContext::default()).unwrap()
    }

    #[test]
    fn supports_three_modes_only() {
        let terrain = terrain();
        assert_eq!(terrain.techniques().len(), 3);

        for mode in [RenderMode::Forward, RenderMode::Deferred, RenderMode::ShadowMap] {
            let descriptor = DrawCallDescriptor::new(VertexFormat::Terrain).with_mode(mode);
            assert!(terrain.select(&descriptor).is_ok());
        }

        let instanced = DrawCallDescriptor::new(VertexFormat::Terrain).instanced(true);
        assert!(matches!(
            terrain.select(&instanced),
            Err(EffectError::UnsupportedCombination { .. })
        ));
        let mesh = DrawCallDescriptor::new(VertexFormat::PositionNormalTexture);
        assert!(terrain.select(&mesh).is_err());
    }

    #[test]
    fn per_object_writes_terrain_parameters() {
        let terrain = terrain();
        let lights = LightsData::new();
        let frame = FrameState::new(Mat4::IDENTITY, Mat4::IDENTITY, &lights);
        terrain.update_per_frame(&frame).unwrap();
        terrain.update_per_object(&TerrainState {
            alpha: 1.5,
            slope_range: Vec2::new(0.2, 0.6),
            ..TerrainState::default()
        });

        assert_eq!(terrain.alpha(), 1.0);
        assert_eq!(terrain.slope_range(), Vec2::new(0.2, 0.6));
        assert_eq!(terrain.guard().violations(), 0);
    }

    #[test]
    fn only_terrain_keys_are_accepted() {
        let dispatch = terrain();
        let accepted =
            assert_dispatch_over_every_descriptor(&dispatch, &TerrainEffect::technique_keys());
        assert_eq!(accepted, 9);
    }
}
