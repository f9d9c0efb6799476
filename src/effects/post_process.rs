use glam::Vec2;

use crate::binding::{ShaderValue, ShaderVariable, TextureVariable};
use crate::effect::{Effect, EffectManifest, Result, TechniqueDesc, TextureHandle, VariableDesc};
use crate::settings::Resolution;
use crate::technique::{
    InputLayout, RenderMode, Technique, TechniqueDispatch, TechniqueKey, TechniqueTable,
    VertexFormat,
};

use super::common::{texel_size_variable, FogBindings};
use super::{BindingContext, FrameState, UpdateGuard, UpdateStage};

const FAMILY: &str = "PostProcess";

/// Full-screen passes. `Composite` is the generic forward technique; the
/// others are looked up by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostProcessPass {
    BrightPass,
    BlurHorizontal,
    BlurVertical,
    Composite,
}

impl PostProcessPass {
    pub const NAMED: [PostProcessPass; 3] = [
        PostProcessPass::BrightPass,
        PostProcessPass::BlurHorizontal,
        PostProcessPass::BlurVertical,
    ];

    pub fn technique_name(&self) -> String {
        match self {
            PostProcessPass::BrightPass => "PostProcess_BrightPass".to_string(),
            PostProcessPass::BlurHorizontal => "PostProcess_BlurHorizontal".to_string(),
            PostProcessPass::BlurVertical => "PostProcess_BlurVertical".to_string(),
            PostProcessPass::Composite => COMPOSITE.technique_name(),
        }
    }
}

const COMPOSITE: TechniqueKey =
    TechniqueKey::drawing(RenderMode::Forward, VertexFormat::PositionTexture, false);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomSettings {
    pub threshold: f32,
    pub intensity: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            intensity: 1.0,
        }
    }
}

/// Render targets sampled by the post-process chain this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PostProcessInputs {
    pub scene: Option<TextureHandle>,
    pub blur: Option<TextureHandle>,
    pub depth: Option<TextureHandle>,
    pub bloom: BloomSettings,
}

pub struct PostProcessEffect {
    effect: Effect,
    techniques: TechniqueTable,
    composite: Technique,
    bright_pass: Technique,
    blur_horizontal: Technique,
    blur_vertical: Technique,
    guard: UpdateGuard,
    fog: FogBindings,
    scene_map: TextureVariable,
    blur_map: TextureVariable,
    depth_map: TextureVariable,
    texel_size: ShaderVariable<Vec2>,
    bloom_threshold: ShaderVariable<f32>,
    bloom_intensity: ShaderVariable<f32>,
}

impl PostProcessEffect {
    pub fn manifest() -> EffectManifest {
        let layout = InputLayout::for_format(VertexFormat::PositionTexture, false);
        let mut manifest = EffectManifest::new(FAMILY).with_techniques(&[COMPOSITE]);
        for pass in PostProcessPass::NAMED {
            manifest = manifest.with_technique(TechniqueDesc::new(
                &pass.technique_name(),
                layout.clone(),
            ));
        }

        manifest
            .with_variables(FogBindings::variables())
            .with_variables([
                VariableDesc::texture("scene_map"),
                VariableDesc::texture("blur_map"),
                VariableDesc::texture("depth_map"),
                texel_size_variable(),
                f32::desc("bloom_threshold"),
                f32::desc("bloom_intensity"),
            ])
    }

    pub fn new(effect: &Effect, context: &BindingContext) -> Result<Self> {
        let named = |pass: PostProcessPass| {
            Technique::resolve(
                effect,
                &pass.technique_name(),
                VertexFormat::PositionTexture,
                false,
            )
        };
        let telemetry = &context.telemetry;

        let wrapper = Self {
            effect: effect.clone(),
            techniques: TechniqueTable::resolve(effect, FAMILY, &[COMPOSITE])?,
            composite: named(PostProcessPass::Composite)?,
            bright_pass: named(PostProcessPass::BrightPass)?,
            blur_horizontal: named(PostProcessPass::BlurHorizontal)?,
            blur_vertical: named(PostProcessPass::BlurVertical)?,
            guard: UpdateGuard::new(FAMILY, context.order_check),
            fog: FogBindings::bind(effect)?,
            scene_map: TextureVariable::bind(effect, "scene_map", telemetry.clone())?,
            blur_map: TextureVariable::bind(effect, "blur_map", telemetry.clone())?,
            depth_map: TextureVariable::bind(effect, "depth_map", telemetry.clone())?,
            texel_size: ShaderVariable::bind(effect, "texel_size")?,
            bloom_threshold: ShaderVariable::bind(effect, "bloom_threshold")?,
            bloom_intensity: ShaderVariable::bind(effect, "bloom_intensity")?,
        };
        wrapper.set_resolution(context.resolution);

        log::info!("Created {FAMILY} effect from '{}'", effect.name());
        Ok(wrapper)
    }

    /// Call when the targets are resized.
    pub fn set_resolution(&self, resolution: Resolution) {
        self.texel_size.set(resolution.texel_size());
    }

    pub fn update_per_frame(&self, frame: &FrameState, inputs: &PostProcessInputs) {
        self.guard.record(UpdateStage::PerFrame);
        self.fog.update(frame);
        self.scene_map.set(inputs.scene);
        self.blur_map.set(inputs.blur);
        self.depth_map.set(inputs.depth);
        self.bloom_threshold.set(inputs.bloom.threshold);
        self.bloom_intensity.set(inputs.bloom.intensity.max(0.0));
    }

    pub fn pass(&self, pass: PostProcessPass) -> &Technique {
        match pass {
            PostProcessPass::BrightPass => &self.bright_pass,
            PostProcessPass::BlurHorizontal => &self.blur_horizontal,
            PostProcessPass::BlurVertical => &self.blur_vertical,
            PostProcessPass::Composite => &self.composite,
        }
    }

    pub fn texel_size(&self) -> Vec2 {
        self.texel_size.get()
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn guard(&self) -> &UpdateGuard {
        &self.guard
    }
}

impl TechniqueDispatch for PostProcessEffect {
    fn techniques(&self) -> &TechniqueTable {
        &self.techniques
    }
}
