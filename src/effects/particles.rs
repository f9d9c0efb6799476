use glam::Vec3;

use crate::binding::{ShaderValue, ShaderVariable, TextureVariable};
use crate::effect::{Effect, EffectManifest, Result, TextureHandle, VariableDesc};
use crate::technique::{RenderMode, TechniqueDispatch, TechniqueKey, TechniqueTable, VertexFormat};

use super::common::{CameraBindings, FogBindings};
use super::{BindingContext, FrameState, UpdateGuard, UpdateStage};

const FAMILY: &str = "Particles";

const PARTICLE_FORMATS: [VertexFormat; 2] = [VertexFormat::Particle, VertexFormat::GpuParticle];

/// Emitter state for one frame of simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmitterState {
    pub position: Vec3,
    pub direction: Vec3,
    pub time_step: f32,
    /// Noise texture sampled by the emit stage.
    pub random_texture: Option<TextureHandle>,
}

impl Default for EmitterState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::Y,
            time_step: 0.0,
            random_texture: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParticleAppearance {
    pub textures: Option<TextureHandle>,
    pub texture_count: u32,
}

/// Particle systems: a stream-out stage that emits and simulates, then a
/// drawing stage with optional per-particle rotation.
pub struct ParticleEffect {
    effect: Effect,
    techniques: TechniqueTable,
    guard: UpdateGuard,
    camera: CameraBindings,
    fog: FogBindings,
    emitter_position: ShaderVariable<Vec3>,
    emitter_direction: ShaderVariable<Vec3>,
    time_step: ShaderVariable<f32>,
    total_time: ShaderVariable<f32>,
    random_texture: TextureVariable,
    textures: TextureVariable,
    texture_count: ShaderVariable<u32>,
}

impl ParticleEffect {
    pub fn technique_keys() -> Vec<TechniqueKey> {
        let mut keys = Vec::new();
        for mode in [RenderMode::Forward, RenderMode::Deferred] {
            for format in PARTICLE_FORMATS {
                keys.push(TechniqueKey::stream_out(mode, format));
                let drawing = TechniqueKey::drawing(mode, format, false);
                keys.push(drawing);
                keys.push(drawing.rotated());
            }
        }
        keys
    }

    pub fn manifest() -> EffectManifest {
        EffectManifest::new(FAMILY)
            .with_techniques(&Self::technique_keys())
            .with_variables(CameraBindings::variables())
            .with_variables(FogBindings::variables())
            .with_variables([
                Vec3::desc("emitter_position"),
                Vec3::desc("emitter_direction"),
                f32::desc("time_step"),
                f32::desc("total_time"),
                VariableDesc::texture("random_texture"),
                VariableDesc::texture("particle_textures"),
                u32::desc("texture_count"),
            ])
    }

    pub fn new(effect: &Effect, context: &BindingContext) -> Result<Self> {
        let telemetry = &context.telemetry;
        let wrapper = Self {
            effect: effect.clone(),
            techniques: TechniqueTable::resolve(effect, FAMILY, &Self::technique_keys())?,
            guard: UpdateGuard::new(FAMILY, context.order_check),
            camera: CameraBindings::bind(effect)?,
            fog: FogBindings::bind(effect)?,
            emitter_position: ShaderVariable::bind(effect, "emitter_position")?,
            emitter_direction: ShaderVariable::bind(effect, "emitter_direction")?,
            time_step: ShaderVariable::bind(effect, "time_step")?,
            total_time: ShaderVariable::bind(effect, "total_time")?,
            random_texture: TextureVariable::bind(effect, "random_texture", telemetry.clone())?,
            textures: TextureVariable::bind(effect, "particle_textures", telemetry.clone())?,
            texture_count: ShaderVariable::bind(effect, "texture_count")?,
        };

        log::info!(
            "Created {FAMILY} effect from '{}' with {} techniques",
            effect.name(),
            wrapper.techniques.len()
        );
        Ok(wrapper)
    }

    pub fn update_per_frame(&self, frame: &FrameState, emitter: &EmitterState) {
        self.guard.record(UpdateStage::PerFrame);
        self.camera.update(frame);
        self.fog.update(frame);
        self.emitter_position.set(emitter.position);
        self.emitter_direction.set(emitter.direction.normalize_or_zero());
        self.time_step.set(emitter.time_step);
        self.total_time.set(frame.total_time);
        self.random_texture.set(emitter.random_texture);
    }

    pub fn update_per_object(&self, appearance: &ParticleAppearance) {
        self.guard.record(UpdateStage::PerObject);
        self.textures.set(appearance.textures);
        self.texture_count.set(appearance.texture_count);
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn guard(&self) -> &UpdateGuard {
        &self.guard
    }

    pub fn emitter_direction(&self) -> Vec3 {
        self.emitter_direction.get()
    }
}

impl TechniqueDispatch for ParticleEffect {
    fn techniques(&self) -> &TechniqueTable {
        &self.techniques
    }
}
