use bytemuck::Zeroable;
use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use crate::binding::{ShaderValue, ShaderVariable, TextureVariable};
use crate::composition::CompositionTargets;
use crate::effect::{Effect, EffectManifest, Result, TechniqueDesc, TextureHandle, VariableDesc};
use crate::lights::{
    DirectionalLight, DirectionalLightData, HemisphericLight, PointLight, PointLightData,
    SpotLight, SpotLightData,
};
use crate::technique::{InputLayout, Technique, VertexFormat};

use super::common::{texel_size_variable, CameraBindings, FogBindings, ShadowBindings};
use super::{BindingContext, FrameState, UpdateGuard, UpdateStage};

const FAMILY: &str = "DeferredComposer";

/// Techniques of the composer. They are picked by pass, not by draw call
/// descriptor, so the composer has no generic selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComposerTechnique {
    DirectionalLight,
    PointStencil,
    PointLight,
    SpotStencil,
    SpotLight,
    Combine,
}

impl ComposerTechnique {
    pub const ALL: [ComposerTechnique; 6] = [
        ComposerTechnique::DirectionalLight,
        ComposerTechnique::PointStencil,
        ComposerTechnique::PointLight,
        ComposerTechnique::SpotStencil,
        ComposerTechnique::SpotLight,
        ComposerTechnique::Combine,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ComposerTechnique::DirectionalLight => "Deferred_DirectionalLight",
            ComposerTechnique::PointStencil => "Deferred_PointStencil",
            ComposerTechnique::PointLight => "Deferred_PointLight",
            ComposerTechnique::SpotStencil => "Deferred_SpotStencil",
            ComposerTechnique::SpotLight => "Deferred_SpotLight",
            ComposerTechnique::Combine => "Deferred_Combine",
        }
    }

    /// Light volumes are drawn as positions-only meshes; full-screen passes
    /// use a textured quad.
    pub fn format(&self) -> VertexFormat {
        match self {
            ComposerTechnique::DirectionalLight | ComposerTechnique::Combine => {
                VertexFormat::PositionTexture
            }
            _ => VertexFormat::Position,
        }
    }
}

/// World transform of the unit sphere bounding a point light.
pub fn point_light_volume(light: &PointLightData) -> Mat4 {
    Mat4::from_scale_rotation_translation(Vec3::splat(light.range), Quat::IDENTITY, light.position)
}

/// Widest cone half-angle a spot volume is built with. `tan` diverges at π/2.
pub const MAX_SPOT_HALF_ANGLE: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// World transform of the unit cone (apex at the origin, opening along +Z,
/// base radius 1 at z = 1) bounding a spot light.
pub fn spot_light_volume(light: &SpotLightData) -> Mat4 {
    let half_angle = light
        .inner_angle
        .max(light.outer_angle)
        .clamp(0.0, MAX_SPOT_HALF_ANGLE);
    let radius = light.range * half_angle.tan();
    let direction = light.direction.try_normalize().unwrap_or(Vec3::NEG_Z);
    let rotation = Quat::from_rotation_arc(Vec3::Z, direction);
    Mat4::from_scale_rotation_translation(
        Vec3::new(radius, radius, light.range),
        rotation,
        light.position,
    )
}

struct Techniques {
    directional_light: Technique,
    point_stencil: Technique,
    point_light: Technique,
    spot_stencil: Technique,
    spot_light: Technique,
    combine: Technique,
}

impl Techniques {
    fn resolve(effect: &Effect) -> Result<Self> {
        let resolve = |technique: ComposerTechnique| {
            Technique::resolve(effect, technique.name(), technique.format(), false)
        };

        Ok(Self {
            directional_light: resolve(ComposerTechnique::DirectionalLight)?,
            point_stencil: resolve(ComposerTechnique::PointStencil)?,
            point_light: resolve(ComposerTechnique::PointLight)?,
            spot_stencil: resolve(ComposerTechnique::SpotStencil)?,
            spot_light: resolve(ComposerTechnique::SpotLight)?,
            combine: resolve(ComposerTechnique::Combine)?,
        })
    }
}

/// Screen-space lighting over the geometry buffers.
pub struct DeferredComposer {
    effect: Effect,
    techniques: Techniques,
    guard: UpdateGuard,
    camera: CameraBindings,
    fog: FogBindings,
    shadow: ShadowBindings,
    inverse_view_projection: ShaderVariable<Mat4>,
    light_world: ShaderVariable<Mat4>,
    directional_light: ShaderVariable<DirectionalLight>,
    point_light: ShaderVariable<PointLight>,
    spot_light: ShaderVariable<SpotLight>,
    hemispheric_light: ShaderVariable<HemisphericLight>,
    ambient_color: ShaderVariable<Vec4>,
    texel_size: ShaderVariable<Vec2>,
    color_map: TextureVariable,
    normal_map: TextureVariable,
    depth_map: TextureVariable,
    light_map: TextureVariable,
}

impl DeferredComposer {
    pub fn manifest() -> EffectManifest {
        let mut manifest = EffectManifest::new(FAMILY);
        for technique in ComposerTechnique::ALL {
            manifest = manifest.with_technique(TechniqueDesc::new(
                technique.name(),
                InputLayout::for_format(technique.format(), false),
            ));
        }

        manifest
            .with_variables(CameraBindings::variables())
            .with_variables(FogBindings::variables())
            .with_variables(ShadowBindings::variables())
            .with_variables([
                Mat4::desc("inverse_view_projection"),
                Mat4::desc("light_world"),
                DirectionalLight::desc("directional_light"),
                PointLight::desc("point_light"),
                SpotLight::desc("spot_light"),
                HemisphericLight::desc("hemispheric_light"),
                Vec4::desc("ambient_color"),
                texel_size_variable(),
                VariableDesc::texture("color_map"),
                VariableDesc::texture("normal_map"),
                VariableDesc::texture("depth_map"),
                VariableDesc::texture("light_map"),
            ])
    }

    pub fn new(effect: &Effect, context: &BindingContext) -> Result<Self> {
        let telemetry = &context.telemetry;
        let composer = Self {
            effect: effect.clone(),
            techniques: Techniques::resolve(effect)?,
            guard: UpdateGuard::new(FAMILY, context.order_check),
            camera: CameraBindings::bind(effect)?,
            fog: FogBindings::bind(effect)?,
            shadow: ShadowBindings::bind(effect, telemetry)?,
            inverse_view_projection: ShaderVariable::bind(effect, "inverse_view_projection")?,
            light_world: ShaderVariable::bind(effect, "light_world")?,
            directional_light: ShaderVariable::bind(effect, "directional_light")?,
            point_light: ShaderVariable::bind(effect, "point_light")?,
            spot_light: ShaderVariable::bind(effect, "spot_light")?,
            hemispheric_light: ShaderVariable::bind(effect, "hemispheric_light")?,
            ambient_color: ShaderVariable::bind(effect, "ambient_color")?,
            texel_size: ShaderVariable::bind(effect, "texel_size")?,
            color_map: TextureVariable::bind(effect, "color_map", telemetry.clone())?,
            normal_map: TextureVariable::bind(effect, "normal_map", telemetry.clone())?,
            depth_map: TextureVariable::bind(effect, "depth_map", telemetry.clone())?,
            light_map: TextureVariable::bind(effect, "light_map", telemetry.clone())?,
        };
        composer.texel_size.set(context.resolution.texel_size());

        log::info!("Created {FAMILY} from '{}'", effect.name());
        Ok(composer)
    }

    pub fn directional_light(&self) -> &Technique {
        &self.techniques.directional_light
    }

    pub fn point_stencil(&self) -> &Technique {
        &self.techniques.point_stencil
    }

    pub fn point_light(&self) -> &Technique {
        &self.techniques.point_light
    }

    pub fn spot_stencil(&self) -> &Technique {
        &self.techniques.spot_stencil
    }

    pub fn spot_light(&self) -> &Technique {
        &self.techniques.spot_light
    }

    pub fn combine(&self) -> &Technique {
        &self.techniques.combine
    }

    pub fn technique(&self, technique: ComposerTechnique) -> &Technique {
        match technique {
            ComposerTechnique::DirectionalLight => self.directional_light(),
            ComposerTechnique::PointStencil => self.point_stencil(),
            ComposerTechnique::PointLight => self.point_light(),
            ComposerTechnique::SpotStencil => self.spot_stencil(),
            ComposerTechnique::SpotLight => self.spot_light(),
            ComposerTechnique::Combine => self.combine(),
        }
    }

    /// Camera, geometry buffers and frame-wide lighting terms.
    pub fn update_per_frame(&self, frame: &FrameState, targets: &CompositionTargets) {
        self.guard.record(UpdateStage::PerFrame);
        self.camera.update(frame);
        self.inverse_view_projection
            .set(frame.view_projection().inverse());
        self.fog.update(frame);
        self.shadow.update(frame);
        self.ambient_color.set(frame.ambient);
        self.hemispheric_light.set(
            frame
                .lights
                .hemispheric_light()
                .map(HemisphericLight::from_data)
                .unwrap_or_else(HemisphericLight::zeroed),
        );
        self.color_map.set(targets.color);
        self.normal_map.set(targets.normal);
        self.depth_map.set(targets.depth);
        // Light accumulation is the render target until the combine pass.
        self.light_map.set(None);
    }

    pub fn update_directional(&self, light: &DirectionalLightData) {
        self.guard.record(UpdateStage::PerObject);
        self.directional_light.set(DirectionalLight::from_data(light));
        self.light_world.set(Mat4::IDENTITY);
    }

    /// Binds the light and returns its volume transform.
    pub fn update_point(&self, light: &PointLightData) -> Mat4 {
        self.guard.record(UpdateStage::PerObject);
        let world = point_light_volume(light);
        self.point_light.set(PointLight::from_data(light));
        self.light_world.set(world);
        world
    }

    pub fn update_spot(&self, light: &SpotLightData) -> Mat4 {
        self.guard.record(UpdateStage::PerObject);
        let world = spot_light_volume(light);
        self.spot_light.set(SpotLight::from_data(light));
        self.light_world.set(world);
        world
    }

    pub fn update_combine(&self, light_accumulation: Option<TextureHandle>) {
        self.guard.record(UpdateStage::PerObject);
        self.light_map.set(light_accumulation);
    }

    /// Every texture the composer currently samples.
    pub fn sampled_textures(&self) -> Vec<TextureHandle> {
        [
            self.color_map.get(),
            self.normal_map.get(),
            self.depth_map.get(),
            self.light_map.get(),
            self.shadow.map(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn light_world(&self) -> Mat4 {
        self.light_world.get()
    }

    pub fn point_light_record(&self) -> PointLight {
        self.point_light.get()
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn guard(&self) -> &UpdateGuard {
        &self.guard
    }
}
