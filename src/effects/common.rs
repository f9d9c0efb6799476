//! Binding groups shared by several effect families.
//!
//! Each group lists the variables it needs (`variables`) so families can
//! publish a manifest, and resolves them eagerly in `bind`.

use glam::{Mat4, UVec3, Vec2, Vec3, Vec4};

use crate::binding::{
    ArrayVariable, MatrixArrayVariable, ShaderValue, ShaderVariable, TextureVariable,
    MAX_BONE_TRANSFORMS,
};
use crate::effect::{Effect, Result, Telemetry, TextureHandle, VariableDesc};
use crate::lights::{
    DirectionalLight, HemisphericLight, PackedLights, PointLight, SpotLight,
    MAX_DIRECTIONAL_LIGHTS, MAX_POINT_LIGHTS, MAX_SPOT_LIGHTS,
};

use super::{FrameState, GlobalState, ObjectState};

pub struct CameraBindings {
    view_projection: ShaderVariable<Mat4>,
    eye_position: ShaderVariable<Vec3>,
}

impl CameraBindings {
    pub fn variables() -> Vec<VariableDesc> {
        vec![Mat4::desc("view_projection"), Vec3::desc("eye_position")]
    }

    pub fn bind(effect: &Effect) -> Result<Self> {
        Ok(Self {
            view_projection: ShaderVariable::bind(effect, "view_projection")?,
            eye_position: ShaderVariable::bind(effect, "eye_position")?,
        })
    }

    pub fn update(&self, frame: &FrameState) {
        self.view_projection.set(frame.view_projection());
        self.eye_position.set(frame.eye_position);
    }

    pub fn view_projection(&self) -> Mat4 {
        self.view_projection.get()
    }
}

pub struct FogBindings {
    enabled: ShaderVariable<bool>,
    color: ShaderVariable<Vec4>,
    start: ShaderVariable<f32>,
    range: ShaderVariable<f32>,
}

impl FogBindings {
    pub fn variables() -> Vec<VariableDesc> {
        vec![
            bool::desc("fog_enabled"),
            Vec4::desc("fog_color"),
            f32::desc("fog_start"),
            f32::desc("fog_range"),
        ]
    }

    pub fn bind(effect: &Effect) -> Result<Self> {
        Ok(Self {
            enabled: ShaderVariable::bind(effect, "fog_enabled")?,
            color: ShaderVariable::bind(effect, "fog_color")?,
            start: ShaderVariable::bind(effect, "fog_start")?,
            range: ShaderVariable::bind(effect, "fog_range")?,
        })
    }

    pub fn update(&self, frame: &FrameState) {
        self.enabled.set(frame.fog.enabled);
        self.color.set(frame.fog.color);
        self.start.set(frame.fog.start);
        self.range.set(frame.fog.range);
    }
}

/// Fixed-size light arrays plus the count vector and ambient terms.
pub struct LightBindings {
    directional: ArrayVariable<DirectionalLight>,
    point: ArrayVariable<PointLight>,
    spot: ArrayVariable<SpotLight>,
    hemispheric: ShaderVariable<HemisphericLight>,
    counts: ShaderVariable<UVec3>,
    ambient: ShaderVariable<Vec4>,
}

impl LightBindings {
    pub fn variables() -> Vec<VariableDesc> {
        vec![
            DirectionalLight::array_desc("directional_lights", MAX_DIRECTIONAL_LIGHTS),
            PointLight::array_desc("point_lights", MAX_POINT_LIGHTS),
            SpotLight::array_desc("spot_lights", MAX_SPOT_LIGHTS),
            HemisphericLight::desc("hemispheric_light"),
            UVec3::desc("light_counts"),
            Vec4::desc("ambient_color"),
        ]
    }

    pub fn bind(effect: &Effect) -> Result<Self> {
        Ok(Self {
            directional: ArrayVariable::bind_with_capacity(
                effect,
                "directional_lights",
                MAX_DIRECTIONAL_LIGHTS,
            )?,
            point: ArrayVariable::bind_with_capacity(effect, "point_lights", MAX_POINT_LIGHTS)?,
            spot: ArrayVariable::bind_with_capacity(effect, "spot_lights", MAX_SPOT_LIGHTS)?,
            hemispheric: ShaderVariable::bind(effect, "hemispheric_light")?,
            counts: ShaderVariable::bind(effect, "light_counts")?,
            ambient: ShaderVariable::bind(effect, "ambient_color")?,
        })
    }

    pub fn update(&self, frame: &FrameState) -> Result<()> {
        let packed = PackedLights::from_data(frame.lights);
        self.directional.set(&packed.directional)?;
        self.point.set(&packed.point)?;
        self.spot.set(&packed.spot)?;
        self.hemispheric.set(packed.hemispheric);
        self.counts.set(packed.counts.shader_vector());
        self.ambient.set(frame.ambient);
        Ok(())
    }

    pub fn point_lights(&self) -> Vec<PointLight> {
        self.point.get()
    }

    pub fn spot_lights(&self) -> Vec<SpotLight> {
        self.spot.get()
    }

    pub fn directional_lights(&self) -> Vec<DirectionalLight> {
        self.directional.get()
    }

    pub fn counts(&self) -> UVec3 {
        self.counts.get()
    }
}

pub struct ShadowBindings {
    map: TextureVariable,
    transform: ShaderVariable<Mat4>,
}

impl ShadowBindings {
    pub fn variables() -> Vec<VariableDesc> {
        vec![VariableDesc::texture("shadow_map"), Mat4::desc("shadow_transform")]
    }

    pub fn bind(effect: &Effect, telemetry: &Telemetry) -> Result<Self> {
        Ok(Self {
            map: TextureVariable::bind(effect, "shadow_map", telemetry.clone())?,
            transform: ShaderVariable::bind(effect, "shadow_transform")?,
        })
    }

    pub fn update(&self, frame: &FrameState) {
        self.map.set(frame.shadow.map);
        self.transform.set(frame.shadow.transform);
    }

    pub fn map(&self) -> Option<TextureHandle> {
        self.map.get()
    }
}

pub struct GlobalBindings {
    material_palette: TextureVariable,
    material_palette_width: ShaderVariable<u32>,
    animation_palette: TextureVariable,
    animation_palette_width: ShaderVariable<u32>,
    lod_distances: ShaderVariable<Vec3>,
}

impl GlobalBindings {
    pub fn variables() -> Vec<VariableDesc> {
        vec![
            VariableDesc::texture("material_palette"),
            u32::desc("material_palette_width"),
            VariableDesc::texture("animation_palette"),
            u32::desc("animation_palette_width"),
            Vec3::desc("lod_distances"),
        ]
    }

    pub fn bind(effect: &Effect, telemetry: &Telemetry) -> Result<Self> {
        Ok(Self {
            material_palette: TextureVariable::bind(effect, "material_palette", telemetry.clone())?,
            material_palette_width: ShaderVariable::bind(effect, "material_palette_width")?,
            animation_palette: TextureVariable::bind(
                effect,
                "animation_palette",
                telemetry.clone(),
            )?,
            animation_palette_width: ShaderVariable::bind(effect, "animation_palette_width")?,
            lod_distances: ShaderVariable::bind(effect, "lod_distances")?,
        })
    }

    pub fn update(&self, globals: &GlobalState) {
        self.material_palette.set(globals.material_palette);
        self.material_palette_width
            .set(globals.material_palette_width);
        self.animation_palette.set(globals.animation_palette);
        self.animation_palette_width
            .set(globals.animation_palette_width);
        self.lod_distances.set(globals.lod.as_vec3());
    }
}

/// World transform, material indices and the three surface maps.
pub struct ObjectBindings {
    world: ShaderVariable<Mat4>,
    world_inverse_transpose: ShaderVariable<Mat4>,
    texture_transform: ShaderVariable<Mat4>,
    material_index: ShaderVariable<u32>,
    texture_index: ShaderVariable<u32>,
    diffuse_map: TextureVariable,
    normal_map: TextureVariable,
    specular_map: TextureVariable,
}

impl ObjectBindings {
    pub fn variables() -> Vec<VariableDesc> {
        vec![
            Mat4::desc("world"),
            Mat4::desc("world_inverse_transpose"),
            Mat4::desc("texture_transform"),
            u32::desc("material_index"),
            u32::desc("texture_index"),
            VariableDesc::texture("diffuse_map"),
            VariableDesc::texture("normal_map"),
            VariableDesc::texture("specular_map"),
        ]
    }

    pub fn bind(effect: &Effect, telemetry: &Telemetry) -> Result<Self> {
        Ok(Self {
            world: ShaderVariable::bind(effect, "world")?,
            world_inverse_transpose: ShaderVariable::bind(effect, "world_inverse_transpose")?,
            texture_transform: ShaderVariable::bind(effect, "texture_transform")?,
            material_index: ShaderVariable::bind(effect, "material_index")?,
            texture_index: ShaderVariable::bind(effect, "texture_index")?,
            diffuse_map: TextureVariable::bind(effect, "diffuse_map", telemetry.clone())?,
            normal_map: TextureVariable::bind(effect, "normal_map", telemetry.clone())?,
            specular_map: TextureVariable::bind(effect, "specular_map", telemetry.clone())?,
        })
    }

    pub fn update(&self, object: &ObjectState) {
        self.world.set(object.world);
        self.world_inverse_transpose
            .set(inverse_transpose(object.world));
        self.texture_transform.set(object.texture_transform);
        self.material_index.set(object.material_index);
        self.texture_index.set(object.texture_index);
        self.diffuse_map.set(object.diffuse);
        self.normal_map.set(object.normal);
        self.specular_map.set(object.specular);
    }

    pub fn world(&self) -> Mat4 {
        self.world.get()
    }
}

/// Bone palette for skinned techniques.
pub struct SkinningBindings {
    bones: MatrixArrayVariable,
}

impl SkinningBindings {
    pub fn variables() -> Vec<VariableDesc> {
        vec![Mat4::array_desc("bone_transforms", MAX_BONE_TRANSFORMS)]
    }

    pub fn bind(effect: &Effect) -> Result<Self> {
        Ok(Self {
            bones: MatrixArrayVariable::bind_with_capacity(
                effect,
                "bone_transforms",
                MAX_BONE_TRANSFORMS,
            )?,
        })
    }

    /// `None` (or an empty pose) leaves the previous pose bound.
    pub fn update(&self, bones: Option<&[Mat4]>) -> Result<bool> {
        match bones {
            Some(bones) if !bones.is_empty() => {
                self.bones.set(bones)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn bones(&self) -> Vec<Mat4> {
        self.bones.get()
    }
}

/// Normal matrix with translation removed, so normals stay unaffected by it.
pub fn inverse_transpose(world: Mat4) -> Mat4 {
    let mut linear = world;
    linear.w_axis = Vec4::W;
    let determinant = linear.determinant();
    if determinant.abs() <= f32::EPSILON {
        return Mat4::IDENTITY;
    }
    linear.inverse().transpose()
}

/// Size of one texel, for full-screen passes sampling at target resolution.
pub fn texel_size_variable() -> VariableDesc {
    Vec2::desc("texel_size")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_transpose_ignores_translation() {
        let world = Mat4::from_translation(Vec3::new(5.0, -2.0, 1.0))
            * Mat4::from_scale(Vec3::new(2.0, 2.0, 2.0));
        let normal_matrix = inverse_transpose(world);
        let n = normal_matrix.transform_vector3(Vec3::Y);
        assert!(n.abs_diff_eq(Vec3::new(0.0, 0.5, 0.0), 1e-6));
        assert_eq!(normal_matrix.w_axis, Vec4::W);
    }

    #[test]
    fn singular_world_falls_back_to_identity() {
        let world = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(inverse_transpose(world), Mat4::IDENTITY);
    }
}
