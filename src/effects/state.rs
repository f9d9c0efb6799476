use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::effect::TextureHandle;
use crate::lights::LightsData;

/// Distances at which geometry switches level of detail.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodThresholds {
    pub near: f32,
    pub mid: f32,
    pub far: f32,
}

impl LodThresholds {
    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.near, self.mid, self.far)
    }
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self {
            near: 50.0,
            mid: 150.0,
            far: 400.0,
        }
    }
}

/// Rarely-changing global tables.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlobalState {
    pub material_palette: Option<TextureHandle>,
    pub material_palette_width: u32,
    pub animation_palette: Option<TextureHandle>,
    pub animation_palette_width: u32,
    pub lod: LodThresholds,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub enabled: bool,
    pub color: Vec4,
    pub start: f32,
    pub range: f32,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            enabled: false,
            color: Vec4::new(0.75, 0.75, 0.75, 1.0),
            start: 15.0,
            range: 175.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowState {
    pub map: Option<TextureHandle>,
    /// World to shadow-map texture space.
    pub transform: Mat4,
}

impl Default for ShadowState {
    fn default() -> Self {
        Self {
            map: None,
            transform: Mat4::IDENTITY,
        }
    }
}

/// Per-frame camera, lighting and atmosphere state.
#[derive(Clone, Copy, Debug)]
pub struct FrameState<'a> {
    pub view: Mat4,
    pub projection: Mat4,
    pub eye_position: Vec3,
    pub lights: &'a LightsData,
    pub fog: Fog,
    pub ambient: Vec4,
    pub shadow: ShadowState,
    pub total_time: f32,
}

impl<'a> FrameState<'a> {
    pub fn new(view: Mat4, projection: Mat4, lights: &'a LightsData) -> Self {
        Self {
            view,
            projection,
            eye_position: view.inverse().w_axis.truncate(),
            lights,
            fog: Fog::default(),
            ambient: Vec4::new(0.03, 0.03, 0.03, 1.0),
            shadow: ShadowState::default(),
            total_time: 0.0,
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    pub fn with_fog(mut self, fog: Fog) -> Self {
        self.fog = fog;
        self
    }

    pub fn with_ambient(mut self, ambient: Vec4) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_shadow(mut self, shadow: ShadowState) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn with_time(mut self, total_time: f32) -> Self {
        self.total_time = total_time;
        self
    }
}

/// Per-object material and transform state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectState {
    pub world: Mat4,
    pub texture_transform: Mat4,
    pub material_index: u32,
    pub texture_index: u32,
    pub diffuse: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    pub specular: Option<TextureHandle>,
}

impl ObjectState {
    pub fn new(world: Mat4) -> Self {
        Self {
            world,
            texture_transform: Mat4::IDENTITY,
            material_index: 0,
            texture_index: 0,
            diffuse: None,
            normal: None,
            specular: None,
        }
    }

    pub fn with_material(mut self, material_index: u32, texture_index: u32) -> Self {
        self.material_index = material_index;
        self.texture_index = texture_index;
        self
    }

    pub fn with_textures(
        mut self,
        diffuse: Option<TextureHandle>,
        normal: Option<TextureHandle>,
        specular: Option<TextureHandle>,
    ) -> Self {
        self.diffuse = diffuse;
        self.normal = normal;
        self.specular = specular;
        self
    }
}

impl Default for ObjectState {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

/// Per-object terrain parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainState {
    pub world: Mat4,
    pub material_index: u32,
    pub height_map: Option<TextureHandle>,
    pub blend_map: Option<TextureHandle>,
    pub layer_maps: Option<TextureHandle>,
    pub normal_maps: Option<TextureHandle>,
    /// Blend factor of the detail layers.
    pub alpha: f32,
    /// Slope (0 = flat, 1 = vertical) range where the rock layer fades in.
    pub slope_range: Vec2,
    pub texture_scale: f32,
    pub cell_spacing: f32,
}

impl Default for TerrainState {
    fn default() -> Self {
        Self {
            world: Mat4::IDENTITY,
            material_index: 0,
            height_map: None,
            blend_map: None,
            layer_maps: None,
            normal_maps: None,
            alpha: 1.0,
            slope_range: Vec2::new(0.5, 0.8),
            texture_scale: 50.0,
            cell_spacing: 0.5,
        }
    }
}
