use bytemuck::{Pod, Zeroable};
use glam::{UVec3, Vec3};

use crate::impl_struct_value;

pub const MAX_DIRECTIONAL_LIGHTS: usize = 3;
pub const MAX_POINT_LIGHTS: usize = 4;
pub const MAX_SPOT_LIGHTS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLightData {
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub cast_shadow: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLightData {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
    /// Constant, linear and quadratic falloff.
    pub attenuation: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLightData {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub range: f32,
    pub inner_angle: f32,
    pub outer_angle: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HemisphericLightData {
    pub ambient_down: Vec3,
    pub ambient_up: Vec3,
}

/// Lights visible this frame, in priority order. Packing keeps the head of
/// each list and drops the tail.
#[derive(Clone, Default, Debug)]
pub struct LightsData {
    directional: Vec<DirectionalLightData>,
    point: Vec<PointLightData>,
    spot: Vec<SpotLightData>,
    hemispheric: Option<HemisphericLightData>,
}

impl LightsData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.directional.clear();
        self.point.clear();
        self.spot.clear();
        self.hemispheric = None;
    }

    pub fn add_directional(&mut self, light: DirectionalLightData) {
        self.directional.push(light);
    }

    pub fn add_point(&mut self, light: PointLightData) {
        self.point.push(light);
    }

    pub fn add_spot(&mut self, light: SpotLightData) {
        self.spot.push(light);
    }

    pub fn set_hemispheric(&mut self, light: Option<HemisphericLightData>) {
        self.hemispheric = light;
    }

    pub fn directional_lights(&self) -> &[DirectionalLightData] {
        &self.directional
    }

    pub fn point_lights(&self) -> &[PointLightData] {
        &self.point
    }

    pub fn spot_lights(&self) -> &[SpotLightData] {
        &self.spot
    }

    pub fn hemispheric_light(&self) -> Option<&HemisphericLightData> {
        self.hemispheric.as_ref()
    }

    pub fn counts(&self) -> LightCounts {
        LightCounts::new(self.directional.len(), self.point.len(), self.spot.len())
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct DirectionalLight {
    pub direction: [f32; 3],
    pub cast_shadow: u32,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl DirectionalLight {
    pub fn from_data(data: &DirectionalLightData) -> Self {
        Self {
            direction: data.direction.to_array(),
            cast_shadow: data.cast_shadow as u32,
            color: data.color.to_array(),
            intensity: data.intensity,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct PointLight {
    pub position: [f32; 3],
    pub range: f32,
    pub color: [f32; 3],
    pub intensity: f32,
    pub attenuation: [f32; 3],
    pub _padding: f32,
}

impl PointLight {
    pub fn from_data(data: &PointLightData) -> Self {
        Self {
            position: data.position.to_array(),
            range: data.range,
            color: data.color.to_array(),
            intensity: data.intensity,
            attenuation: data.attenuation.to_array(),
            _padding: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct SpotLight {
    pub position: [f32; 3],
    pub range: f32,
    pub direction: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    pub cos_inner: f32,
    pub cos_outer: f32,
    pub _padding: [f32; 3],
}

impl SpotLight {
    pub fn from_data(data: &SpotLightData) -> Self {
        let mut inner = data.inner_angle;
        let mut outer = data.outer_angle;
        if inner > outer {
            std::mem::swap(&mut inner, &mut outer);
        }

        Self {
            position: data.position.to_array(),
            range: data.range,
            direction: data.direction.to_array(),
            intensity: data.intensity,
            color: data.color.to_array(),
            cos_inner: inner.cos(),
            cos_outer: outer.cos(),
            _padding: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct HemisphericLight {
    pub ambient_down: [f32; 3],
    pub _padding0: f32,
    /// Up minus down, so the shader lerps with a single multiply-add.
    pub ambient_range: [f32; 3],
    pub _padding1: f32,
}

impl HemisphericLight {
    pub fn from_data(data: &HemisphericLightData) -> Self {
        Self {
            ambient_down: data.ambient_down.to_array(),
            _padding0: 0.0,
            ambient_range: (data.ambient_up - data.ambient_down).to_array(),
            _padding1: 0.0,
        }
    }
}

impl_struct_value!(DirectionalLight, PointLight, SpotLight, HemisphericLight);

/// Copies the head of `items` into a fixed array of `N` records, zero-filling
/// the rest. Items past `N` are dropped silently.
pub fn pack<T: Zeroable + Copy, const N: usize>(items: &[T]) -> [T; N] {
    let mut packed = [T::zeroed(); N];
    for (dst, src) in packed.iter_mut().zip(items) {
        *dst = *src;
    }
    packed
}

/// [`pack`] with a conversion from the CPU-side record.
pub fn pack_with<S, T: Zeroable + Copy, const N: usize>(
    items: &[S],
    convert: impl Fn(&S) -> T,
) -> [T; N] {
    let mut packed = [T::zeroed(); N];
    for (dst, src) in packed.iter_mut().zip(items) {
        *dst = convert(src);
    }
    packed
}

/// Light counts in (directional, point, spot) order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LightCounts {
    /// What the visibility query returned.
    pub visible: UVec3,
    /// What fits in the fixed shader arrays.
    pub packed: UVec3,
}

impl LightCounts {
    pub fn new(directional: usize, point: usize, spot: usize) -> Self {
        Self {
            visible: UVec3::new(directional as u32, point as u32, spot as u32),
            packed: UVec3::new(
                directional.min(MAX_DIRECTIONAL_LIGHTS) as u32,
                point.min(MAX_POINT_LIGHTS) as u32,
                spot.min(MAX_SPOT_LIGHTS) as u32,
            ),
        }
    }

    /// Count vector handed to shaders: always the number of records actually
    /// present in the packed arrays.
    pub fn shader_vector(&self) -> UVec3 {
        self.packed
    }

    pub fn truncated(&self) -> bool {
        self.visible != self.packed
    }
}

/// Packed light arrays ready for upload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PackedLights {
    pub directional: [DirectionalLight; MAX_DIRECTIONAL_LIGHTS],
    pub point: [PointLight; MAX_POINT_LIGHTS],
    pub spot: [SpotLight; MAX_SPOT_LIGHTS],
    pub hemispheric: HemisphericLight,
    pub counts: LightCounts,
}

impl PackedLights {
    pub fn from_data(data: &LightsData) -> Self {
        let counts = data.counts();
        if counts.truncated() {
            log::trace!(
                "Clamped visible lights {:?} to {:?}",
                counts.visible,
                counts.packed
            );
        }

        Self {
            directional: pack_with(data.directional_lights(), DirectionalLight::from_data),
            point: pack_with(data.point_lights(), PointLight::from_data),
            spot: pack_with(data.spot_lights(), SpotLight::from_data),
            hemispheric: data
                .hemispheric_light()
                .map(HemisphericLight::from_data)
                .unwrap_or_else(HemisphericLight::zeroed),
            counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    fn point(i: usize) -> PointLightData {
        PointLightData {
            position: Vec3::new(i as f32, 1.0, 0.0),
            color: Vec3::ONE,
            intensity: 1.0 + i as f32,
            range: 10.0,
            attenuation: Vec3::new(1.0, 0.1, 0.01),
        }
    }

    #[test]
    fn records_are_16_byte_aligned() {
        assert_eq!(mem::size_of::<DirectionalLight>(), 32);
        assert_eq!(mem::size_of::<PointLight>(), 48);
        assert_eq!(mem::size_of::<SpotLight>(), 64);
        assert_eq!(mem::size_of::<HemisphericLight>(), 32);
    }

    #[test]
    fn pack_empty_is_all_zero() {
        let packed: [PointLight; 4] = pack(&[]);
        assert!(packed.iter().all(|p| *p == PointLight::zeroed()));
    }

    #[test]
    fn pack_keeps_head_in_order() {
        let items: Vec<u32> = (1..=6).collect();
        let packed: [u32; 4] = pack(&items);
        assert_eq!(packed, [1, 2, 3, 4]);
    }

    #[test]
    fn pack_pads_short_lists() {
        let packed: [u32; 4] = pack(&[7, 8]);
        assert_eq!(packed, [7, 8, 0, 0]);
    }

    #[test]
    fn counts_clamp_separately() {
        let counts = LightCounts::new(5, 2, 9);
        assert_eq!(counts.visible, UVec3::new(5, 2, 9));
        assert_eq!(counts.shader_vector(), UVec3::new(3, 2, 4));
        assert!(counts.truncated());
        assert!(!LightCounts::new(1, 1, 1).truncated());
    }

    #[test]
    fn packed_lights_follow_input_order() {
        let mut data = LightsData::new();
        for i in 0..5 {
            data.add_point(point(i));
        }
        let packed = PackedLights::from_data(&data);

        for i in 0..MAX_POINT_LIGHTS {
            assert_eq!(packed.point[i], PointLight::from_data(&point(i)));
        }
        assert_eq!(packed.counts.packed.y, 4);
        assert_eq!(packed.counts.visible.y, 5);
        assert_eq!(packed.hemispheric, HemisphericLight::zeroed());
    }

    #[test]
    fn spot_angles_are_ordered() {
        let spot = SpotLight::from_data(&SpotLightData {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Y,
            color: Vec3::ONE,
            intensity: 1.0,
            range: 5.0,
            inner_angle: 0.6,
            outer_angle: 0.3,
        });
        assert!(spot.cos_inner > spot.cos_outer);
    }

    #[test]
    fn hemispheric_stores_range() {
        let light = HemisphericLight::from_data(&HemisphericLightData {
            ambient_down: Vec3::splat(0.1),
            ambient_up: Vec3::splat(0.4),
        });
        assert!((light.ambient_range[0] - 0.3).abs() < 1e-6);
    }
}
