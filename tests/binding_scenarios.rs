use std::cell::RefCell;
use std::rc::Rc;

use glam::{Mat4, Vec3};
use wgpu_effects::effect::{Effect, MemoryEffect, RebindCounter, Telemetry, TextureHandle};
use wgpu_effects::effects::{BasicEffect, BindingContext, FrameState, ObjectState};
use wgpu_effects::lights::{LightsData, PointLight, PointLightData, MAX_POINT_LIGHTS};
use wgpu_effects::settings::OrderCheck;
use wgpu_effects::technique::{DrawCallDescriptor, RenderMode, TechniqueDispatch, VertexFormat};
use wgpu_effects::EffectError;

const EPSILON: f32 = 1e-6;

fn basic_effect() -> (BasicEffect, Rc<RefCell<MemoryEffect>>, Rc<RebindCounter>) {
    wgpu_effects::init_logging();

    let backend = Rc::new(RefCell::new(MemoryEffect::from_manifest(
        &BasicEffect::manifest(),
    )));
    let effect = Effect::shared("Basic", backend.clone());
    let counter = RebindCounter::new();
    let telemetry: Telemetry = counter.clone();
    let context = BindingContext::new(telemetry, OrderCheck::Panic);
    let basic = BasicEffect::new(&effect, &context).unwrap();
    (basic, backend, counter)
}

fn point_light(i: usize) -> PointLightData {
    PointLightData {
        position: Vec3::new(i as f32 * 2.0, 1.0, -3.0),
        color: Vec3::new(1.0, 0.5, 0.25),
        intensity: 1.0 + i as f32,
        range: 10.0,
        attenuation: Vec3::new(1.0, 0.09, 0.032),
    }
}

#[test]
fn five_point_lights_keep_the_first_four_in_order() {
    let (basic, _, _) = basic_effect();

    let mut lights = LightsData::new();
    for i in 0..5 {
        lights.add_point(point_light(i));
    }
    let frame = FrameState::new(Mat4::IDENTITY, Mat4::IDENTITY, &lights);
    basic.update_per_frame(&frame).unwrap();

    let bound = basic.lights().point_lights();
    assert_eq!(bound.len(), MAX_POINT_LIGHTS);
    for (i, light) in bound.iter().enumerate() {
        assert_eq!(*light, PointLight::from_data(&point_light(i)));
    }
    assert_eq!(basic.lights().counts().y, MAX_POINT_LIGHTS as u32);
}

#[test]
fn fewer_lights_are_zero_padded() {
    let (basic, _, _) = basic_effect();

    let mut lights = LightsData::new();
    lights.add_point(point_light(0));
    let frame = FrameState::new(Mat4::IDENTITY, Mat4::IDENTITY, &lights);
    basic.update_per_frame(&frame).unwrap();

    let bound = basic.lights().point_lights();
    assert_eq!(bound[0], PointLight::from_data(&point_light(0)));
    assert!(bound[1..]
        .iter()
        .all(|light| *light == bytemuck::Zeroable::zeroed()));
    assert_eq!(basic.lights().counts().y, 1);
}

#[test]
fn null_skinning_does_not_stomp_the_last_pose() {
    let (basic, backend, _) = basic_effect();
    let lights = LightsData::new();
    basic
        .update_per_frame(&FrameState::new(Mat4::IDENTITY, Mat4::IDENTITY, &lights))
        .unwrap();
    basic.update_per_object(&ObjectState::default());

    let pose: Vec<Mat4> = (0..20)
        .map(|i| Mat4::from_rotation_y(i as f32 * 0.1))
        .collect();
    assert!(basic.update_per_skinning(Some(&pose)).unwrap());
    let writes = backend.borrow().write_count("bone_transforms");

    assert!(!basic.update_per_skinning(None).unwrap());
    assert!(!basic.update_per_skinning(Some(&[])).unwrap());

    assert_eq!(backend.borrow().write_count("bone_transforms"), writes);
    let bones = basic.skinning().bones();
    for (bound, expected) in bones.iter().zip(&pose) {
        assert!(bound.abs_diff_eq(*expected, EPSILON));
    }
}

#[test]
fn oversized_skeleton_is_rejected() {
    let (basic, _, _) = basic_effect();
    let lights = LightsData::new();
    basic
        .update_per_frame(&FrameState::new(Mat4::IDENTITY, Mat4::IDENTITY, &lights))
        .unwrap();
    basic.update_per_object(&ObjectState::default());

    let pose = vec![Mat4::IDENTITY; 97];
    assert!(matches!(
        basic.update_per_skinning(Some(&pose)),
        Err(EffectError::CapacityExceeded { len: 97, .. })
    ));
}

#[test]
fn skinned_instanced_selects_its_own_technique() {
    let (basic, _, _) = basic_effect();

    let skinned = DrawCallDescriptor::new(VertexFormat::PositionNormalTextureSkinned);
    let single = basic.select(&skinned).unwrap();
    let instanced = basic.select(&skinned.instanced(true)).unwrap();

    assert_ne!(single.handle(), instanced.handle());
    assert!(instanced.layout().is_instanced());
    assert!(!single.layout().is_instanced());
    assert_eq!(
        instanced.name(),
        "Forward_PositionNormalTextureSkinned_Instanced"
    );
}

#[test]
fn unsupported_draw_reports_the_tuple() {
    let (basic, _, _) = basic_effect();

    let descriptor = DrawCallDescriptor::new(VertexFormat::Billboard).with_mode(RenderMode::Deferred);
    match basic.select(&descriptor) {
        Err(EffectError::UnsupportedCombination { family, descriptor: reported }) => {
            assert_eq!(family, "Basic");
            assert_eq!(reported, descriptor);
        }
        other => panic!("expected unsupported combination, got {:?}", other.map(|t| t.name().to_string())),
    }
}

#[test]
fn repeated_texture_binds_reach_the_backend_once() {
    let (basic, backend, counter) = basic_effect();
    let lights = LightsData::new();
    basic
        .update_per_frame(&FrameState::new(Mat4::IDENTITY, Mat4::IDENTITY, &lights))
        .unwrap();

    let brick = TextureHandle::new(7);
    let stone = TextureHandle::new(8);
    let object = ObjectState::default().with_textures(Some(brick), None, None);

    basic.update_per_object(&object);
    basic.update_per_object(&object);
    assert_eq!(backend.borrow().write_count("diffuse_map"), 1);
    assert_eq!(counter.for_slot("diffuse_map"), 1);

    basic.update_per_object(&ObjectState::default().with_textures(Some(stone), None, None));
    assert_eq!(backend.borrow().write_count("diffuse_map"), 2);
    assert_eq!(counter.for_slot("diffuse_map"), 2);
}
