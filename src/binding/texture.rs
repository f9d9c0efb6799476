use std::cell::Cell;

use crate::effect::{Effect, Result, Telemetry, TextureHandle, VariableHandle};

use super::variable::validate;
use super::VariableKind;

/// Texture / render-target slot that skips redundant rebinds.
///
/// The last handle written is cached; `set` only reaches the backend (and the
/// telemetry sink) when the handle actually changes.
pub struct TextureVariable {
    effect: Effect,
    handle: VariableHandle,
    name: String,
    bound: Cell<Option<TextureHandle>>,
    stale: Cell<bool>,
    telemetry: Telemetry,
}

impl TextureVariable {
    pub fn bind(effect: &Effect, name: &str, telemetry: Telemetry) -> Result<Self> {
        let (handle, desc) = effect.variable(name)?;
        validate(&desc, VariableKind::Texture, desc.stride, Some(1))?;

        Ok(Self {
            bound: Cell::new(effect.texture(handle)),
            effect: effect.clone(),
            handle,
            name: desc.name,
            stale: Cell::new(false),
            telemetry,
        })
    }

    /// Returns whether a write was issued.
    pub fn set(&self, texture: Option<TextureHandle>) -> bool {
        if !self.stale.get() && self.bound.get() == texture {
            return false;
        }

        self.effect.bind_texture(self.handle, texture);
        self.bound.set(texture);
        self.stale.set(false);
        self.telemetry
            .texture_rebound(self.effect.name(), &self.name);
        true
    }

    pub fn get(&self) -> Option<TextureHandle> {
        self.effect.texture(self.handle)
    }

    /// Forces the next `set` to write, e.g. after the backend was reset.
    pub fn invalidate(&self) {
        self.stale.set(true);
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::effect::{EffectManifest, MemoryEffect, RebindCounter, VariableDesc};

    fn setup() -> (Rc<RefCell<MemoryEffect>>, Effect, Rc<RebindCounter>, TextureVariable) {
        let manifest =
            EffectManifest::new("Tex").with_variables([VariableDesc::texture("diffuse_map")]);
        let backend = Rc::new(RefCell::new(MemoryEffect::from_manifest(&manifest)));
        let effect = Effect::shared("Tex", backend.clone());
        let counter = RebindCounter::new();
        let slot = TextureVariable::bind(&effect, "diffuse_map", counter.clone()).unwrap();
        (backend, effect, counter, slot)
    }

    #[test]
    fn same_handle_twice_writes_once() {
        let (backend, _effect, counter, slot) = setup();
        let texture = TextureHandle::new(3);

        assert!(slot.set(Some(texture)));
        assert!(!slot.set(Some(texture)));

        assert_eq!(backend.borrow().write_count("diffuse_map"), 1);
        assert_eq!(counter.total(), 1);
        assert_eq!(slot.get(), Some(texture));
    }

    #[test]
    fn different_handles_write_twice() {
        let (backend, _effect, counter, slot) = setup();

        slot.set(Some(TextureHandle::new(1)));
        slot.set(Some(TextureHandle::new(2)));

        assert_eq!(backend.borrow().write_count("diffuse_map"), 2);
        assert_eq!(counter.for_slot("diffuse_map"), 2);
    }

    #[test]
    fn unbinding_matches_initial_state() {
        let (backend, _effect, counter, slot) = setup();
        assert!(!slot.set(None));
        assert_eq!(backend.borrow().write_count("diffuse_map"), 0);
        assert_eq!(counter.total(), 0);
    }

    #[test]
    fn invalidate_forces_a_write() {
        let (backend, _effect, _counter, slot) = setup();
        let texture = TextureHandle::new(9);
        slot.set(Some(texture));
        slot.invalidate();
        assert!(slot.set(Some(texture)));
        assert_eq!(backend.borrow().write_count("diffuse_map"), 2);
    }

    #[test]
    fn non_texture_slots_are_rejected() {
        let manifest = EffectManifest::new("Tex").with_variables([VariableDesc::new(
            "diffuse_map",
            VariableKind::Scalar,
            4,
            1,
        )]);
        let effect = Effect::new("Tex", MemoryEffect::from_manifest(&manifest));
        let counter = RebindCounter::new();
        assert!(TextureVariable::bind(&effect, "diffuse_map", counter).is_err());
    }
}
