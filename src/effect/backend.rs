use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{
    EffectError, Result, TechniqueDesc, TechniqueHandle, TextureHandle, VariableDesc,
    VariableHandle,
};

/// Boundary to a compiled effect blob.
///
/// Implementations own the storage behind every variable slot. Writes are
/// whole-slot: `bytes.len()` always equals `desc.byte_size()`.
pub trait EffectBackend {
    fn technique(&self, name: &str) -> Option<(TechniqueHandle, &TechniqueDesc)>;

    fn variable(&self, name: &str) -> Option<(VariableHandle, &VariableDesc)>;

    fn write(&mut self, variable: VariableHandle, bytes: &[u8]);

    fn read(&self, variable: VariableHandle) -> Vec<u8>;

    fn bind_texture(&mut self, variable: VariableHandle, texture: Option<TextureHandle>);

    fn texture(&self, variable: VariableHandle) -> Option<TextureHandle>;
}

/// Shared handle to a loaded effect.
///
/// Binders and wrappers keep clones of this; all of them must live on the
/// rendering thread, which `Rc` enforces.
#[derive(Clone)]
pub struct Effect {
    name: Rc<str>,
    backend: Rc<RefCell<dyn EffectBackend>>,
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect").field("name", &self.name).finish()
    }
}

impl Effect {
    pub fn new<B: EffectBackend + 'static>(name: &str, backend: B) -> Self {
        Self::shared(name, Rc::new(RefCell::new(backend)))
    }

    /// Wraps a backend the caller keeps typed access to (e.g. to flush it).
    pub fn shared<B: EffectBackend + 'static>(name: &str, backend: Rc<RefCell<B>>) -> Self {
        Self {
            name: Rc::from(name),
            backend,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn technique(&self, name: &str) -> Result<(TechniqueHandle, TechniqueDesc)> {
        self.backend
            .borrow()
            .technique(name)
            .map(|(handle, desc)| (handle, desc.clone()))
            .ok_or_else(|| EffectError::MissingTechnique {
                effect: self.name.to_string(),
                name: name.to_string(),
            })
    }

    pub fn variable(&self, name: &str) -> Result<(VariableHandle, VariableDesc)> {
        self.backend
            .borrow()
            .variable(name)
            .map(|(handle, desc)| (handle, desc.clone()))
            .ok_or_else(|| EffectError::MissingVariable {
                effect: self.name.to_string(),
                name: name.to_string(),
            })
    }

    pub(crate) fn write(&self, variable: VariableHandle, bytes: &[u8]) {
        self.backend.borrow_mut().write(variable, bytes);
    }

    pub(crate) fn read(&self, variable: VariableHandle) -> Vec<u8> {
        self.backend.borrow().read(variable)
    }

    pub(crate) fn bind_texture(&self, variable: VariableHandle, texture: Option<TextureHandle>) {
        self.backend.borrow_mut().bind_texture(variable, texture);
    }

    pub(crate) fn texture(&self, variable: VariableHandle) -> Option<TextureHandle> {
        self.backend.borrow().texture(variable)
    }
}
