use std::collections::HashMap;

use crate::effect::TextureHandle;

/// Maps the opaque texture handles bound to effects onto wgpu views. Views
/// are created by the caller; the registry only hands out handles for them.
#[derive(Default)]
pub struct TextureRegistry {
    views: HashMap<TextureHandle, wgpu::TextureView>,
    next_index: u32,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, view: wgpu::TextureView) -> TextureHandle {
        let handle = TextureHandle::new(self.next_index);
        self.next_index += 1;
        self.views.insert(handle, view);
        handle
    }

    /// Points an existing handle at a new view, e.g. after a resize.
    pub fn replace(&mut self, handle: TextureHandle, view: wgpu::TextureView) -> bool {
        match self.views.get_mut(&handle) {
            Some(slot) => {
                *slot = view;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, handle: TextureHandle) -> Option<wgpu::TextureView> {
        self.views.remove(&handle)
    }

    pub fn get(&self, handle: TextureHandle) -> Option<&wgpu::TextureView> {
        self.views.get(&handle)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}
