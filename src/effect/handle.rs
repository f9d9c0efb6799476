use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Opaque index into a resource table owned elsewhere.
pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

impl<T> Handle<T> {
    pub const fn new(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub const fn index(&self) -> u32 {
        self.index
    }
}

/// Marker for compiled technique handles.
pub enum TechniqueSlot {}
/// Marker for shader variable handles.
pub enum VariableSlot {}
/// Marker for GPU texture / render target handles supplied by the engine.
pub enum GpuTexture {}

pub type TechniqueHandle = Handle<TechniqueSlot>;
pub type VariableHandle = Handle<VariableSlot>;
pub type TextureHandle = Handle<GpuTexture>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_copy() {
        let h1 = TextureHandle::new(5);
        let h2 = h1;
        let h3 = h1;
        assert_eq!(h1.index(), h2.index());
        assert_eq!(h1, h3);
    }

    #[test]
    fn handles_compare_by_index() {
        assert_ne!(TechniqueHandle::new(1), TechniqueHandle::new(2));
        assert_eq!(format!("{:?}", VariableHandle::new(7)), "Handle(7)");
    }
}
