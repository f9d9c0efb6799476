//! wgpu-backed effects.

mod effect;
mod pipeline;
mod slots;
mod textures;
mod uniform;

pub use effect::GpuEffect;
pub use pipeline::PipelineBuilder;
pub use slots::SlotTable;
pub use textures::TextureRegistry;
pub use uniform::{UniformBlockLayout, UniformEntry, UniformShadow};
