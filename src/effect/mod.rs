mod backend;
mod error;
mod handle;
mod manifest;
mod memory;
pub mod telemetry;

pub use backend::{Effect, EffectBackend};
pub use error::{EffectError, Result};
pub use handle::{
    GpuTexture, Handle, TechniqueHandle, TechniqueSlot, TextureHandle, VariableHandle,
    VariableSlot,
};
pub use manifest::{EffectManifest, TechniqueDesc, VariableDesc};
pub use memory::MemoryEffect;
pub use telemetry::{BindingTelemetry, LogTelemetry, NullTelemetry, RebindCounter, Telemetry};
