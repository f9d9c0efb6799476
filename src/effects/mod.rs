//! Effect wrappers, one per shader family.
//!
//! Every wrapper resolves all of its techniques and variables when it is
//! constructed and exposes update entry points by change frequency:
//! globals, per frame, per object, per skinning and per instance.

mod basic;
mod billboard;
pub mod common;
mod context;
mod deferred;
mod order;
mod particles;
mod post_process;
mod shadow_map;
mod state;
mod terrain;

pub use basic::BasicEffect;
pub use billboard::{BillboardEffect, BillboardState};
pub use context::BindingContext;
pub use deferred::{
    point_light_volume, spot_light_volume, ComposerTechnique, DeferredComposer, MAX_SPOT_HALF_ANGLE,
};
pub use order::{UpdateGuard, UpdateStage, Updates};
pub use particles::{EmitterState, ParticleAppearance, ParticleEffect};
pub use post_process::{BloomSettings, PostProcessEffect, PostProcessInputs, PostProcessPass};
pub use shadow_map::ShadowMapEffect;
pub use state::{
    Fog, FrameState, GlobalState, LodThresholds, ObjectState, ShadowState, TerrainState,
};
pub use terrain::TerrainEffect;
