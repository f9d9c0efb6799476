//! Effect binding layer: selects the technique for a draw call, binds typed
//! shader parameters, packs visible lights into fixed arrays and drives the
//! deferred light composition passes.

pub mod binding;
pub mod composition;
pub mod effect;
pub mod effects;
pub mod gpu;
pub mod lights;
pub mod settings;
pub mod technique;

pub use effect::{Effect, EffectError, EffectManifest, Result};
pub use settings::EffectSettings;

/// Installs `env_logger` at `info` unless `RUST_LOG` says otherwise. Safe to
/// call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
