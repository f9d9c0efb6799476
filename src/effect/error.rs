use thiserror::Error;

use crate::binding::VariableKind;
use crate::technique::{DrawCallDescriptor, VertexFormat};

/// Errors raised while binding an effect or dispatching a draw call.
///
/// None of these are transient. They point at a mismatch between the engine and
/// the compiled effect (or an asset exceeding engine limits), so callers should
/// abort the draw or the effect load rather than retry.
#[derive(Error, Debug)]
pub enum EffectError {
    #[error("effect '{effect}' has no technique named '{name}'")]
    MissingTechnique { effect: String, name: String },

    #[error("effect '{effect}' has no variable named '{name}'")]
    MissingVariable { effect: String, name: String },

    #[error("variable '{name}' is declared as {found:?}, expected {expected:?}")]
    VariableKindMismatch {
        name: String,
        expected: VariableKind,
        found: VariableKind,
    },

    #[error("variable '{name}' has a stride of {found} bytes, expected {expected}")]
    StrideMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("variable '{name}' declares {found} elements, expected {expected}")]
    ElementCountMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "technique '{technique}' declares an input layout that does not match {format:?} (instanced: {instanced})"
    )]
    LayoutMismatch {
        technique: String,
        format: VertexFormat,
        instanced: bool,
    },

    #[error("{family} effect has no technique for {descriptor}")]
    UnsupportedCombination {
        family: &'static str,
        descriptor: DrawCallDescriptor,
    },

    #[error("variable '{name}' holds at most {capacity} elements, got {len}")]
    CapacityExceeded {
        name: String,
        capacity: usize,
        len: usize,
    },

    #[error("invalid effect manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("failed to read effect manifest: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EffectError>;
