use std::fmt;

use serde::{Deserialize, Serialize};

use super::VertexFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    Drawing,
    StreamOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderMode {
    Forward,
    Deferred,
    ShadowMap,
}

/// Everything the selector needs to know about one draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawCallDescriptor {
    pub format: VertexFormat,
    pub instanced: bool,
    pub stage: PipelineStage,
    pub mode: RenderMode,
    /// Particle formats only.
    pub rotation: Option<bool>,
}

impl DrawCallDescriptor {
    /// Non-instanced forward draw in the drawing stage.
    pub fn new(format: VertexFormat) -> Self {
        Self {
            format,
            instanced: false,
            stage: PipelineStage::Drawing,
            mode: RenderMode::Forward,
            rotation: None,
        }
    }

    pub fn instanced(mut self, instanced: bool) -> Self {
        self.instanced = instanced;
        self
    }

    pub fn with_stage(mut self, stage: PipelineStage) -> Self {
        self.stage = stage;
        self
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_rotation(mut self, rotation: bool) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Dispatch key for this draw. Rotation only distinguishes particle
    /// techniques in the drawing stage and is dropped everywhere else.
    pub fn key(&self) -> TechniqueKey {
        let rotation = self.format.is_particle()
            && self.stage == PipelineStage::Drawing
            && self.rotation.unwrap_or(false);

        TechniqueKey {
            stage: self.stage,
            mode: self.mode,
            format: self.format,
            instanced: self.instanced,
            rotation,
        }
    }
}

impl fmt::Display for DrawCallDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(format: {}, instanced: {}, stage: {:?}, mode: {:?}",
            self.format.name(),
            self.instanced,
            self.stage,
            self.mode
        )?;
        if let Some(rotation) = self.rotation {
            write!(f, ", rotation: {rotation}")?;
        }
        write!(f, ")")
    }
}

/// Normalized dispatch key. Each key names exactly one technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TechniqueKey {
    pub stage: PipelineStage,
    pub mode: RenderMode,
    pub format: VertexFormat,
    pub instanced: bool,
    pub rotation: bool,
}

impl TechniqueKey {
    pub const fn drawing(mode: RenderMode, format: VertexFormat, instanced: bool) -> Self {
        Self {
            stage: PipelineStage::Drawing,
            mode,
            format,
            instanced,
            rotation: false,
        }
    }

    pub const fn stream_out(mode: RenderMode, format: VertexFormat) -> Self {
        Self {
            stage: PipelineStage::StreamOut,
            mode,
            format,
            instanced: false,
            rotation: false,
        }
    }

    pub const fn rotated(mut self) -> Self {
        self.rotation = true;
        self
    }

    /// Name of the technique inside the compiled effect, e.g.
    /// `Forward_PositionNormalTextureSkinned_Instanced`.
    pub fn technique_name(&self) -> String {
        let mut name = String::new();
        if self.stage == PipelineStage::StreamOut {
            name.push_str("StreamOut_");
        }
        name.push_str(match self.mode {
            RenderMode::Forward => "Forward",
            RenderMode::Deferred => "Deferred",
            RenderMode::ShadowMap => "ShadowMap",
        });
        name.push('_');
        name.push_str(self.format.name());
        if self.instanced {
            name.push_str("_Instanced");
        }
        if self.rotation {
            name.push_str("_Rotation");
        }
        name
    }

    /// The descriptor that maps onto this key.
    pub fn descriptor(&self) -> DrawCallDescriptor {
        DrawCallDescriptor {
            format: self.format,
            instanced: self.instanced,
            stage: self.stage,
            mode: self.mode,
            rotation: self.format.is_particle().then_some(self.rotation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_is_ignored_outside_particle_drawing() {
        let mesh = DrawCallDescriptor::new(VertexFormat::PositionNormalTexture).with_rotation(true);
        assert!(!mesh.key().rotation);

        let stream_out = DrawCallDescriptor::new(VertexFormat::Particle)
            .with_stage(PipelineStage::StreamOut)
            .with_rotation(true);
        assert!(!stream_out.key().rotation);

        let drawing = DrawCallDescriptor::new(VertexFormat::Particle).with_rotation(true);
        assert!(drawing.key().rotation);
    }

    #[test]
    fn technique_names_encode_every_key_field() {
        let key = TechniqueKey::drawing(
            RenderMode::Forward,
            VertexFormat::PositionNormalTextureSkinned,
            true,
        );
        assert_eq!(
            key.technique_name(),
            "Forward_PositionNormalTextureSkinned_Instanced"
        );

        let key = TechniqueKey::stream_out(RenderMode::Deferred, VertexFormat::GpuParticle);
        assert_eq!(key.technique_name(), "StreamOut_Deferred_GpuParticle");

        let key = TechniqueKey::drawing(RenderMode::Forward, VertexFormat::Particle, false).rotated();
        assert_eq!(key.technique_name(), "Forward_Particle_Rotation");
    }

    #[test]
    fn key_descriptor_roundtrip() {
        let key = TechniqueKey::drawing(RenderMode::Deferred, VertexFormat::GpuParticle, false).rotated();
        assert_eq!(key.descriptor().key(), key);
    }

    #[test]
    fn display_names_the_tuple() {
        let text = DrawCallDescriptor::new(VertexFormat::Terrain)
            .with_mode(RenderMode::ShadowMap)
            .instanced(true)
            .to_string();
        assert!(text.contains("Terrain"));
        assert!(text.contains("instanced: true"));
        assert!(text.contains("ShadowMap"));
    }
}
