use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::mem;

/// Attribute layout a mesh's vertices are stored in.
///
/// Skinned layouts are separate variants rather than a flag on the base format,
/// because their techniques are compiled against a different input signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexFormat {
    Position,
    PositionColor,
    PositionTexture,
    PositionNormalColor,
    PositionNormalTexture,
    PositionNormalTextureSkinned,
    PositionNormalTextureTangent,
    PositionNormalTextureTangentSkinned,
    Billboard,
    Particle,
    GpuParticle,
    Terrain,
}

impl VertexFormat {
    pub const ALL: [VertexFormat; 12] = [
        VertexFormat::Position,
        VertexFormat::PositionColor,
        VertexFormat::PositionTexture,
        VertexFormat::PositionNormalColor,
        VertexFormat::PositionNormalTexture,
        VertexFormat::PositionNormalTextureSkinned,
        VertexFormat::PositionNormalTextureTangent,
        VertexFormat::PositionNormalTextureTangentSkinned,
        VertexFormat::Billboard,
        VertexFormat::Particle,
        VertexFormat::GpuParticle,
        VertexFormat::Terrain,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            VertexFormat::Position => "Position",
            VertexFormat::PositionColor => "PositionColor",
            VertexFormat::PositionTexture => "PositionTexture",
            VertexFormat::PositionNormalColor => "PositionNormalColor",
            VertexFormat::PositionNormalTexture => "PositionNormalTexture",
            VertexFormat::PositionNormalTextureSkinned => "PositionNormalTextureSkinned",
            VertexFormat::PositionNormalTextureTangent => "PositionNormalTextureTangent",
            VertexFormat::PositionNormalTextureTangentSkinned => {
                "PositionNormalTextureTangentSkinned"
            }
            VertexFormat::Billboard => "Billboard",
            VertexFormat::Particle => "Particle",
            VertexFormat::GpuParticle => "GpuParticle",
            VertexFormat::Terrain => "Terrain",
        }
    }

    /// Per-vertex elements in declaration order.
    pub fn elements(self) -> &'static [(Semantic, AttributeFormat)] {
        use AttributeFormat::*;
        use Semantic::*;
        match self {
            VertexFormat::Position => &[(Position, Float32x3)],
            VertexFormat::PositionColor => &[(Position, Float32x3), (Color, Float32x4)],
            VertexFormat::PositionTexture => &[(Position, Float32x3), (TexCoord, Float32x2)],
            VertexFormat::PositionNormalColor => &[
                (Position, Float32x3),
                (Normal, Float32x3),
                (Color, Float32x4),
            ],
            VertexFormat::PositionNormalTexture => &[
                (Position, Float32x3),
                (Normal, Float32x3),
                (TexCoord, Float32x2),
            ],
            VertexFormat::PositionNormalTextureSkinned => &[
                (Position, Float32x3),
                (Normal, Float32x3),
                (TexCoord, Float32x2),
                (BlendIndices, Uint8x4),
                (BlendWeights, Float32x4),
            ],
            VertexFormat::PositionNormalTextureTangent => &[
                (Position, Float32x3),
                (Normal, Float32x3),
                (TexCoord, Float32x2),
                (Tangent, Float32x4),
            ],
            VertexFormat::PositionNormalTextureTangentSkinned => &[
                (Position, Float32x3),
                (Normal, Float32x3),
                (TexCoord, Float32x2),
                (Tangent, Float32x4),
                (BlendIndices, Uint8x4),
                (BlendWeights, Float32x4),
            ],
            VertexFormat::Billboard => &[(Position, Float32x3), (Size, Float32x2)],
            VertexFormat::Particle => &[
                (Position, Float32x3),
                (Velocity, Float32x3),
                (Size, Float32x2),
                (Age, Float32),
                (ParticleType, Uint32),
            ],
            VertexFormat::GpuParticle => &[
                (Position, Float32x3),
                (Velocity, Float32x3),
                (Color, Float32x4),
                (Size, Float32x2),
                (Age, Float32),
                (ParticleType, Uint32),
            ],
            VertexFormat::Terrain => &[
                (Position, Float32x3),
                (TexCoord, Float32x2),
                (BoundsY, Float32x2),
            ],
        }
    }

    pub fn is_skinned(self) -> bool {
        matches!(
            self,
            VertexFormat::PositionNormalTextureSkinned
                | VertexFormat::PositionNormalTextureTangentSkinned
        )
    }

    pub fn is_particle(self) -> bool {
        matches!(self, VertexFormat::Particle | VertexFormat::GpuParticle)
    }

    pub fn stride(self) -> u64 {
        self.elements().iter().map(|(_, format)| format.size()).sum()
    }
}

/// What a vertex element means to the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Semantic {
    Position,
    Color,
    Normal,
    TexCoord,
    Tangent,
    BlendIndices,
    BlendWeights,
    Size,
    Velocity,
    Age,
    ParticleType,
    BoundsY,
    InstanceWorld(u8),
    InstanceTextureIndex,
    InstanceMaterialIndex,
    InstanceAnimationOffset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
    Uint32,
    Uint8x4,
}

impl AttributeFormat {
    pub const fn size(self) -> u64 {
        match self {
            AttributeFormat::Float32 | AttributeFormat::Uint32 | AttributeFormat::Uint8x4 => 4,
            AttributeFormat::Float32x2 => 8,
            AttributeFormat::Float32x3 => 12,
            AttributeFormat::Float32x4 => 16,
        }
    }

    pub const fn to_wgpu(self) -> wgpu::VertexFormat {
        match self {
            AttributeFormat::Float32 => wgpu::VertexFormat::Float32,
            AttributeFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
            AttributeFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
            AttributeFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
            AttributeFormat::Uint32 => wgpu::VertexFormat::Uint32,
            AttributeFormat::Uint8x4 => wgpu::VertexFormat::Uint8x4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepMode {
    Vertex,
    Instance,
}

impl StepMode {
    pub const fn to_wgpu(self) -> wgpu::VertexStepMode {
        match self {
            StepMode::Vertex => wgpu::VertexStepMode::Vertex,
            StepMode::Instance => wgpu::VertexStepMode::Instance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexAttribute {
    pub semantic: Semantic,
    pub format: AttributeFormat,
    pub offset: u64,
    pub location: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferLayout {
    pub stride: u64,
    pub step_mode: StepMode,
    pub attributes: Vec<VertexAttribute>,
}

impl BufferLayout {
    fn from_elements(
        elements: &[(Semantic, AttributeFormat)],
        step_mode: StepMode,
        first_location: u32,
        stride: u64,
    ) -> Self {
        let mut offset = 0;
        let attributes = elements
            .iter()
            .enumerate()
            .map(|(i, &(semantic, format))| {
                let attribute = VertexAttribute {
                    semantic,
                    format,
                    offset,
                    location: first_location + i as u32,
                };
                offset += format.size();
                attribute
            })
            .collect();

        Self {
            stride,
            step_mode,
            attributes,
        }
    }

    pub fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes
            .iter()
            .map(|attribute| wgpu::VertexAttribute {
                format: attribute.format.to_wgpu(),
                offset: attribute.offset,
                shader_location: attribute.location,
            })
            .collect()
    }
}

/// Input signature a technique is compiled against: one per-vertex buffer and,
/// for instanced techniques, a per-instance buffer merged after it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputLayout {
    pub buffers: Vec<BufferLayout>,
}

impl InputLayout {
    pub fn for_format(format: VertexFormat, instanced: bool) -> Self {
        let elements = format.elements();
        let mut buffers = vec![BufferLayout::from_elements(
            elements,
            StepMode::Vertex,
            0,
            format.stride(),
        )];

        if instanced {
            buffers.push(BufferLayout::from_elements(
                &InstanceData::ELEMENTS,
                StepMode::Instance,
                elements.len() as u32,
                mem::size_of::<InstanceData>() as u64,
            ));
        }

        Self { buffers }
    }

    pub fn is_instanced(&self) -> bool {
        self.buffers
            .iter()
            .any(|buffer| buffer.step_mode == StepMode::Instance)
    }

    pub fn attribute_count(&self) -> usize {
        self.buffers.iter().map(|b| b.attributes.len()).sum()
    }
}

/// Per-instance stream for instanced techniques.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct InstanceData {
    pub world: [[f32; 4]; 4],  // 64 bytes
    pub texture_index: u32,    // 4 bytes
    pub material_index: u32,   // 4 bytes
    pub animation_offset: u32, // 4 bytes
    pub _padding: u32,         // 4 bytes (80 byte stride)
}

impl InstanceData {
    pub const ELEMENTS: [(Semantic, AttributeFormat); 7] = [
        (Semantic::InstanceWorld(0), AttributeFormat::Float32x4),
        (Semantic::InstanceWorld(1), AttributeFormat::Float32x4),
        (Semantic::InstanceWorld(2), AttributeFormat::Float32x4),
        (Semantic::InstanceWorld(3), AttributeFormat::Float32x4),
        (Semantic::InstanceTextureIndex, AttributeFormat::Uint32),
        (Semantic::InstanceMaterialIndex, AttributeFormat::Uint32),
        (Semantic::InstanceAnimationOffset, AttributeFormat::Uint32),
    ];

    pub fn new(world: Mat4, texture_index: u32, material_index: u32) -> Self {
        Self {
            world: world.to_cols_array_2d(),
            texture_index,
            material_index,
            animation_offset: 0,
            _padding: 0,
        }
    }

    pub fn with_animation_offset(mut self, offset: u32) -> Self {
        self.animation_offset = offset;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_data_is_80_bytes() {
        assert_eq!(mem::size_of::<InstanceData>(), 80);
    }

    #[test]
    fn position_normal_texture_stride_is_32() {
        assert_eq!(VertexFormat::PositionNormalTexture.stride(), 32);
    }

    #[test]
    fn skinned_layout_adds_blend_attributes() {
        let base = InputLayout::for_format(VertexFormat::PositionNormalTexture, false);
        let skinned = InputLayout::for_format(VertexFormat::PositionNormalTextureSkinned, false);

        assert_ne!(base, skinned);
        assert_eq!(skinned.attribute_count(), base.attribute_count() + 2);
        assert!(skinned.buffers[0]
            .attributes
            .iter()
            .any(|a| a.semantic == Semantic::BlendWeights));
    }

    #[test]
    fn instance_locations_follow_vertex_locations() {
        let layout = InputLayout::for_format(VertexFormat::PositionNormalTextureTangent, true);
        assert_eq!(layout.buffers.len(), 2);
        assert!(layout.is_instanced());

        let vertex = &layout.buffers[0];
        let instance = &layout.buffers[1];
        assert_eq!(instance.step_mode, StepMode::Instance);
        assert_eq!(instance.stride, 80);
        assert_eq!(
            instance.attributes[0].location,
            vertex.attributes.len() as u32
        );
        assert_eq!(instance.attributes[4].offset, 64);
    }

    #[test]
    fn wgpu_attributes_keep_offsets() {
        let layout = InputLayout::for_format(VertexFormat::PositionTexture, false);
        let attrs = layout.buffers[0].wgpu_attributes();
        assert_eq!(attrs[1].offset, 12);
        assert_eq!(attrs[1].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(attrs[1].shader_location, 1);
    }
}
