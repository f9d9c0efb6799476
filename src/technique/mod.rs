mod descriptor;
mod registry;
mod vertex_format;

pub use descriptor::{DrawCallDescriptor, PipelineStage, RenderMode, TechniqueKey};
pub use registry::{Technique, TechniqueDispatch, TechniqueTable};
#[cfg(test)]
pub(crate) use registry::assert_dispatch_over_every_descriptor;
pub use vertex_format::{
    AttributeFormat, BufferLayout, InputLayout, InstanceData, Semantic, StepMode,
    VertexAttribute, VertexFormat,
};
