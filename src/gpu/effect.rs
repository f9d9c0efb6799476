use crate::effect::{
    EffectBackend, EffectManifest, TechniqueDesc, TechniqueHandle, TextureHandle, VariableDesc,
    VariableHandle,
};

use super::slots::{SlotTable, SAMPLER_BINDING, UNIFORM_BINDING};
use super::{TextureRegistry, UniformBlockLayout};

/// Effect backed by one wgpu uniform buffer plus texture bindings.
///
/// Variable writes land in a CPU shadow copy; `flush` uploads the range
/// touched since the previous flush. Bind group layout:
/// `0` uniform block, `1` sampler, `2..` texture slots in manifest order.
pub struct GpuEffect {
    name: String,
    pipelines: Vec<Option<wgpu::RenderPipeline>>,
    table: SlotTable,
    buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl GpuEffect {
    pub fn new(device: &wgpu::Device, manifest: &EffectManifest) -> Self {
        let table = SlotTable::new(manifest);
        let layout = table.layout();

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} Uniforms", manifest.name)),
            size: layout.size() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut entries = vec![
            wgpu::BindGroupLayoutEntry {
                binding: UNIFORM_BINDING,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: SAMPLER_BINDING,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ];
        entries.extend(table.texture_bindings().map(|(binding, _)| {
            wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            }
        }));

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} Bind Layout", manifest.name)),
            entries: &entries,
        });

        log::info!(
            "Created GPU effect '{}': {} techniques, {} variables, {} byte uniform block",
            manifest.name,
            table.technique_count(),
            table.variable_count(),
            layout.size()
        );

        Self {
            name: manifest.name.clone(),
            pipelines: manifest.techniques.iter().map(|_| None).collect(),
            table,
            buffer,
            bind_group_layout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uniform_layout(&self) -> &UniformBlockLayout {
        self.table.layout()
    }

    pub fn slots(&self) -> &SlotTable {
        &self.table
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn attach_pipeline(&mut self, technique: TechniqueHandle, pipeline: wgpu::RenderPipeline) {
        if let Some(slot) = self.pipelines.get_mut(technique.index() as usize) {
            *slot = Some(pipeline);
        } else {
            log::warn!(
                "{}: no technique {:?} to attach a pipeline to",
                self.name,
                technique
            );
        }
    }

    pub fn pipeline(&self, technique: TechniqueHandle) -> Option<&wgpu::RenderPipeline> {
        self.pipelines
            .get(technique.index() as usize)
            .and_then(Option::as_ref)
    }

    /// Uploads the bytes written since the last flush. Returns whether an
    /// upload happened.
    pub fn flush(&mut self, queue: &wgpu::Queue) -> bool {
        match self.table.take_dirty() {
            Some((offset, bytes)) => {
                queue.write_buffer(&self.buffer, offset as u64, bytes);
                true
            }
            None => false,
        }
    }

    /// Bind group for the current texture bindings. Unbound slots, and
    /// handles missing from `registry`, sample `fallback`.
    pub fn create_bind_group(
        &self,
        device: &wgpu::Device,
        registry: &TextureRegistry,
        sampler: &wgpu::Sampler,
        fallback: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: UNIFORM_BINDING,
                resource: self.buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ];

        for (binding, texture) in self.table.texture_bindings() {
            let view = texture
                .and_then(|handle| registry.get(handle))
                .unwrap_or(fallback);
            entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Bind Group", self.name)),
            layout: &self.bind_group_layout,
            entries: &entries,
        })
    }
}

impl EffectBackend for GpuEffect {
    fn technique(&self, name: &str) -> Option<(TechniqueHandle, &TechniqueDesc)> {
        self.table.technique(name)
    }

    fn variable(&self, name: &str) -> Option<(VariableHandle, &VariableDesc)> {
        self.table.variable(name)
    }

    fn write(&mut self, variable: VariableHandle, bytes: &[u8]) {
        self.table.write(variable, bytes);
    }

    fn read(&self, variable: VariableHandle) -> Vec<u8> {
        self.table.read(variable)
    }

    fn bind_texture(&mut self, variable: VariableHandle, texture: Option<TextureHandle>) {
        self.table.bind_texture(variable, texture);
    }

    fn texture(&self, variable: VariableHandle) -> Option<TextureHandle> {
        self.table.texture(variable)
    }
}
