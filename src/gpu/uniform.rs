use std::ops::Range;

use crate::binding::VariableKind;
use crate::effect::VariableDesc;

const REGISTER: usize = 16;

fn align_up(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformEntry {
    pub name: String,
    pub offset: usize,
    pub size: usize,
}

/// Byte layout of an effect's uniform block, packed with WGSL uniform
/// address-space rules. Scalars align to 4 bytes, two-component vectors to 8
/// and wider vectors to 16. Matrices, arrays and structs align to 16 and round
/// their footprint up to 16. Texture variables take no space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformBlockLayout {
    entries: Vec<UniformEntry>,
    size: usize,
}

/// Alignment and footprint of one member.
fn placement(desc: &VariableDesc) -> (usize, usize) {
    let size = desc.byte_size();
    match desc.kind {
        VariableKind::Scalar | VariableKind::Vector if desc.elements == 1 => {
            let alignment = match size {
                0..=4 => 4,
                5..=8 => 8,
                _ => REGISTER,
            };
            (alignment, size)
        }
        _ => (REGISTER, align_up(size, REGISTER)),
    }
}

impl UniformBlockLayout {
    pub fn new<'a>(variables: impl IntoIterator<Item = &'a VariableDesc>) -> Self {
        let mut entries = Vec::new();
        let mut offset = 0;

        for desc in variables {
            if desc.kind == VariableKind::Texture {
                continue;
            }

            let (alignment, footprint) = placement(desc);
            offset = align_up(offset, alignment);
            entries.push(UniformEntry {
                name: desc.name.clone(),
                offset,
                size: desc.byte_size(),
            });
            offset += footprint;
        }

        Self {
            entries,
            size: align_up(offset, REGISTER),
        }
    }

    pub fn entry(&self, name: &str) -> Option<&UniformEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn entries(&self) -> &[UniformEntry] {
        &self.entries
    }

    /// Block size in bytes, a multiple of 16. Never zero, so an effect
    /// without uniforms still gets a bindable buffer.
    pub fn size(&self) -> usize {
        self.size.max(REGISTER)
    }
}

/// CPU copy of a uniform block and the byte range written since the last
/// upload.
#[derive(Debug, Clone)]
pub struct UniformShadow {
    bytes: Vec<u8>,
    dirty: Option<Range<usize>>,
}

impl UniformShadow {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
            dirty: None,
        }
    }

    /// Copies `data` at `offset`. Writes past the end are truncated.
    pub fn write(&mut self, offset: usize, data: &[u8]) {
        let end = (offset + data.len()).min(self.bytes.len());
        if offset >= end {
            return;
        }
        self.bytes[offset..end].copy_from_slice(&data[..end - offset]);
        self.dirty = Some(match self.dirty.take() {
            Some(dirty) => dirty.start.min(offset)..dirty.end.max(end),
            None => offset..end,
        });
    }

    pub fn read(&self, offset: usize, len: usize) -> &[u8] {
        let end = (offset + len).min(self.bytes.len());
        &self.bytes[offset.min(end)..end]
    }

    pub fn dirty(&self) -> Option<Range<usize>> {
        self.dirty.clone()
    }

    /// Takes the dirty range, widened to 4-byte alignment for
    /// `Queue::write_buffer`.
    pub fn take_dirty(&mut self) -> Option<(usize, &[u8])> {
        let dirty = self.dirty.take()?;
        let start = dirty.start / 4 * 4;
        let end = align_up(dirty.end, 4).min(self.bytes.len());
        Some((start, &self.bytes[start..end]))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ShaderValue;
    use crate::lights::{PointLight, MAX_POINT_LIGHTS};
    use glam::{Mat4, UVec3, Vec2, Vec3, Vec4};

    #[test]
    fn scalars_fill_the_tail_of_a_vec3() {
        let variables = [
            Vec3::desc("eye_position"),
            f32::desc("fog_start"),
            Vec2::desc("texel_size"),
            Vec3::desc("emitter_position"),
        ];
        let layout = UniformBlockLayout::new(&variables);

        assert_eq!(layout.entry("eye_position").unwrap().offset, 0);
        assert_eq!(layout.entry("fog_start").unwrap().offset, 12);
        assert_eq!(layout.entry("texel_size").unwrap().offset, 16);
        assert_eq!(layout.entry("emitter_position").unwrap().offset, 32);
        assert_eq!(layout.size(), 48);
    }

    #[test]
    fn matrices_arrays_and_structs_align_to_sixteen() {
        let variables = [
            f32::desc("alpha"),
            Mat4::desc("world"),
            u32::desc("material_index"),
            PointLight::array_desc("point_lights", MAX_POINT_LIGHTS),
            UVec3::desc("light_counts"),
            Vec4::desc("ambient_color"),
        ];
        let layout = UniformBlockLayout::new(&variables);

        assert_eq!(layout.entry("world").unwrap().offset, 16);
        assert_eq!(layout.entry("material_index").unwrap().offset, 80);
        assert_eq!(layout.entry("point_lights").unwrap().offset, 96);
        assert_eq!(layout.entry("light_counts").unwrap().offset, 96 + 48 * 4);
        assert_eq!(layout.entry("ambient_color").unwrap().offset, 96 + 48 * 4 + 16);
        assert_eq!(layout.size() % 16, 0);
    }

    #[test]
    fn small_members_pack_after_a_vec3() {
        let variables = [
            f32::desc("a"),
            Vec3::desc("b"),
            f32::desc("c"),
            Vec2::desc("d"),
        ];
        let layout = UniformBlockLayout::new(&variables);

        assert_eq!(layout.entry("a").unwrap().offset, 0);
        assert_eq!(layout.entry("b").unwrap().offset, 16);
        assert_eq!(layout.entry("c").unwrap().offset, 28);
        assert_eq!(layout.entry("d").unwrap().offset, 32);
        assert_eq!(layout.size(), 48);
    }

    #[test]
    fn vec2_aligns_to_eight_bytes() {
        let variables = [f32::desc("alpha"), Vec2::desc("texel_size"), f32::desc("beta")];
        let layout = UniformBlockLayout::new(&variables);

        assert_eq!(layout.entry("texel_size").unwrap().offset, 8);
        assert_eq!(layout.entry("beta").unwrap().offset, 16);
        assert_eq!(layout.size(), 32);
    }

    #[test]
    fn members_after_a_struct_start_past_its_rounded_size() {
        let variables = [
            VariableDesc::new("fog", VariableKind::Struct, 20, 1),
            f32::desc("alpha"),
        ];
        let layout = UniformBlockLayout::new(&variables);
        assert_eq!(layout.entry("alpha").unwrap().offset, 32);
    }

    #[test]
    fn textures_take_no_space() {
        let variables = [VariableDesc::texture("diffuse_map")];
        let layout = UniformBlockLayout::new(&variables);
        assert!(layout.entries().is_empty());
        assert_eq!(layout.size(), 16);
    }

    #[test]
    fn dirty_range_covers_all_writes_since_upload() {
        let mut shadow = UniformShadow::new(64);
        assert!(shadow.dirty().is_none());

        shadow.write(20, &[1, 2, 3, 4]);
        shadow.write(8, &[5; 4]);
        assert_eq!(shadow.dirty(), Some(8..24));

        let (offset, bytes) = shadow.take_dirty().unwrap();
        assert_eq!(offset, 8);
        assert_eq!(bytes.len(), 16);
        assert!(shadow.take_dirty().is_none());
        assert_eq!(shadow.read(20, 4), &[1, 2, 3, 4]);
    }
}
