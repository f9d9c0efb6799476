use std::collections::HashMap;

use super::{
    EffectBackend, EffectManifest, TechniqueDesc, TechniqueHandle, TextureHandle, VariableDesc,
    VariableHandle,
};

struct MemorySlot {
    desc: VariableDesc,
    bytes: Vec<u8>,
    texture: Option<TextureHandle>,
    writes: u64,
}

/// CPU-resident effect built from a manifest.
///
/// Every variable starts zeroed. Each `write`/`bind_texture` that reaches the
/// backend is counted so callers can observe the traffic a binder produced.
pub struct MemoryEffect {
    techniques: Vec<TechniqueDesc>,
    technique_lookup: HashMap<String, u32>,
    slots: Vec<MemorySlot>,
    slot_lookup: HashMap<String, u32>,
}

impl MemoryEffect {
    pub fn from_manifest(manifest: &EffectManifest) -> Self {
        let mut technique_lookup = HashMap::with_capacity(manifest.techniques.len());
        for (index, technique) in manifest.techniques.iter().enumerate() {
            technique_lookup.insert(technique.name.clone(), index as u32);
        }

        let mut slot_lookup = HashMap::with_capacity(manifest.variables.len());
        let slots = manifest
            .variables
            .iter()
            .enumerate()
            .map(|(index, desc)| {
                slot_lookup.insert(desc.name.clone(), index as u32);
                MemorySlot {
                    desc: desc.clone(),
                    bytes: vec![0; desc.byte_size()],
                    texture: None,
                    writes: 0,
                }
            })
            .collect();

        Self {
            techniques: manifest.techniques.clone(),
            technique_lookup,
            slots,
            slot_lookup,
        }
    }

    /// Backend writes performed on `name` (buffer writes and texture binds).
    pub fn write_count(&self, name: &str) -> u64 {
        self.slot_lookup
            .get(name)
            .map(|&index| self.slots[index as usize].writes)
            .unwrap_or(0)
    }

    pub fn total_writes(&self) -> u64 {
        self.slots.iter().map(|slot| slot.writes).sum()
    }

    pub fn reset_write_counts(&mut self) {
        for slot in &mut self.slots {
            slot.writes = 0;
        }
    }

    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        self.slot_lookup
            .get(name)
            .map(|&index| self.slots[index as usize].bytes.as_slice())
    }

    fn slot_mut(&mut self, variable: VariableHandle) -> &mut MemorySlot {
        &mut self.slots[variable.index() as usize]
    }
}

impl EffectBackend for MemoryEffect {
    fn technique(&self, name: &str) -> Option<(TechniqueHandle, &TechniqueDesc)> {
        self.technique_lookup
            .get(name)
            .map(|&index| (TechniqueHandle::new(index), &self.techniques[index as usize]))
    }

    fn variable(&self, name: &str) -> Option<(VariableHandle, &VariableDesc)> {
        self.slot_lookup
            .get(name)
            .map(|&index| (VariableHandle::new(index), &self.slots[index as usize].desc))
    }

    fn write(&mut self, variable: VariableHandle, bytes: &[u8]) {
        let slot = self.slot_mut(variable);
        debug_assert_eq!(slot.bytes.len(), bytes.len(), "{}", slot.desc.name);
        slot.bytes.copy_from_slice(bytes);
        slot.writes += 1;
    }

    fn read(&self, variable: VariableHandle) -> Vec<u8> {
        self.slots[variable.index() as usize].bytes.clone()
    }

    fn bind_texture(&mut self, variable: VariableHandle, texture: Option<TextureHandle>) {
        let slot = self.slot_mut(variable);
        slot.texture = texture;
        slot.writes += 1;
    }

    fn texture(&self, variable: VariableHandle) -> Option<TextureHandle> {
        self.slots[variable.index() as usize].texture
    }
}
