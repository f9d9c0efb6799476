use std::collections::HashMap;

use crate::effect::{Effect, EffectError, Result, TechniqueDesc, TechniqueHandle};

use super::{DrawCallDescriptor, InputLayout, TechniqueKey, VertexFormat};

/// A technique resolved from an effect, with the input layout it was
/// validated against.
#[derive(Debug, Clone, PartialEq)]
pub struct Technique {
    handle: TechniqueHandle,
    name: String,
    layout: InputLayout,
}

impl Technique {
    /// Resolves `name` and checks that its declared layout is the one
    /// `format` (plus the instance stream, if `instanced`) produces.
    pub fn resolve(
        effect: &Effect,
        name: &str,
        format: VertexFormat,
        instanced: bool,
    ) -> Result<Self> {
        let (handle, TechniqueDesc { name, layout }) = effect.technique(name)?;
        if layout != InputLayout::for_format(format, instanced) {
            return Err(EffectError::LayoutMismatch {
                technique: name,
                format,
                instanced,
            });
        }

        Ok(Self {
            handle,
            name,
            layout,
        })
    }

    pub fn handle(&self) -> TechniqueHandle {
        self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &InputLayout {
        &self.layout
    }
}

/// Decision table from dispatch key to technique, filled eagerly at
/// construction. A lookup miss is an unsupported combination.
#[derive(Debug, Clone)]
pub struct TechniqueTable {
    family: &'static str,
    techniques: HashMap<TechniqueKey, Technique>,
}

impl TechniqueTable {
    pub fn resolve(effect: &Effect, family: &'static str, keys: &[TechniqueKey]) -> Result<Self> {
        let mut techniques = HashMap::with_capacity(keys.len());
        for key in keys {
            let technique = Technique::resolve(
                effect,
                &key.technique_name(),
                key.format,
                key.instanced,
            )?;
            techniques.insert(*key, technique);
        }

        log::debug!(
            "{family}: resolved {} techniques from '{}'",
            techniques.len(),
            effect.name()
        );

        Ok(Self { family, techniques })
    }

    pub fn select(&self, descriptor: &DrawCallDescriptor) -> Result<&Technique> {
        self.techniques.get(&descriptor.key()).ok_or_else(|| {
            log::debug!("{}: no technique for {}", self.family, descriptor);
            EffectError::UnsupportedCombination {
                family: self.family,
                descriptor: *descriptor,
            }
        })
    }

    pub fn get(&self, key: &TechniqueKey) -> Option<&Technique> {
        self.techniques.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TechniqueKey> {
        self.techniques.keys()
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    pub fn len(&self) -> usize {
        self.techniques.len()
    }

    pub fn is_empty(&self) -> bool {
        self.techniques.is_empty()
    }
}

/// Generic selection over a family's technique table.
///
/// Families whose passes do not fit the (format, instanced, stage, mode) key
/// do not implement this and expose named accessors instead.
pub trait TechniqueDispatch {
    fn techniques(&self) -> &TechniqueTable;

    fn select(&self, descriptor: &DrawCallDescriptor) -> Result<&Technique> {
        self.techniques().select(descriptor)
    }
}

/// Every descriptor a caller can build: each format, stage, mode,
/// instancing flag and rotation choice.
#[cfg(test)]
pub(crate) fn every_descriptor() -> Vec<DrawCallDescriptor> {
    use super::{PipelineStage, RenderMode};

    let mut descriptors = Vec::new();
    for format in VertexFormat::ALL {
        for stage in [PipelineStage::Drawing, PipelineStage::StreamOut] {
            for mode in [RenderMode::Forward, RenderMode::Deferred, RenderMode::ShadowMap] {
                for instanced in [false, true] {
                    let base = DrawCallDescriptor::new(format)
                        .with_stage(stage)
                        .with_mode(mode)
                        .instanced(instanced);
                    descriptors.push(base);
                    descriptors.push(base.with_rotation(false));
                    descriptors.push(base.with_rotation(true));
                }
            }
        }
    }
    descriptors
}

/// Runs `dispatch` over [`every_descriptor`]: descriptors whose key is in
/// `keys` must select the technique named after that key, all others must
/// fail as unsupported. Returns how many descriptors were accepted.
#[cfg(test)]
pub(crate) fn assert_dispatch_over_every_descriptor(
    dispatch: &impl TechniqueDispatch,
    keys: &[TechniqueKey],
) -> usize {
    let family = dispatch.techniques().family();
    let mut accepted = 0;
    for descriptor in every_descriptor() {
        let key = descriptor.key();
        match dispatch.select(&descriptor) {
            Ok(technique) => {
                assert!(keys.contains(&key), "{family} accepted {descriptor}");
                assert_eq!(technique.name(), key.technique_name(), "{descriptor}");
                assert_eq!(
                    technique.layout(),
                    &InputLayout::for_format(key.format, key.instanced)
                );
                accepted += 1;
            }
            Err(EffectError::UnsupportedCombination {
                family: reported,
                descriptor: rejected,
            }) => {
                assert!(!keys.contains(&key), "{family} rejected {descriptor}");
                assert_eq!(reported, family);
                assert_eq!(rejected, descriptor);
            }
            Err(err) => panic!("{family}: unexpected error for {descriptor}: {err}"),
        }
    }
    accepted
}
