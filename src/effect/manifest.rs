use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::binding::VariableKind;
use crate::technique::{InputLayout, TechniqueKey};

use super::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechniqueDesc {
    pub name: String,
    pub layout: InputLayout,
}

impl TechniqueDesc {
    pub fn new(name: &str, layout: InputLayout) -> Self {
        Self {
            name: name.to_string(),
            layout,
        }
    }

    pub fn for_key(key: &TechniqueKey) -> Self {
        Self {
            name: key.technique_name(),
            layout: InputLayout::for_format(key.format, key.instanced),
        }
    }
}

/// Declared shape of one shader variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDesc {
    pub name: String,
    pub kind: VariableKind,
    /// Bytes per element.
    pub stride: usize,
    #[serde(default = "VariableDesc::default_elements")]
    pub elements: usize,
}

impl VariableDesc {
    pub fn new(name: &str, kind: VariableKind, stride: usize, elements: usize) -> Self {
        Self {
            name: name.to_string(),
            kind,
            stride,
            elements,
        }
    }

    pub fn texture(name: &str) -> Self {
        Self::new(name, VariableKind::Texture, 0, 1)
    }

    pub fn byte_size(&self) -> usize {
        self.stride * self.elements
    }

    const fn default_elements() -> usize {
        1
    }
}

/// Reflection of a compiled effect: every technique with its input signature
/// and every variable with its declared layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectManifest {
    pub name: String,
    #[serde(default)]
    pub techniques: Vec<TechniqueDesc>,
    #[serde(default)]
    pub variables: Vec<VariableDesc>,
}

impl EffectManifest {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_technique(mut self, technique: TechniqueDesc) -> Self {
        self.techniques.push(technique);
        self
    }

    pub fn with_techniques(mut self, keys: &[TechniqueKey]) -> Self {
        self.techniques.extend(keys.iter().map(TechniqueDesc::for_key));
        self
    }

    /// Adds variables, skipping names already declared.
    pub fn with_variables(mut self, variables: impl IntoIterator<Item = VariableDesc>) -> Self {
        for variable in variables {
            if self.variable(&variable.name).is_none() {
                self.variables.push(variable);
            }
        }
        self
    }

    pub fn technique(&self, name: &str) -> Option<&TechniqueDesc> {
        self.techniques.iter().find(|t| t.name == name)
    }

    pub fn technique_mut(&mut self, name: &str) -> Option<&mut TechniqueDesc> {
        self.techniques.iter_mut().find(|t| t.name == name)
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDesc> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut VariableDesc> {
        self.variables.iter_mut().find(|v| v.name == name)
    }

    pub fn remove_technique(&mut self, name: &str) -> bool {
        let before = self.techniques.len();
        self.techniques.retain(|t| t.name != name);
        self.techniques.len() != before
    }

    pub fn remove_variable(&mut self, name: &str) -> bool {
        let before = self.variables.len();
        self.variables.retain(|v| v.name != name);
        self.variables.len() != before
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let manifest = Self::from_json(&contents)?;
        log::info!(
            "Loaded effect manifest {:?}: {} techniques, {} variables",
            path,
            manifest.techniques.len(),
            manifest.variables.len()
        );
        Ok(manifest)
    }
}
