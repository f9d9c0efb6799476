use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectSettings {
    #[serde(default)]
    pub update_order: OrderCheck,
    #[serde(default)]
    pub trace_texture_rebinds: bool,
    #[serde(default)]
    pub resolution: Resolution,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            update_order: OrderCheck::default(),
            trace_texture_rebinds: false,
            resolution: Resolution::default(),
        }
    }
}

impl EffectSettings {
    pub fn load() -> Self {
        Self::load_from_path("effects.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|err| {
                warn!(
                    "Failed to parse {:?} ({}). Falling back to default effect settings.",
                    path, err
                );
                EffectSettings::default()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Effect settings file {:?} not found. Using default settings.",
                    path
                );
                EffectSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default effect settings.",
                    path, err
                );
                EffectSettings::default()
            }
        }
    }

    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<EffectSettings>(contents).map(EffectSettings::validate)
    }

    fn validate(mut self) -> Self {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }

        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Size of one texel in UV space.
    pub fn texel_size(&self) -> glam::Vec2 {
        glam::Vec2::new(
            1.0 / self.width.max(1) as f32,
            1.0 / self.height.max(1) as f32,
        )
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// What to do when update entry points are called out of frequency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderCheck {
    Off,
    Warn,
    Panic,
}

impl Default for OrderCheck {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            OrderCheck::Panic
        } else {
            OrderCheck::Off
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_replaces_invalid_resolution() {
        let settings = EffectSettings::from_json(
            r#"{ "resolution": { "width": 0, "height": 600 }, "update_order": "warn" }"#,
        )
        .unwrap();

        assert_eq!(settings.resolution, Resolution::default());
        assert_eq!(settings.update_order, OrderCheck::Warn);
    }

    #[test]
    fn validate_preserves_valid_values() {
        let settings = EffectSettings::from_json(
            r#"{ "resolution": { "width": 1920, "height": 1080 }, "trace_texture_rebinds": true }"#,
        )
        .unwrap();

        assert_eq!(settings.resolution.width, 1920);
        assert_eq!(settings.resolution.height, 1080);
        assert!(settings.trace_texture_rebinds);
        assert_eq!(settings.update_order, OrderCheck::default());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = EffectSettings::load_from_path("does/not/exist/effects.json");
        assert_eq!(settings.resolution, Resolution::default());
        assert!(!settings.trace_texture_rebinds);
    }

    #[test]
    fn texel_size_inverts_resolution() {
        let texel = Resolution {
            width: 200,
            height: 100,
        }
        .texel_size();
        assert!((texel.x - 0.005).abs() < 1e-7);
        assert!((texel.y - 0.01).abs() < 1e-7);
    }
}
