use std::rc::Rc;

use crate::effect::telemetry::{null_telemetry, LogTelemetry};
use crate::effect::Telemetry;
use crate::settings::{EffectSettings, OrderCheck, Resolution};

/// Capabilities handed to every effect wrapper at construction.
#[derive(Clone)]
pub struct BindingContext {
    pub telemetry: Telemetry,
    pub order_check: OrderCheck,
    pub resolution: Resolution,
}

impl BindingContext {
    pub fn new(telemetry: Telemetry, order_check: OrderCheck) -> Self {
        Self {
            telemetry,
            order_check,
            resolution: Resolution::default(),
        }
    }

    pub fn from_settings(settings: &EffectSettings) -> Self {
        let telemetry: Telemetry = if settings.trace_texture_rebinds {
            Rc::new(LogTelemetry)
        } else {
            null_telemetry()
        };

        Self {
            telemetry,
            order_check: settings.update_order,
            resolution: settings.resolution,
        }
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }
}

impl Default for BindingContext {
    fn default() -> Self {
        Self::new(null_telemetry(), OrderCheck::default())
    }
}
