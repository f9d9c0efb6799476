use std::cell::Cell;

use bitflags::bitflags;

use crate::settings::OrderCheck;

bitflags! {
    /// Update entry points performed since the current frame started.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Updates: u8 {
        const GLOBALS = 1 << 0;
        const PER_FRAME = 1 << 1;
        const PER_OBJECT = 1 << 2;
        const PER_SKINNING = 1 << 3;
        const PER_INSTANCE = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStage {
    Globals,
    PerFrame,
    PerObject,
    PerSkinning,
    PerInstance,
}

/// Tracks the frequency order of update calls on one wrapper.
///
/// Expected order per frame: globals (optional) → per-frame → per-object,
/// each followed by any per-skinning / per-instance calls. A per-frame call
/// (or a globals call after a frame has started) opens a new frame. Out of
/// order calls leave stale shader state for the next draw.
pub struct UpdateGuard {
    family: &'static str,
    mode: OrderCheck,
    performed: Cell<Updates>,
    violations: Cell<u64>,
}

impl UpdateGuard {
    pub fn new(family: &'static str, mode: OrderCheck) -> Self {
        Self {
            family,
            mode,
            performed: Cell::new(Updates::empty()),
            violations: Cell::new(0),
        }
    }

    pub fn record(&self, stage: UpdateStage) {
        let performed = self.performed.get();
        let (in_order, next) = match stage {
            UpdateStage::Globals => (true, Updates::GLOBALS),
            UpdateStage::PerFrame => {
                if performed.intersects(Updates::PER_FRAME | Updates::PER_OBJECT) {
                    (true, Updates::PER_FRAME)
                } else {
                    (true, performed | Updates::PER_FRAME)
                }
            }
            UpdateStage::PerObject => (
                performed.contains(Updates::PER_FRAME),
                performed | Updates::PER_OBJECT,
            ),
            UpdateStage::PerSkinning => (
                performed.contains(Updates::PER_OBJECT),
                performed | Updates::PER_SKINNING,
            ),
            UpdateStage::PerInstance => (
                performed.contains(Updates::PER_OBJECT),
                performed | Updates::PER_INSTANCE,
            ),
        };

        if !in_order {
            self.violation(stage, performed);
        }
        self.performed.set(next);
    }

    fn violation(&self, stage: UpdateStage, performed: Updates) {
        self.violations.set(self.violations.get() + 1);
        match self.mode {
            OrderCheck::Off => {}
            OrderCheck::Warn => log::warn!(
                "{}: {:?} called out of order (performed this frame: {:?})",
                self.family,
                stage,
                performed
            ),
            OrderCheck::Panic => panic!(
                "{}: {:?} called out of order (performed this frame: {:?})",
                self.family, stage, performed
            ),
        }
    }

    pub fn performed(&self) -> Updates {
        self.performed.get()
    }

    pub fn violations(&self) -> u64 {
        self.violations.get()
    }
}
