use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Receives diagnostic events from parameter binders.
///
/// Injected per binder so counters stay scoped to whoever created them.
pub trait BindingTelemetry {
    /// A texture slot performed an actual write (the handle changed).
    fn texture_rebound(&self, effect: &str, slot: &str);
}

pub type Telemetry = Rc<dyn BindingTelemetry>;

pub struct NullTelemetry;

impl BindingTelemetry for NullTelemetry {
    fn texture_rebound(&self, _effect: &str, _slot: &str) {}
}

pub fn null_telemetry() -> Telemetry {
    Rc::new(NullTelemetry)
}

/// Trace-logs every rebind.
pub struct LogTelemetry;

impl BindingTelemetry for LogTelemetry {
    fn texture_rebound(&self, effect: &str, slot: &str) {
        log::trace!("{effect}: rebound texture slot '{slot}'");
    }
}

#[derive(Default)]
pub struct RebindCounter {
    total: Cell<u64>,
    per_slot: RefCell<HashMap<String, u64>>,
}

impl RebindCounter {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn total(&self) -> u64 {
        self.total.get()
    }

    pub fn for_slot(&self, slot: &str) -> u64 {
        self.per_slot.borrow().get(slot).copied().unwrap_or(0)
    }

    /// Returns the total before clearing, for per-frame stats.
    pub fn reset(&self) -> u64 {
        self.per_slot.borrow_mut().clear();
        self.total.replace(0)
    }
}

impl BindingTelemetry for RebindCounter {
    fn texture_rebound(&self, _effect: &str, slot: &str) {
        self.total.set(self.total.get() + 1);
        *self
            .per_slot
            .borrow_mut()
            .entry(slot.to_string())
            .or_insert(0) += 1;
    }
}
