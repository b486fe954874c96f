use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use uuid::Uuid;

/// A resource that can break down while being worked on.
pub trait Malfunctionable: Send + Sync {
    fn resource_id(&self) -> Uuid;

    fn resource_name(&self) -> &str;

    fn has_malfunction(&self) -> bool;

    /// Multiplier applied to accident chances (wear and tear).
    fn accident_modifier(&self) -> f64 {
        1.0
    }

    /// Register an accident. The resource malfunctions until repaired.
    fn record_accident(&self);
}

/// Shared malfunction bookkeeping for resources.
#[derive(Debug)]
pub struct MalfunctionFlag {
    active: AtomicBool,
    accidents: AtomicU32,
    wear_modifier: f64,
}

impl Default for MalfunctionFlag {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl MalfunctionFlag {
    pub fn new(wear_modifier: f64) -> Self {
        Self {
            active: AtomicBool::new(false),
            accidents: AtomicU32::new(0),
            wear_modifier: wear_modifier.max(0.0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn set(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    pub fn record_accident(&self) {
        self.accidents.fetch_add(1, Ordering::AcqRel);
        self.set(true);
    }

    pub fn accidents(&self) -> u32 {
        self.accidents.load(Ordering::Acquire)
    }

    pub fn wear_modifier(&self) -> f64 {
        self.wear_modifier
    }
}
