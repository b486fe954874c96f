use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outpost_types::ProcessSpec;

/// Remaining amounts below this are treated as finished.
const EPSILON: f64 = 1e-9;

/// An in-progress process occupying one workshop slot.
///
/// Labor (`work_time_remaining`) and elapsed cooking time
/// (`process_time_remaining`) count down independently; the process is
/// complete only when both have reached zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveProcess {
    pub id: Uuid,
    pub spec: ProcessSpec,
    pub building_id: Uuid,
    work_time_remaining: f64,
    process_time_remaining: f64,
    /// Highest skill level among the workers that contributed labor.
    best_skill: u32,
}

impl LiveProcess {
    pub fn new(spec: ProcessSpec, building_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            work_time_remaining: spec.work_time.max(0.0),
            process_time_remaining: spec.process_time.max(0.0),
            spec,
            building_id,
            best_skill: 0,
        }
    }

    /// Apply labor. Returns the time actually consumed, never more than
    /// the remaining work time.
    pub fn add_work_time(&mut self, amount: f64, skill: u32) -> f64 {
        if amount <= 0.0 || self.work_time_remaining <= 0.0 {
            return 0.0;
        }
        let consumed = amount.min(self.work_time_remaining);
        self.work_time_remaining -= consumed;
        if self.work_time_remaining < EPSILON {
            self.work_time_remaining = 0.0;
        }
        self.best_skill = self.best_skill.max(skill);
        consumed
    }

    /// Let elapsed time pass. Returns the time actually consumed.
    pub fn add_process_time(&mut self, elapsed: f64) -> f64 {
        if elapsed <= 0.0 || self.process_time_remaining <= 0.0 {
            return 0.0;
        }
        let consumed = elapsed.min(self.process_time_remaining);
        self.process_time_remaining -= consumed;
        if self.process_time_remaining < EPSILON {
            self.process_time_remaining = 0.0;
        }
        consumed
    }

    pub fn work_time_remaining(&self) -> f64 {
        self.work_time_remaining
    }

    pub fn process_time_remaining(&self) -> f64 {
        self.process_time_remaining
    }

    pub fn best_skill(&self) -> u32 {
        self.best_skill
    }

    pub fn needs_work(&self) -> bool {
        self.work_time_remaining > 0.0
    }

    pub fn is_complete(&self) -> bool {
        self.work_time_remaining <= 0.0 && self.process_time_remaining <= 0.0
    }
}
