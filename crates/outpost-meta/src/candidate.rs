use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outpost_types::{ProcessKind, RatingScore};

use crate::descriptor::MetaTask;

/// One concrete piece of work a descriptor found in the settlement this pulse.
///
/// Candidates are rebuilt every pulse and dropped at its end, claimed or not.
#[derive(Debug, Clone)]
pub struct SettlementTask {
    pub meta: Arc<MetaTask>,
    /// Building where the work happens.
    pub building_id: Uuid,
    pub process_kind: Option<ProcessKind>,
    /// Lowest skill a worker needs for this candidate to be worth dispatching.
    pub min_skill: u32,
    /// How many workers could usefully start on this right now.
    pub demand: u32,
    pub base: RatingScore,
    pub description: String,
}

impl SettlementTask {
    pub fn new(meta: Arc<MetaTask>, building_id: Uuid, demand: u32, base: RatingScore) -> Self {
        let description = meta.name.clone();
        Self {
            process_kind: meta.profile.process_kind,
            meta,
            building_id,
            min_skill: 0,
            demand,
            base,
            description,
        }
    }

    pub fn with_min_skill(mut self, min_skill: u32) -> Self {
        self.min_skill = min_skill;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Take one unit of demand for an assignment. Returns false once exhausted.
    pub fn consume_demand(&mut self) -> bool {
        if self.demand == 0 {
            return false;
        }
        self.demand -= 1;
        true
    }

    pub fn summary(&self) -> CandidateSummary {
        CandidateSummary {
            meta_task: self.meta.name.clone(),
            building_id: self.building_id,
            process_kind: self.process_kind,
            min_skill: self.min_skill,
            demand: self.demand,
            base_score: self.base.score(),
            description: self.description.clone(),
        }
    }
}

/// Serializable view of a candidate for logs and dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub meta_task: String,
    pub building_id: Uuid,
    pub process_kind: Option<ProcessKind>,
    pub min_skill: u32,
    pub demand: u32,
    pub base_score: f64,
    pub description: String,
}
