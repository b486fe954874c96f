use std::collections::HashSet;
use std::sync::Arc;

use outpost_settlement::Settlement;
use outpost_types::{Malfunctionable, ProcessSpec, RatingScore};
use uuid::Uuid;

use crate::candidate::SettlementTask;
use crate::descriptor::MetaTask;

/// Base score of any process candidate before value and commerce.
pub const PROCESS_BASE_SCORE: f64 = 25.0;
/// Points per unit of average output value.
pub const PROCESS_VALUE_WEIGHT: f64 = 10.0;
/// Base score of medical candidates.
pub const MEDICAL_BASE_SCORE: f64 = 40.0;
/// Points per waiting patient.
pub const MEDICAL_PATIENT_WEIGHT: f64 = 5.0;

/// Candidates for a process-backed descriptor: one per workshop of the
/// descriptor's kind that has room to start queued work or live work to join.
///
/// Queued specs are handed out to workshops in building order so no spec
/// is counted twice. New-start demand is `min(startable specs, free slots)`,
/// or zero while the settlement overrides new processes of this kind; live
/// processes still needing labor add one unit each.
pub fn process_candidates(meta: &Arc<MetaTask>, settlement: &Settlement) -> Vec<SettlementTask> {
    let Some(kind) = meta.profile.process_kind else {
        return Vec::new();
    };
    let Ok(queue) = settlement.queue(kind) else {
        return Vec::new();
    };
    let overridden = settlement.has_process_override(kind);
    let commerce = settlement.commerce_factor(kind);
    let mut allocated_ids: HashSet<Uuid> = HashSet::new();
    let mut candidates = Vec::new();

    for workshop in settlement.workshops(kind) {
        if workshop.has_malfunction() {
            continue;
        }

        let free = if overridden { 0 } else { workshop.free_slots() };
        let allocated: Vec<ProcessSpec> = if free == 0 {
            Vec::new()
        } else {
            queue
                .startable(workshop.tech_level(), workshop.tools())
                .into_iter()
                .filter(|spec| !allocated_ids.contains(&spec.id))
                .take(free)
                .collect()
        };
        allocated_ids.extend(allocated.iter().map(|s| s.id));

        let live = workshop.processes_needing_work();
        let demand = allocated.len() + live.len();
        if demand == 0 {
            continue;
        }

        // Any live work sets the bar at its easiest requirement.
        let min_skill = if live.is_empty() {
            allocated.iter().map(|s| s.skill_required).min()
        } else {
            live.iter().map(|p| p.spec.skill_required).min()
        }
        .unwrap_or(0);

        let values: Vec<f64> = allocated
            .iter()
            .map(|s| s.value)
            .chain(live.iter().map(|p| p.spec.value))
            .collect();
        let mean_value = values.iter().sum::<f64>() / values.len() as f64;

        let mut base = RatingScore::new(PROCESS_BASE_SCORE);
        base.add_base("value", mean_value * PROCESS_VALUE_WEIGHT);
        base.add_modifier("commerce", commerce);

        tracing::debug!(
            meta_task = %meta.name,
            workshop = %workshop.name(),
            demand,
            min_skill,
            "process candidate"
        );
        candidates.push(
            SettlementTask::new(Arc::clone(meta), workshop.building_id(), demand as u32, base)
                .with_min_skill(min_skill)
                .with_description(format!("{} at {}", meta.name, workshop.name())),
        );
    }
    candidates
}

/// Candidates for treating patients: one per working sick bay with patients.
pub fn medical_candidates(meta: &Arc<MetaTask>, settlement: &Settlement) -> Vec<SettlementTask> {
    settlement
        .sick_bays()
        .filter(|bay| !bay.has_malfunction())
        .filter_map(|bay| {
            let patients = bay.patient_count();
            let min_skill = bay.min_required_skill()?;
            let mut base = RatingScore::new(MEDICAL_BASE_SCORE);
            base.add_base("patients", patients as f64 * MEDICAL_PATIENT_WEIGHT);
            Some(
                SettlementTask::new(Arc::clone(meta), bay.resource_id(), patients as u32, base)
                    .with_min_skill(min_skill)
                    .with_description(format!("{} at {}", meta.name, bay.resource_name())),
            )
        })
        .collect()
}
