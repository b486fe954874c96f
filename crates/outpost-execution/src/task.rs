use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outpost_meta::{MetaTask, SettlementTask, TaskPhase};
use outpost_settlement::{Building, Settlement};
use outpost_types::{
    LocationSituation, Malfunctionable, OutpostError, OutpostEvent, ProcessKind, Result, Worker,
};

use crate::accident::AccidentModel;
use crate::experience::{apply_work_effects, effective_work_time};

/// Share of the offered budget handed back when a guard ends a task.
/// The rest is lost to the interruption.
pub const INTERRUPTION_REFUND: f64 = 0.75;
/// Millisols needed to walk into the target building.
pub const APPROACH_TIME: f64 = 2.0;
/// Leftover time below this counts as fully used.
const TIME_EPSILON: f64 = 1e-6;

/// Why a task stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    Completed,
    NoWorkAvailable,
    Malfunction,
    InvalidLocation,
    Incapacitated,
    Cancelled,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EndReason::Completed => "completed",
            EndReason::NoWorkAvailable => "no work available",
            EndReason::Malfunction => "malfunction",
            EndReason::InvalidLocation => "invalid location",
            EndReason::Incapacitated => "incapacitated",
            EndReason::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Serializable view of a task for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: Uuid,
    pub worker_id: Uuid,
    pub meta_task: String,
    pub building_id: Uuid,
    pub phase: Option<TaskPhase>,
    pub end_reason: Option<EndReason>,
    pub process_id: Option<Uuid>,
    pub elapsed: f64,
    pub experience: f64,
}

/// A worker's running activity, re-entered every pulse with a fresh budget.
///
/// All continuation state lives here: the current phase, the live process
/// being worked on and the progress made. A task never owns a process; it
/// only remembers which one it last fed.
#[derive(Debug, Clone)]
pub struct Task {
    id: Uuid,
    worker_id: Uuid,
    meta: Arc<MetaTask>,
    building_id: Uuid,
    min_skill: u32,
    phase: Option<TaskPhase>,
    end_reason: Option<EndReason>,
    process_id: Option<Uuid>,
    approach_remaining: f64,
    entered: bool,
    work_done: f64,
    elapsed: f64,
    experience: f64,
}

impl Task {
    /// Start a task for `worker_id` on a candidate.
    pub fn new(worker_id: Uuid, candidate: &SettlementTask) -> Self {
        let phase = candidate.meta.profile.phases.first().copied();
        Self {
            id: Uuid::new_v4(),
            worker_id,
            meta: Arc::clone(&candidate.meta),
            building_id: candidate.building_id,
            min_skill: candidate.min_skill,
            end_reason: phase.is_none().then_some(EndReason::Completed),
            phase,
            process_id: None,
            approach_remaining: APPROACH_TIME,
            entered: false,
            work_done: 0.0,
            elapsed: 0.0,
            experience: 0.0,
        }
    }

    /// Resume at a given phase, e.g. when restoring a saved task.
    pub fn with_phase(mut self, phase: TaskPhase) -> Self {
        self.phase = Some(phase);
        self.end_reason = None;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn worker_id(&self) -> Uuid {
        self.worker_id
    }

    pub fn meta(&self) -> &Arc<MetaTask> {
        &self.meta
    }

    pub fn building_id(&self) -> Uuid {
        self.building_id
    }

    /// Skill bar of the candidate this task was created from.
    pub fn min_skill(&self) -> u32 {
        self.min_skill
    }

    pub fn phase(&self) -> Option<TaskPhase> {
        self.phase
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn process_id(&self) -> Option<Uuid> {
        self.process_id
    }

    pub fn is_done(&self) -> bool {
        self.phase.is_none()
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn experience(&self) -> f64 {
        self.experience
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id,
            worker_id: self.worker_id,
            meta_task: self.meta.name.clone(),
            building_id: self.building_id,
            phase: self.phase,
            end_reason: self.end_reason,
            process_id: self.process_id,
            elapsed: self.elapsed,
            experience: self.experience,
        }
    }

    /// Give the task up to `budget` millisols. Returns the time it did not use.
    ///
    /// Guards run first: a worker who is incapacitated or no longer inside
    /// the settlement, or a malfunctioning target building, ends the task and
    /// refunds [`INTERRUPTION_REFUND`] of the budget. A phase the descriptor
    /// never declared is a fatal [`OutpostError::InvalidPhase`].
    pub fn offer_time(
        &mut self,
        worker: &mut Worker,
        settlement: &Settlement,
        accidents: &mut dyn AccidentModel,
        budget: f64,
    ) -> Result<f64> {
        if self.is_done() {
            return Ok(budget.max(0.0));
        }
        if budget <= 0.0 {
            return Ok(0.0);
        }
        if let Some(reason) = self.guard(worker, settlement) {
            tracing::warn!(
                worker = %worker.name,
                meta_task = %self.meta.name,
                %reason,
                "task interrupted"
            );
            let refund = budget * INTERRUPTION_REFUND;
            self.elapsed += budget - refund;
            self.end(reason, settlement);
            self.announce_end(settlement);
            return Ok(refund);
        }

        let mut time_left = budget;
        while time_left > 0.0 {
            let Some(phase) = self.phase else {
                break;
            };
            if !self.meta.profile.declares(phase) {
                return Err(self.invalid_phase(phase));
            }
            time_left = match phase {
                TaskPhase::Approach => self.approach_phase(time_left, worker, settlement)?,
                TaskPhase::Manufacture => self.process_phase(
                    phase,
                    ProcessKind::Manufacture,
                    time_left,
                    worker,
                    settlement,
                    accidents,
                )?,
                TaskPhase::ProduceFood => self.process_phase(
                    phase,
                    ProcessKind::FoodProduction,
                    time_left,
                    worker,
                    settlement,
                    accidents,
                )?,
                TaskPhase::Treat => self.treat_phase(time_left, worker, settlement, accidents)?,
            };
            if time_left < TIME_EPSILON {
                time_left = 0.0;
            }
        }
        self.elapsed += budget - time_left;
        if self.is_done() {
            self.announce_end(settlement);
        }
        Ok(time_left)
    }

    /// Stop the task at the request of the scheduler. The live process, if
    /// any, is left as it is for other workers to resume.
    pub fn cancel(&mut self, settlement: &Settlement) {
        if !self.is_done() {
            self.end(EndReason::Cancelled, settlement);
            self.announce_end(settlement);
        }
    }

    fn guard(&self, worker: &Worker, settlement: &Settlement) -> Option<EndReason> {
        if worker.performance_rating() <= 0.0 {
            return Some(EndReason::Incapacitated);
        }
        if worker.location.situation == LocationSituation::OutsideUnprotected
            || !worker.is_present_at(settlement.id())
        {
            return Some(EndReason::InvalidLocation);
        }
        match settlement.building(self.building_id) {
            Err(_) => Some(EndReason::InvalidLocation),
            Ok(building) if self.facet_malfunctioning(building) => Some(EndReason::Malfunction),
            Ok(_) => None,
        }
    }

    /// Only the function this task works with counts: a broken sick bay
    /// does not stop manufacturing in the same building.
    fn facet_malfunctioning(&self, building: &Building) -> bool {
        if self.meta.profile.process_kind.is_some() {
            building.workshop().is_some_and(|w| w.has_malfunction())
        } else if self.meta.profile.declares(TaskPhase::Treat) {
            building.sick_bay().is_some_and(|b| b.has_malfunction())
        } else {
            building.has_malfunction()
        }
    }

    fn invalid_phase(&self, phase: TaskPhase) -> OutpostError {
        tracing::error!(meta_task = %self.meta.name, %phase, "task in undeclared phase");
        OutpostError::InvalidPhase {
            task: self.meta.name.clone(),
            phase: phase.to_string(),
        }
    }

    fn advance(&mut self, settlement: &Settlement) {
        match self.phase.and_then(|p| self.meta.profile.next_phase(p)) {
            Some(next) => self.phase = Some(next),
            None => self.end(EndReason::Completed, settlement),
        }
    }

    fn end(&mut self, reason: EndReason, settlement: &Settlement) {
        if self.entered {
            if let Ok(building) = settlement.building(self.building_id) {
                building.leave();
            }
            self.entered = false;
        }
        self.phase = None;
        self.process_id = None;
        self.end_reason = Some(reason);
    }

    /// Publish the end of the task once its elapsed time is settled.
    fn announce_end(&self, settlement: &Settlement) {
        let Some(reason) = self.end_reason else {
            return;
        };
        tracing::info!(
            task = %self.id,
            meta_task = %self.meta.name,
            %reason,
            elapsed = self.elapsed,
            "task ended"
        );
        settlement.events().publish(OutpostEvent::TaskEnded {
            task_id: self.id,
            worker_id: self.worker_id,
            meta_task: self.meta.name.clone(),
            reason: reason.to_string(),
            elapsed: self.elapsed,
        });
    }

    fn target<'a>(&self, settlement: &'a Settlement) -> Result<&'a Building> {
        settlement.building(self.building_id)
    }

    /// Walk to the target building and take a place in it.
    fn approach_phase(
        &mut self,
        time: f64,
        worker: &mut Worker,
        settlement: &Settlement,
    ) -> Result<f64> {
        if worker.location.building_id == Some(self.building_id) {
            self.approach_remaining = 0.0;
        }
        let used = time.min(self.approach_remaining);
        self.approach_remaining -= used;
        if self.approach_remaining > 0.0 {
            return Ok(time - used);
        }

        let building = self.target(settlement)?;
        if !building.enter() {
            tracing::debug!(worker = %worker.name, building = %building.name(), "building full");
            self.end(EndReason::InvalidLocation, settlement);
            return Ok(time - used);
        }
        self.entered = true;
        worker.location.building_id = Some(self.building_id);
        self.advance(settlement);
        Ok(time - used)
    }

    /// Feed labor into live processes of `kind`, joining running work or
    /// claiming new specs until the budget is spent or nothing is left.
    fn process_phase(
        &mut self,
        phase: TaskPhase,
        kind: ProcessKind,
        time: f64,
        worker: &mut Worker,
        settlement: &Settlement,
        accidents: &mut dyn AccidentModel,
    ) -> Result<f64> {
        if self.meta.profile.process_kind != Some(kind) {
            return Err(self.invalid_phase(phase));
        }
        let building = self.target(settlement)?;
        let Some(workshop) = building.workshop().filter(|w| w.kind() == kind).cloned() else {
            self.end(EndReason::InvalidLocation, settlement);
            return Ok(time);
        };
        let queue = settlement.queue(kind)?;
        let skill = worker.effective_skill(self.meta.skill);
        let work_time = effective_work_time(worker, skill, time);
        let mut work_left = work_time;
        let mut exhausted = false;

        while work_left > 0.0 {
            let current = self
                .process_id
                .filter(|pid| workshop.processes_needing_work().iter().any(|p| p.id == *pid));
            let process_id = current
                .or_else(|| workshop.find_workable(skill))
                .or_else(|| {
                    if settlement.has_process_override(kind) {
                        None
                    } else {
                        queue.claim_and_start(&workshop, skill, Some(worker.id))
                    }
                });
            let Some(process_id) = process_id else {
                exhausted = true;
                break;
            };
            self.process_id = Some(process_id);

            let report = match workshop.add_work_time(process_id, work_left, skill) {
                Ok(report) => report,
                Err(OutpostError::ProcessNotFound(_)) => {
                    self.process_id = None;
                    continue;
                }
                Err(e) => return Err(e),
            };
            if report.consumed <= 0.0 {
                if report.work_time_remaining <= 0.0 {
                    // Claimed spec needed no labor; it cooks on its own.
                    self.process_id = None;
                    continue;
                }
                exhausted = true;
                break;
            }
            work_left -= report.consumed;
            self.work_done += report.consumed;
            if report.completed || report.work_time_remaining <= 0.0 {
                self.process_id = None;
            }
        }

        let used = if work_time > 0.0 {
            time * (work_time - work_left.max(0.0)) / work_time
        } else {
            time
        };
        self.productive_effects(used, skill, worker, settlement, &*workshop, accidents);

        if exhausted {
            let reason = if self.work_done > 0.0 {
                EndReason::Completed
            } else {
                EndReason::NoWorkAvailable
            };
            self.end(reason, settlement);
            return Ok(time - used);
        }
        Ok(0.0)
    }

    /// Treat patients in the target sick bay.
    fn treat_phase(
        &mut self,
        time: f64,
        worker: &mut Worker,
        settlement: &Settlement,
        accidents: &mut dyn AccidentModel,
    ) -> Result<f64> {
        let building = self.target(settlement)?;
        let Some(sick_bay) = building.sick_bay().cloned() else {
            self.end(EndReason::InvalidLocation, settlement);
            return Ok(time);
        };
        let skill = worker.effective_skill(self.meta.skill);
        let work_time = effective_work_time(worker, skill, time);
        let mut work_left = work_time;
        let mut exhausted = false;

        while work_left > 0.0 {
            let used = sick_bay.treat(work_left, skill);
            if used <= 0.0 {
                exhausted = true;
                break;
            }
            work_left -= used;
            self.work_done += used;
        }

        let used = if work_time > 0.0 {
            time * (work_time - work_left.max(0.0)) / work_time
        } else {
            time
        };
        self.productive_effects(used, skill, worker, settlement, &*sick_bay, accidents);

        if exhausted {
            let reason = if self.work_done > 0.0 {
                EndReason::Completed
            } else {
                EndReason::NoWorkAvailable
            };
            self.end(reason, settlement);
            return Ok(time - used);
        }
        Ok(0.0)
    }

    /// Experience, stress and the accident check for one productive phase
    /// invocation.
    fn productive_effects(
        &mut self,
        used: f64,
        skill: u32,
        worker: &mut Worker,
        settlement: &Settlement,
        resource: &dyn Malfunctionable,
        accidents: &mut dyn AccidentModel,
    ) {
        self.experience += apply_work_effects(
            worker,
            self.meta.skill,
            used,
            self.meta.profile.stress_modifier,
        );
        if accidents.check_for_accident(resource, used, self.meta.profile.accident_rate, skill) {
            settlement.events().publish(OutpostEvent::Accident {
                resource_id: resource.resource_id(),
                resource_name: resource.resource_name().to_string(),
                worker_id: worker.id,
            });
        }
    }
}
