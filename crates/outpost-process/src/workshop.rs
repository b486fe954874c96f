use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outpost_types::{
    EventBus, MalfunctionFlag, Malfunctionable, OutpostError, OutpostEvent, ProcessKind, Result,
    ToolSet,
};

use crate::live::LiveProcess;
use crate::queue::ClaimedSpec;

/// Outcome of one labor contribution to a live process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkReport {
    pub consumed: f64,
    pub work_time_remaining: f64,
    /// The process finished and its slot was released.
    pub completed: bool,
}

#[derive(Debug)]
struct WorkshopState {
    slots_installed: usize,
    processes: Vec<LiveProcess>,
}

/// A building function that runs processes of one kind in a bounded number
/// of slots.
///
/// Slot accounting and live-process counters only change through
/// [`Workshop::start_process`], [`Workshop::add_work_time`],
/// [`Workshop::time_passing`] and [`Workshop::abandon`].
#[derive(Debug)]
pub struct Workshop {
    building_id: Uuid,
    name: String,
    kind: ProcessKind,
    tech_level: u32,
    tools: ToolSet,
    max_processes: usize,
    malfunction: MalfunctionFlag,
    state: Mutex<WorkshopState>,
    events: EventBus,
}

impl Workshop {
    pub fn new(
        building_id: Uuid,
        name: impl Into<String>,
        kind: ProcessKind,
        tech_level: u32,
        tools: ToolSet,
        max_processes: usize,
        events: EventBus,
    ) -> Self {
        Self {
            building_id,
            name: name.into(),
            kind,
            tech_level,
            tools,
            max_processes,
            malfunction: MalfunctionFlag::default(),
            state: Mutex::new(WorkshopState {
                slots_installed: max_processes,
                processes: Vec::new(),
            }),
            events,
        }
    }

    /// Start with only `installed` usable slots out of the maximum.
    pub fn with_slots_installed(self, installed: usize) -> Self {
        self.lock().slots_installed = installed.min(self.max_processes);
        self
    }

    pub fn with_wear(mut self, wear_modifier: f64) -> Self {
        self.malfunction = MalfunctionFlag::new(wear_modifier);
        self
    }

    fn lock(&self) -> MutexGuard<'_, WorkshopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn building_id(&self) -> Uuid {
        self.building_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ProcessKind {
        self.kind
    }

    pub fn tech_level(&self) -> u32 {
        self.tech_level
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    pub fn max_processes(&self) -> usize {
        self.max_processes
    }

    pub fn slots_installed(&self) -> usize {
        self.lock().slots_installed
    }

    /// Make more slots usable, up to the workshop maximum. Returns the new total.
    pub fn install_slots(&self, count: usize) -> usize {
        let mut state = self.lock();
        state.slots_installed = (state.slots_installed + count).min(self.max_processes);
        state.slots_installed
    }

    pub fn free_slots(&self) -> usize {
        let state = self.lock();
        state.slots_installed.saturating_sub(state.processes.len())
    }

    pub fn live_count(&self) -> usize {
        self.lock().processes.len()
    }

    pub fn processes(&self) -> Vec<LiveProcess> {
        self.lock().processes.clone()
    }

    pub fn processes_needing_work(&self) -> Vec<LiveProcess> {
        self.lock()
            .processes
            .iter()
            .filter(|p| p.needs_work())
            .cloned()
            .collect()
    }

    /// Register a claimed spec as a live process in a free slot.
    ///
    /// Hands the claim back unchanged when no slot is free, so the caller
    /// can return it to its queue.
    pub fn start_process(&self, claimed: ClaimedSpec) -> std::result::Result<Uuid, ClaimedSpec> {
        let process = {
            let mut state = self.lock();
            if state.processes.len() >= state.slots_installed {
                return Err(claimed);
            }
            let process = LiveProcess::new(claimed.into_spec(), self.building_id);
            state.processes.push(process.clone());
            process
        };
        tracing::info!(
            process = %process.spec.name,
            workshop = %self.name,
            "process started"
        );
        self.events.publish(OutpostEvent::ProcessStarted {
            process_id: process.id,
            spec_id: process.spec.id,
            name: process.spec.name.clone(),
            building_id: self.building_id,
        });
        Ok(process.id)
    }

    /// First live process still needing labor that a worker with `skill` may join.
    pub fn find_workable(&self, skill: u32) -> Option<Uuid> {
        self.lock()
            .processes
            .iter()
            .find(|p| p.needs_work() && p.spec.skill_required <= skill)
            .map(|p| p.id)
    }

    /// Contribute labor to a live process. Nothing is consumed while the
    /// workshop is malfunctioning.
    pub fn add_work_time(&self, process_id: Uuid, amount: f64, skill: u32) -> Result<WorkReport> {
        let malfunctioning = self.malfunction.is_active();
        let (report, ended) = {
            let mut state = self.lock();
            let pos = state
                .processes
                .iter()
                .position(|p| p.id == process_id)
                .ok_or(OutpostError::ProcessNotFound(process_id))?;
            let process = &mut state.processes[pos];
            let consumed = if malfunctioning {
                0.0
            } else {
                process.add_work_time(amount, skill)
            };
            let work_time_remaining = process.work_time_remaining();
            let completed = process.is_complete();
            let ended = completed.then(|| state.processes.remove(pos));
            (
                WorkReport {
                    consumed,
                    work_time_remaining,
                    completed,
                },
                ended,
            )
        };
        if let Some(process) = ended {
            self.publish_end(&process, false);
        }
        Ok(report)
    }

    /// Advance elapsed process time. Completed processes end and free their
    /// slots; returns their ids. Paused while malfunctioning.
    pub fn time_passing(&self, elapsed: f64) -> Vec<Uuid> {
        if self.malfunction.is_active() {
            return Vec::new();
        }
        let finished: Vec<LiveProcess> = {
            let mut state = self.lock();
            for process in state.processes.iter_mut() {
                process.add_process_time(elapsed);
            }
            let (done, running): (Vec<_>, Vec<_>) =
                state.processes.drain(..).partition(|p| p.is_complete());
            state.processes = running;
            done
        };
        for process in &finished {
            self.publish_end(process, false);
        }
        finished.into_iter().map(|p| p.id).collect()
    }

    /// End a live process early. Progress is lost and the spec is not requeued.
    pub fn abandon(&self, process_id: Uuid) -> Result<LiveProcess> {
        let process = {
            let mut state = self.lock();
            let pos = state
                .processes
                .iter()
                .position(|p| p.id == process_id)
                .ok_or(OutpostError::ProcessNotFound(process_id))?;
            state.processes.remove(pos)
        };
        self.publish_end(&process, true);
        Ok(process)
    }

    pub fn set_malfunction(&self, active: bool) {
        if active {
            tracing::warn!(workshop = %self.name, "workshop malfunctioning, live processes paused");
        }
        self.malfunction.set(active);
    }

    pub fn repair(&self) {
        tracing::info!(workshop = %self.name, "workshop repaired");
        self.malfunction.set(false);
    }

    pub fn accidents(&self) -> u32 {
        self.malfunction.accidents()
    }

    fn publish_end(&self, process: &LiveProcess, premature: bool) {
        if premature {
            tracing::warn!(process = %process.spec.name, workshop = %self.name, "process abandoned");
        } else {
            tracing::info!(
                process = %process.spec.name,
                workshop = %self.name,
                best_skill = process.best_skill(),
                "process finished"
            );
        }
        self.events.publish(OutpostEvent::ProcessEnded {
            process_id: process.id,
            name: process.spec.name.clone(),
            building_id: self.building_id,
            premature,
        });
    }
}

impl Malfunctionable for Workshop {
    fn resource_id(&self) -> Uuid {
        self.building_id
    }

    fn resource_name(&self) -> &str {
        &self.name
    }

    fn has_malfunction(&self) -> bool {
        self.malfunction.is_active()
    }

    fn accident_modifier(&self) -> f64 {
        self.malfunction.wear_modifier()
    }

    fn record_accident(&self) {
        tracing::warn!(workshop = %self.name, "accident in workshop");
        self.malfunction.record_accident();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::ProcessQueue;
    use outpost_types::ProcessSpec;

    fn setup(slots: usize) -> (ProcessQueue, Workshop, EventBus) {
        let events = EventBus::default();
        let queue = ProcessQueue::new(ProcessKind::Manufacture, events.clone());
        let workshop = Workshop::new(
            Uuid::new_v4(),
            "workshop",
            ProcessKind::Manufacture,
            3,
            ToolSet::all(),
            slots,
            events.clone(),
        );
        (queue, workshop, events)
    }

    fn start(queue: &ProcessQueue, workshop: &Workshop, work: f64, cook: f64) -> Uuid {
        queue
            .enqueue(
                ProcessSpec::new("glass pane", ProcessKind::Manufacture)
                    .with_requirements(1, 1)
                    .with_times(work, cook),
            )
            .unwrap();
        queue.claim_and_start(workshop, 5, None).unwrap()
    }

    #[test]
    fn test_completion_frees_slot_and_notifies() {
        let (queue, workshop, events) = setup(1);
        let mut rx = events.subscribe();
        let pid = start(&queue, &workshop, 40.0, 0.0);
        assert_eq!(workshop.free_slots(), 0);

        let first = workshop.add_work_time(pid, 25.0, 5).unwrap();
        assert_eq!(first.consumed, 25.0);
        assert_eq!(first.work_time_remaining, 15.0);
        assert!(!first.completed);

        let second = workshop.add_work_time(pid, 25.0, 5).unwrap();
        assert_eq!(second.consumed, 15.0);
        assert_eq!(second.work_time_remaining, 0.0);
        assert!(second.completed);
        assert_eq!(workshop.free_slots(), 1);

        let ended = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|e| matches!(e, OutpostEvent::ProcessEnded { .. }));
        assert!(matches!(
            ended,
            Some(OutpostEvent::ProcessEnded { premature: false, .. })
        ));
    }

    #[test]
    fn test_process_time_completes_via_time_passing() {
        let (queue, workshop, _) = setup(2);
        let pid = start(&queue, &workshop, 10.0, 50.0);
        let report = workshop.add_work_time(pid, 10.0, 5).unwrap();
        assert!(!report.completed);
        assert_eq!(workshop.live_count(), 1);

        assert!(workshop.time_passing(30.0).is_empty());
        assert_eq!(workshop.time_passing(30.0), vec![pid]);
        assert_eq!(workshop.live_count(), 0);
    }

    #[test]
    fn test_malfunction_pauses_but_keeps_progress() {
        let (queue, workshop, _) = setup(1);
        let pid = start(&queue, &workshop, 40.0, 20.0);
        workshop.add_work_time(pid, 10.0, 5).unwrap();

        workshop.set_malfunction(true);
        let report = workshop.add_work_time(pid, 10.0, 5).unwrap();
        assert_eq!(report.consumed, 0.0);
        assert_eq!(report.work_time_remaining, 30.0);
        assert!(workshop.time_passing(100.0).is_empty());
        assert_eq!(workshop.processes()[0].process_time_remaining(), 20.0);

        workshop.repair();
        assert_eq!(workshop.add_work_time(pid, 10.0, 5).unwrap().consumed, 10.0);
    }

    #[test]
    fn test_abandon_does_not_requeue() {
        let (queue, workshop, _) = setup(1);
        let pid = start(&queue, &workshop, 40.0, 0.0);
        let abandoned = workshop.abandon(pid).unwrap();
        assert_eq!(abandoned.id, pid);
        assert!(queue.is_empty());
        assert_eq!(workshop.free_slots(), 1);
        assert!(matches!(
            workshop.add_work_time(pid, 1.0, 5),
            Err(OutpostError::ProcessNotFound(_))
        ));
    }

    #[test]
    fn test_installed_slots_bound_capacity() {
        let (queue, workshop, _) = setup(3);
        let workshop = workshop.with_slots_installed(1);
        start(&queue, &workshop, 10.0, 0.0);
        assert_eq!(workshop.free_slots(), 0);
        assert_eq!(workshop.install_slots(5), 3);
        assert_eq!(workshop.free_slots(), 2);
    }

    #[test]
    fn test_find_workable_respects_skill() {
        let (queue, workshop, _) = setup(2);
        let pid = start(&queue, &workshop, 10.0, 0.0);
        assert_eq!(workshop.find_workable(0), None);
        assert_eq!(workshop.find_workable(1), Some(pid));
    }

    #[test]
    fn test_accident_marks_malfunction() {
        let (_, workshop, _) = setup(1);
        workshop.record_accident();
        assert!(workshop.has_malfunction());
        assert_eq!(workshop.accidents(), 1);
    }
}
