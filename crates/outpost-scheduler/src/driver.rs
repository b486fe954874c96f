use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

use outpost_execution::{AccidentModel, RandomAccidents, Task, TaskSummary};
use outpost_meta::{MetaTaskRegistry, ScoringContext};
use outpost_process::LiveProcess;
use outpost_settlement::Settlement;
use outpost_types::{Malfunctionable, OutpostError, OutpostEvent, Result, Worker};

use crate::assignment::{Assignment, select_candidate};
use crate::config::OutpostConfig;
use crate::snapshot::{SettlementSnapshot, WorkerStatus};

/// What happened during one pulse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PulseReport {
    pub pulse: u64,
    pub candidates: usize,
    pub assigned: Vec<Assignment>,
    pub finished: Vec<TaskSummary>,
    pub processes_finished: usize,
    pub repaired: usize,
}

/// Which function of a building a malfunction is tracked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Facility {
    Workshop,
    SickBay,
}

/// Drives one settlement: assigns idle workers and advances running tasks.
pub struct Simulation {
    settlement: Arc<Settlement>,
    registry: MetaTaskRegistry,
    workers: BTreeMap<Uuid, Worker>,
    tasks: BTreeMap<Uuid, Task>,
    accidents: Box<dyn AccidentModel>,
    scoring: ScoringContext,
    pulse: u64,
    clock: f64,
    repair_after: u64,
    broken_since: BTreeMap<(Uuid, Facility), u64>,
}

impl Simulation {
    pub fn new(settlement: Arc<Settlement>, registry: MetaTaskRegistry) -> Self {
        Self {
            settlement,
            registry,
            workers: BTreeMap::new(),
            tasks: BTreeMap::new(),
            accidents: Box::new(RandomAccidents::default()),
            scoring: ScoringContext::default(),
            pulse: 0,
            clock: 0.0,
            repair_after: 0,
            broken_since: BTreeMap::new(),
        }
    }

    /// Simulation seeded and tuned from configuration.
    pub fn from_config(
        settlement: Arc<Settlement>,
        registry: MetaTaskRegistry,
        config: &OutpostConfig,
    ) -> Self {
        Self::new(settlement, registry)
            .with_accidents(Box::new(RandomAccidents::new(config.accident_seed)))
            .with_scoring(ScoringContext::new(config.min_performance))
            .with_auto_repair(config.repair_after_pulses)
    }

    pub fn with_accidents(mut self, accidents: Box<dyn AccidentModel>) -> Self {
        self.accidents = accidents;
        self
    }

    pub fn with_scoring(mut self, scoring: ScoringContext) -> Self {
        self.scoring = scoring;
        self
    }

    /// Repair malfunctioning workshops and sick bays once they have been
    /// down for `pulses` pulses. 0 leaves them broken.
    pub fn with_auto_repair(mut self, pulses: u64) -> Self {
        self.repair_after = pulses;
        self
    }

    pub fn add_worker(&mut self, worker: Worker) -> Uuid {
        let id = worker.id;
        self.workers.insert(id, worker);
        id
    }

    pub fn settlement(&self) -> &Arc<Settlement> {
        &self.settlement
    }

    pub fn registry(&self) -> &MetaTaskRegistry {
        &self.registry
    }

    pub fn worker(&self, id: Uuid) -> Result<&Worker> {
        self.workers.get(&id).ok_or(OutpostError::WorkerNotFound(id))
    }

    pub fn worker_mut(&mut self, id: Uuid) -> Result<&mut Worker> {
        self.workers.get_mut(&id).ok_or(OutpostError::WorkerNotFound(id))
    }

    /// Workers in id order.
    pub fn workers(&self) -> impl Iterator<Item = &Worker> {
        self.workers.values()
    }

    pub fn task_of(&self, worker_id: Uuid) -> Option<&Task> {
        self.tasks.get(&worker_id)
    }

    pub fn pulse_count(&self) -> u64 {
        self.pulse
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// End a worker's task early. Its live process stays available to others.
    pub fn cancel_task(&mut self, worker_id: Uuid) -> Option<TaskSummary> {
        let mut task = self.tasks.remove(&worker_id)?;
        task.cancel(&self.settlement);
        Some(task.summary())
    }

    /// End a live process early. Its progress is lost and its spec is not
    /// requeued; tasks that were feeding it look for other work.
    pub fn abandon_process(&mut self, building_id: Uuid, process_id: Uuid) -> Result<LiveProcess> {
        let building = self.settlement.building(building_id)?;
        let workshop = building
            .workshop()
            .ok_or(OutpostError::ProcessNotFound(process_id))?;
        workshop.abandon(process_id)
    }

    /// Run one pulse of `budget` millisols.
    ///
    /// Overdue repairs happen first, then workshops advance, then every descriptor generates its
    /// candidates, then idle workers (in id order) take their best candidate,
    /// and finally every busy worker's task gets the budget. Fails only on a
    /// fatal task error.
    pub fn pulse(&mut self, budget: f64) -> Result<PulseReport> {
        self.pulse += 1;
        let mut report = PulseReport {
            pulse: self.pulse,
            ..Default::default()
        };

        report.repaired = self.run_repairs();
        report.processes_finished = self.settlement.time_passing(budget).len();

        let mut candidates = self.registry.generate_all(&self.settlement);
        report.candidates = candidates.len();

        for worker in self.workers.values() {
            if self.tasks.contains_key(&worker.id) {
                continue;
            }
            let Some((idx, score)) = select_candidate(
                &self.registry,
                &candidates,
                worker,
                &self.settlement,
                &self.scoring,
            ) else {
                continue;
            };
            let candidate = &mut candidates[idx];
            candidate.consume_demand();
            let task = Task::new(worker.id, candidate);
            let assignment = Assignment {
                worker_id: worker.id,
                task_id: task.id(),
                meta_task: candidate.meta.name.clone(),
                building_id: candidate.building_id,
                score: score.score(),
            };
            tracing::info!(
                worker = %worker.name,
                task = %candidate.description,
                %score,
                "task assigned"
            );
            self.settlement.events().publish(OutpostEvent::TaskAssigned {
                task_id: assignment.task_id,
                worker_id: assignment.worker_id,
                meta_task: assignment.meta_task.clone(),
                building_id: assignment.building_id,
                score: assignment.score,
            });
            self.tasks.insert(worker.id, task);
            report.assigned.push(assignment);
        }

        for (worker_id, task) in self.tasks.iter_mut() {
            let Some(worker) = self.workers.get_mut(worker_id) else {
                continue;
            };
            task.offer_time(worker, &self.settlement, self.accidents.as_mut(), budget)?;
        }

        let finished: Vec<Uuid> = self
            .tasks
            .iter()
            .filter(|(_, t)| t.is_done())
            .map(|(id, _)| *id)
            .collect();
        for worker_id in finished {
            if let Some(task) = self.tasks.remove(&worker_id) {
                report.finished.push(task.summary());
            }
        }

        self.clock += budget;
        tracing::debug!(
            pulse = self.pulse,
            assigned = report.assigned.len(),
            finished = report.finished.len(),
            "pulse complete"
        );
        Ok(report)
    }

    fn run_repairs(&mut self) -> usize {
        if self.repair_after == 0 {
            return 0;
        }
        let settlement = Arc::clone(&self.settlement);
        let mut repaired = 0;
        for building in settlement.buildings() {
            if let Some(workshop) = building.workshop() {
                let key = (building.id(), Facility::Workshop);
                if self.repair_due(key, workshop.has_malfunction()) {
                    workshop.repair();
                    repaired += 1;
                }
            }
            if let Some(sick_bay) = building.sick_bay() {
                let key = (building.id(), Facility::SickBay);
                if self.repair_due(key, sick_bay.has_malfunction()) {
                    tracing::info!(sick_bay = %sick_bay.resource_name(), "sick bay repaired");
                    sick_bay.set_malfunction(false);
                    repaired += 1;
                }
            }
        }
        repaired
    }

    /// Track how long a facility has been broken and say whether it is
    /// time to fix it.
    fn repair_due(&mut self, key: (Uuid, Facility), broken: bool) -> bool {
        if !broken {
            self.broken_since.remove(&key);
            return false;
        }
        let since = *self.broken_since.entry(key).or_insert(self.pulse);
        if self.pulse - since < self.repair_after {
            return false;
        }
        self.broken_since.remove(&key);
        true
    }

    pub fn snapshot(&self) -> SettlementSnapshot {
        SettlementSnapshot {
            settlement_id: self.settlement.id(),
            name: self.settlement.name().to_string(),
            pulse: self.pulse,
            clock: self.clock,
            queues: self.settlement.queue_summaries(),
            processes: self
                .settlement
                .buildings()
                .filter_map(|b| b.workshop())
                .flat_map(|w| w.processes())
                .collect(),
            buildings: self.settlement.buildings().map(|b| b.summary()).collect(),
            workers: self
                .workers
                .values()
                .map(|w| WorkerStatus::new(w, self.tasks.get(&w.id).map(Task::summary)))
                .collect(),
        }
    }
}

/// Runs pulses on a wall-clock interval and publishes snapshots until shut down.
pub struct SimulationLoop {
    simulation: Simulation,
    budget: f64,
    interval: Duration,
    snapshot_tx: watch::Sender<SettlementSnapshot>,
    shutdown_rx: watch::Receiver<bool>,
}

impl SimulationLoop {
    pub fn new(
        simulation: Simulation,
        config: &OutpostConfig,
        snapshot_tx: watch::Sender<SettlementSnapshot>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            simulation,
            budget: config.pulse_millisols,
            interval: config.pulse_interval(),
            snapshot_tx,
            shutdown_rx,
        }
    }

    /// Run the loop. Returns the simulation on shutdown, or the fatal error
    /// that stopped it.
    pub async fn run(mut self) -> Result<Simulation> {
        let mut ticker = tokio::time::interval(self.interval);
        let _ = self.snapshot_tx.send(self.simulation.snapshot());

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.simulation.pulse(self.budget) {
                        tracing::error!(error = %e, "simulation stopped");
                        return Err(e);
                    }
                    let _ = self.snapshot_tx.send(self.simulation.snapshot());
                }
                Ok(()) = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        tracing::info!("Simulation loop shutting down");
                        break;
                    }
                }
            }
        }
        Ok(self.simulation)
    }
}
