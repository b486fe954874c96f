use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outpost_process::{ProcessQueue, Workshop};
use outpost_types::{EventBus, OutpostError, ProcessKind, ProcessSpec, Result};

use crate::building::Building;
use crate::demand::{DemandModel, FixedDemand};
use crate::sick_bay::SickBay;

/// Read-only listing of one queue for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSummary {
    pub kind: ProcessKind,
    pub overridden: bool,
    pub specs: Vec<ProcessSpec>,
}

/// A settlement: its buildings, one process queue per kind and the
/// external demand model.
///
/// Buildings are fixed once the settlement is shared; everything mutable
/// during a pulse lives behind the queue and workshop locks.
#[derive(Debug)]
pub struct Settlement {
    id: Uuid,
    name: String,
    buildings: BTreeMap<Uuid, Building>,
    queues: BTreeMap<ProcessKind, ProcessQueue>,
    overrides: RwLock<BTreeSet<ProcessKind>>,
    demand: Arc<dyn DemandModel>,
    events: EventBus,
}

impl Settlement {
    pub fn new(name: impl Into<String>, events: EventBus) -> Self {
        let queues = [ProcessKind::Manufacture, ProcessKind::FoodProduction]
            .into_iter()
            .map(|kind| (kind, ProcessQueue::new(kind, events.clone())))
            .collect();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            buildings: BTreeMap::new(),
            queues,
            overrides: RwLock::new(BTreeSet::new()),
            demand: Arc::new(FixedDemand::new()),
            events,
        }
    }

    pub fn with_demand(mut self, demand: Arc<dyn DemandModel>) -> Self {
        self.demand = demand;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn add_building(&mut self, building: Building) -> Uuid {
        let id = building.id();
        tracing::debug!(building = %building.name(), settlement = %self.name, "building added");
        self.buildings.insert(id, building);
        id
    }

    pub fn building(&self, id: Uuid) -> Result<&Building> {
        self.buildings.get(&id).ok_or(OutpostError::BuildingNotFound(id))
    }

    /// Buildings in id order.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    /// Workshops of one kind, in building id order.
    pub fn workshops(&self, kind: ProcessKind) -> impl Iterator<Item = &Arc<Workshop>> {
        self.buildings
            .values()
            .filter_map(|b| b.workshop())
            .filter(move |w| w.kind() == kind)
    }

    pub fn sick_bays(&self) -> impl Iterator<Item = &Arc<SickBay>> {
        self.buildings.values().filter_map(|b| b.sick_bay())
    }

    pub fn queue(&self, kind: ProcessKind) -> Result<&ProcessQueue> {
        self.queues.get(&kind).ok_or(OutpostError::NoQueue(kind))
    }

    /// Add new work to the queue of the spec's kind.
    pub fn enqueue(&self, spec: ProcessSpec) -> Result<()> {
        self.queue(spec.kind)?.enqueue(spec)
    }

    /// Forbid (or allow again) starting new processes of a kind. Live
    /// processes keep running either way.
    pub fn set_process_override(&self, kind: ProcessKind, active: bool) {
        let mut overrides = self.overrides.write().unwrap_or_else(PoisonError::into_inner);
        if active {
            overrides.insert(kind);
        } else {
            overrides.remove(&kind);
        }
    }

    pub fn has_process_override(&self, kind: ProcessKind) -> bool {
        self.overrides
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&kind)
    }

    pub fn commerce_factor(&self, kind: ProcessKind) -> f64 {
        self.demand.commerce_factor(kind)
    }

    /// Advance process time in every workshop. Returns the ids of processes
    /// that finished.
    pub fn time_passing(&self, elapsed: f64) -> Vec<Uuid> {
        self.buildings
            .values()
            .filter_map(|b| b.workshop())
            .flat_map(|w| w.time_passing(elapsed))
            .collect()
    }

    pub fn queue_summaries(&self) -> Vec<QueueSummary> {
        self.queues
            .iter()
            .map(|(kind, queue)| QueueSummary {
                kind: *kind,
                overridden: self.has_process_override(*kind),
                specs: queue.snapshot(),
            })
            .collect()
    }
}
