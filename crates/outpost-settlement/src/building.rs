use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outpost_process::Workshop;
use outpost_types::{EventBus, Malfunctionable, ProcessKind, ToolSet};

use crate::sick_bay::SickBay;

/// Serializable view of a building for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSummary {
    pub id: Uuid,
    pub name: String,
    pub occupants: u32,
    pub max_occupancy: u32,
    pub workshop: Option<ProcessKind>,
    pub sick_bay: bool,
    pub malfunction: bool,
}

/// A settlement building hosting at most one workshop and one sick bay.
#[derive(Debug)]
pub struct Building {
    id: Uuid,
    name: String,
    max_occupancy: u32,
    occupants: AtomicU32,
    workshop: Option<Arc<Workshop>>,
    sick_bay: Option<Arc<SickBay>>,
}

impl Building {
    pub fn new(name: impl Into<String>, max_occupancy: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            max_occupancy,
            occupants: AtomicU32::new(0),
            workshop: None,
            sick_bay: None,
        }
    }

    pub fn with_workshop(
        mut self,
        kind: ProcessKind,
        tech_level: u32,
        tools: ToolSet,
        max_processes: usize,
        events: &EventBus,
    ) -> Self {
        let workshop = Workshop::new(
            self.id,
            self.name.clone(),
            kind,
            tech_level,
            tools,
            max_processes,
            events.clone(),
        );
        self.workshop = Some(Arc::new(workshop));
        self
    }

    pub fn with_sick_bay(mut self, beds: usize) -> Self {
        self.sick_bay = Some(Arc::new(SickBay::new(self.id, self.name.clone(), beds)));
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn workshop(&self) -> Option<&Arc<Workshop>> {
        self.workshop.as_ref()
    }

    pub fn sick_bay(&self) -> Option<&Arc<SickBay>> {
        self.sick_bay.as_ref()
    }

    pub fn max_occupancy(&self) -> u32 {
        self.max_occupancy
    }

    pub fn occupants(&self) -> u32 {
        self.occupants.load(Ordering::Acquire)
    }

    pub fn is_crowded(&self) -> bool {
        self.occupants() >= self.max_occupancy
    }

    /// Register a worker entering. Entry is refused once the building is full.
    pub fn enter(&self) -> bool {
        self.occupants
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_occupancy).then_some(n + 1)
            })
            .is_ok()
    }

    pub fn leave(&self) {
        let _ = self
            .occupants
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    /// Whether any function in the building is malfunctioning.
    pub fn has_malfunction(&self) -> bool {
        self.workshop.as_ref().is_some_and(|w| w.has_malfunction())
            || self.sick_bay.as_ref().is_some_and(|s| s.has_malfunction())
    }

    pub fn summary(&self) -> BuildingSummary {
        BuildingSummary {
            id: self.id,
            name: self.name.clone(),
            occupants: self.occupants(),
            max_occupancy: self.max_occupancy,
            workshop: self.workshop.as_ref().map(|w| w.kind()),
            sick_bay: self.sick_bay.is_some(),
            malfunction: self.has_malfunction(),
        }
    }
}
