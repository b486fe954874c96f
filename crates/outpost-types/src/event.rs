use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::process::ProcessKind;

/// Notifications emitted by the scheduling core for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutpostEvent {
    SpecQueued {
        spec_id: Uuid,
        name: String,
        kind: ProcessKind,
    },
    SpecClaimed {
        spec_id: Uuid,
        name: String,
        worker_id: Option<Uuid>,
    },
    /// A claimed spec could not be registered against its workshop and went back to the queue.
    SpecRequeued {
        spec_id: Uuid,
        name: String,
        building_id: Uuid,
    },
    ProcessStarted {
        process_id: Uuid,
        spec_id: Uuid,
        name: String,
        building_id: Uuid,
    },
    ProcessEnded {
        process_id: Uuid,
        name: String,
        building_id: Uuid,
        premature: bool,
    },
    TaskAssigned {
        task_id: Uuid,
        worker_id: Uuid,
        meta_task: String,
        building_id: Uuid,
        score: f64,
    },
    TaskEnded {
        task_id: Uuid,
        worker_id: Uuid,
        meta_task: String,
        reason: String,
        elapsed: f64,
    },
    Accident {
        resource_id: Uuid,
        resource_name: String,
        worker_id: Uuid,
    },
}

impl OutpostEvent {
    pub fn kind_name(&self) -> &'static str {
        match self {
            OutpostEvent::SpecQueued { .. } => "spec_queued",
            OutpostEvent::SpecClaimed { .. } => "spec_claimed",
            OutpostEvent::SpecRequeued { .. } => "spec_requeued",
            OutpostEvent::ProcessStarted { .. } => "process_started",
            OutpostEvent::ProcessEnded { .. } => "process_ended",
            OutpostEvent::TaskAssigned { .. } => "task_assigned",
            OutpostEvent::TaskEnded { .. } => "task_ended",
            OutpostEvent::Accident { .. } => "accident",
        }
    }

    /// The entity the event is about.
    pub fn subject_id(&self) -> Uuid {
        match self {
            OutpostEvent::SpecQueued { spec_id, .. }
            | OutpostEvent::SpecClaimed { spec_id, .. }
            | OutpostEvent::SpecRequeued { spec_id, .. } => *spec_id,
            OutpostEvent::ProcessStarted { process_id, .. }
            | OutpostEvent::ProcessEnded { process_id, .. } => *process_id,
            OutpostEvent::TaskAssigned { task_id, .. } | OutpostEvent::TaskEnded { task_id, .. } => {
                *task_id
            }
            OutpostEvent::Accident { resource_id, .. } => *resource_id,
        }
    }

    /// The worker that caused the event, if any.
    pub fn actor_id(&self) -> Option<Uuid> {
        match self {
            OutpostEvent::SpecClaimed { worker_id, .. } => *worker_id,
            OutpostEvent::TaskAssigned { worker_id, .. }
            | OutpostEvent::TaskEnded { worker_id, .. }
            | OutpostEvent::Accident { worker_id, .. } => Some(*worker_id),
            _ => None,
        }
    }
}

/// Fan-out channel for [`OutpostEvent`]s. Publishing never blocks and never
/// fails; events are dropped when nobody is listening.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<OutpostEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: OutpostEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<OutpostEvent> {
        self.tx.subscribe()
    }
}
