use std::sync::{Mutex, MutexGuard, PoisonError};

use uuid::Uuid;

use outpost_types::{
    EventBus, Malfunctionable, OutpostError, OutpostEvent, ProcessKind, ProcessSpec, Result,
    ToolSet,
};

use crate::workshop::Workshop;

/// A spec removed from the queue by a successful claim.
///
/// Holding a `ClaimedSpec` is the only way to start a process from the
/// queue. If the caller cannot register it, it must hand it back through
/// [`ProcessQueue::requeue`], which restores its original position.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedSpec {
    seq: u64,
    spec: ProcessSpec,
}

impl ClaimedSpec {
    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    pub fn into_spec(self) -> ProcessSpec {
        self.spec
    }
}

#[derive(Debug)]
struct QueuedSpec {
    seq: u64,
    spec: ProcessSpec,
}

#[derive(Debug, Default)]
struct QueueInner {
    entries: Vec<QueuedSpec>,
    next_seq: u64,
}

impl QueueInner {
    /// Keep entries ordered by priority (high first), then arrival.
    fn insert(&mut self, queued: QueuedSpec) {
        let pos = self
            .entries
            .iter()
            .position(|e| {
                e.spec.priority < queued.spec.priority
                    || (e.spec.priority == queued.spec.priority && e.seq > queued.seq)
            })
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, queued);
    }
}

/// Settlement-scoped queue of process specs of one kind awaiting a worker.
///
/// Claiming is the exclusivity boundary of the scheduler: the scan and the
/// removal happen under a single lock, so concurrent claimers can never
/// receive the same spec.
#[derive(Debug)]
pub struct ProcessQueue {
    kind: ProcessKind,
    inner: Mutex<QueueInner>,
    events: EventBus,
}

impl ProcessQueue {
    pub fn new(kind: ProcessKind, events: EventBus) -> Self {
        Self {
            kind,
            inner: Mutex::new(QueueInner::default()),
            events,
        }
    }

    pub fn kind(&self) -> ProcessKind {
        self.kind
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add new work. Specs of another kind are rejected.
    pub fn enqueue(&self, spec: ProcessSpec) -> Result<()> {
        if spec.kind != self.kind {
            return Err(OutpostError::NoQueue(spec.kind));
        }
        let event = OutpostEvent::SpecQueued {
            spec_id: spec.id,
            name: spec.name.clone(),
            kind: spec.kind,
        };
        {
            let mut inner = self.lock();
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.insert(QueuedSpec { seq, spec });
        }
        self.events.publish(event);
        Ok(())
    }

    /// Remove and return the first spec the caller is able to run, or
    /// `None` (leaving the queue untouched) when nothing matches.
    pub fn claim_next(&self, tech_level: u32, skill: u32, tools: &ToolSet) -> Option<ClaimedSpec> {
        self.claim(tech_level, skill, tools, None)
    }

    fn claim(
        &self,
        tech_level: u32,
        skill: u32,
        tools: &ToolSet,
        worker_id: Option<Uuid>,
    ) -> Option<ClaimedSpec> {
        let claimed = {
            let mut inner = self.lock();
            let pos = inner
                .entries
                .iter()
                .position(|e| e.spec.can_run(tech_level, skill, tools))?;
            let queued = inner.entries.remove(pos);
            ClaimedSpec {
                seq: queued.seq,
                spec: queued.spec,
            }
        };
        tracing::debug!(spec = %claimed.spec.name, "claimed process spec");
        self.events.publish(OutpostEvent::SpecClaimed {
            spec_id: claimed.spec.id,
            name: claimed.spec.name.clone(),
            worker_id,
        });
        Some(claimed)
    }

    /// Return a claimed spec that could not be started.
    pub fn requeue(&self, claimed: ClaimedSpec) {
        self.lock().insert(QueuedSpec {
            seq: claimed.seq,
            spec: claimed.spec,
        });
    }

    /// Claim a spec the workshop can run and register it as a live process.
    ///
    /// When the workshop turns out to be full (another claimer took the last
    /// slot) the spec goes back to the queue and `None` is returned.
    pub fn claim_and_start(
        &self,
        workshop: &Workshop,
        skill: u32,
        worker_id: Option<Uuid>,
    ) -> Option<Uuid> {
        if workshop.kind() != self.kind || workshop.has_malfunction() || workshop.free_slots() == 0 {
            return None;
        }
        let claimed = self.claim(workshop.tech_level(), skill, workshop.tools(), worker_id)?;
        self.start_or_requeue(workshop, claimed)
    }

    fn start_or_requeue(&self, workshop: &Workshop, claimed: ClaimedSpec) -> Option<Uuid> {
        match workshop.start_process(claimed) {
            Ok(process_id) => Some(process_id),
            Err(claimed) => {
                tracing::warn!(
                    spec = %claimed.spec.name,
                    workshop = %workshop.name(),
                    "workshop filled up after claim, returning spec to queue"
                );
                self.events.publish(OutpostEvent::SpecRequeued {
                    spec_id: claimed.spec.id,
                    name: claimed.spec.name.clone(),
                    building_id: workshop.building_id(),
                });
                self.requeue(claimed);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-only copy of the queue in claim order.
    pub fn snapshot(&self) -> Vec<ProcessSpec> {
        self.lock().entries.iter().map(|e| e.spec.clone()).collect()
    }

    /// Specs a workshop with this tech level and tooling could run, ignoring skill.
    pub fn startable(&self, tech_level: u32, tools: &ToolSet) -> Vec<ProcessSpec> {
        self.lock()
            .entries
            .iter()
            .filter(|e| e.spec.can_run(tech_level, u32::MAX, tools))
            .map(|e| e.spec.clone())
            .collect()
    }
}
