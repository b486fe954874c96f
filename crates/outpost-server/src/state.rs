use std::sync::Arc;

use tokio::sync::watch;

use outpost_journal::{InMemoryJournal, Journal};
use outpost_scheduler::SettlementSnapshot;

/// Shared, read-only view handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub snapshot: watch::Receiver<SettlementSnapshot>,
    pub journal: Arc<dyn Journal>,
}

impl AppState {
    pub fn new(snapshot: watch::Receiver<SettlementSnapshot>, journal: Arc<dyn Journal>) -> Self {
        Self { snapshot, journal }
    }

    /// State with an empty snapshot and journal, for tests and tooling.
    pub fn detached() -> (Self, watch::Sender<SettlementSnapshot>) {
        let (tx, rx) = watch::channel(SettlementSnapshot::default());
        (Self::new(rx, Arc::new(InMemoryJournal::new())), tx)
    }

    pub fn current(&self) -> SettlementSnapshot {
        self.snapshot.borrow().clone()
    }
}
