use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::entry::JournalEntry;
use crate::traits::Journal;
use outpost_types::OutpostEvent;

/// Copies every event published on the bus into a journal until shut down.
pub struct JournalRecorder {
    events: broadcast::Receiver<OutpostEvent>,
    shutdown_rx: watch::Receiver<bool>,
    journal: Arc<dyn Journal>,
}

impl JournalRecorder {
    pub fn new(
        events: broadcast::Receiver<OutpostEvent>,
        shutdown_rx: watch::Receiver<bool>,
        journal: Arc<dyn Journal>,
    ) -> Self {
        Self {
            events,
            shutdown_rx,
            journal,
        }
    }

    /// Run the recording loop.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                received = self.events.recv() => match received {
                    Ok(event) => self.record(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "journal recorder lagging, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("Event bus closed, journal recorder stopping");
                        break;
                    }
                },
                Ok(()) = self.shutdown_rx.changed() => {
                    if *self.shutdown_rx.borrow() {
                        tracing::info!("Journal recorder shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn record(&self, event: &OutpostEvent) {
        let entry = JournalEntry::from_event(event);
        if let Err(e) = self.journal.append(entry).await {
            tracing::error!(error = %e, kind = event.kind_name(), "failed to journal event");
        }
    }
}
