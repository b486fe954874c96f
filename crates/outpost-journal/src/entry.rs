use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outpost_types::OutpostEvent;

/// A recorded scheduling or process event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    /// Event name, e.g. `process_ended`.
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    pub subject_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub payload: serde_json::Value,
}

impl JournalEntry {
    pub fn new(
        kind: impl Into<String>,
        subject_id: Uuid,
        actor_id: Option<Uuid>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            timestamp: Utc::now(),
            subject_id,
            actor_id,
            payload,
        }
    }

    pub fn from_event(event: &OutpostEvent) -> Self {
        let payload = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);
        Self::new(event.kind_name(), event.subject_id(), event.actor_id(), payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_types::ProcessKind;

    #[test]
    fn test_entry_from_event() {
        let spec_id = Uuid::new_v4();
        let entry = JournalEntry::from_event(&OutpostEvent::SpecQueued {
            spec_id,
            name: "bread".into(),
            kind: ProcessKind::FoodProduction,
        });
        assert_eq!(entry.kind, "spec_queued");
        assert_eq!(entry.subject_id, spec_id);
        assert!(entry.actor_id.is_none());
        assert_eq!(entry.payload["SpecQueued"]["name"], "bread");
    }
}
