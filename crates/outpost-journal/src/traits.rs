use async_trait::async_trait;
use uuid::Uuid;

use crate::entry::JournalEntry;
use outpost_types::OutpostError;

/// Append-only store of scheduling events.
#[async_trait]
pub trait Journal: Send + Sync {
    async fn append(&self, entry: JournalEntry) -> Result<(), OutpostError>;

    async fn get(&self, id: Uuid) -> Result<Option<JournalEntry>, OutpostError>;

    /// Entries about one spec, process, task or resource, oldest first.
    async fn query_by_subject(&self, subject_id: Uuid) -> Result<Vec<JournalEntry>, OutpostError>;

    async fn query_by_kind(&self, kind: &str) -> Result<Vec<JournalEntry>, OutpostError>;

    /// The `limit` newest entries, oldest first.
    async fn recent(&self, limit: usize) -> Result<Vec<JournalEntry>, OutpostError>;

    async fn len(&self) -> Result<usize, OutpostError>;
}
