use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entry::JournalEntry;
use crate::traits::Journal;
use outpost_types::OutpostError;

/// Journal held in memory, optionally bounded to its newest entries.
///
/// Entries are numbered in append order and the indices store those
/// numbers rather than positions, so evicting the oldest entry leaves
/// every other index valid.
#[derive(Debug, Clone)]
pub struct InMemoryJournal {
    log: Arc<RwLock<Log>>,
    by_id: Arc<DashMap<Uuid, u64>>,
    by_subject: Arc<DashMap<Uuid, VecDeque<u64>>>,
    capacity: Option<usize>,
}

#[derive(Debug, Default)]
struct Log {
    entries: VecDeque<JournalEntry>,
    first_seq: u64,
}

impl Log {
    fn next_seq(&self) -> u64 {
        self.first_seq + self.entries.len() as u64
    }

    fn at(&self, seq: u64) -> Option<&JournalEntry> {
        let offset = seq.checked_sub(self.first_seq)?;
        self.entries.get(usize::try_from(offset).ok()?)
    }
}

impl InMemoryJournal {
    /// Journal that keeps everything.
    pub fn new() -> Self {
        Self {
            log: Arc::new(RwLock::new(Log::default())),
            by_id: Arc::new(DashMap::new()),
            by_subject: Arc::new(DashMap::new()),
            capacity: None,
        }
    }

    /// Journal that keeps at most `capacity` entries, dropping the oldest.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new()
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn evict_oldest(&self, log: &mut Log) {
        let Some(oldest) = log.entries.pop_front() else {
            return;
        };
        let seq = log.first_seq;
        log.first_seq += 1;
        self.by_id.remove(&oldest.id);
        if let Some(mut seqs) = self.by_subject.get_mut(&oldest.subject_id) {
            if seqs.front() == Some(&seq) {
                seqs.pop_front();
            }
        }
        self.by_subject
            .remove_if(&oldest.subject_id, |_, seqs| seqs.is_empty());
        tracing::trace!(entry = %oldest.id, kind = %oldest.kind, "journal entry evicted");
    }
}

impl Default for InMemoryJournal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Journal for InMemoryJournal {
    /// Appending an id that is already held is rejected.
    async fn append(&self, entry: JournalEntry) -> Result<(), OutpostError> {
        let mut log = self.log.write().await;
        if self.by_id.contains_key(&entry.id) {
            return Err(OutpostError::Journal(format!(
                "entry {} already recorded",
                entry.id
            )));
        }
        if self.capacity.is_some_and(|cap| log.entries.len() >= cap) {
            self.evict_oldest(&mut log);
        }

        let seq = log.next_seq();
        self.by_id.insert(entry.id, seq);
        self.by_subject
            .entry(entry.subject_id)
            .or_default()
            .push_back(seq);
        log.entries.push_back(entry);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<JournalEntry>, OutpostError> {
        let log = self.log.read().await;
        let seq = self.by_id.get(&id).map(|seq| *seq);
        Ok(seq.and_then(|seq| log.at(seq).cloned()))
    }

    async fn query_by_subject(&self, subject_id: Uuid) -> Result<Vec<JournalEntry>, OutpostError> {
        let log = self.log.read().await;
        let Some(seqs) = self.by_subject.get(&subject_id) else {
            return Ok(Vec::new());
        };
        Ok(seqs.iter().filter_map(|seq| log.at(*seq).cloned()).collect())
    }

    async fn query_by_kind(&self, kind: &str) -> Result<Vec<JournalEntry>, OutpostError> {
        let log = self.log.read().await;
        Ok(log.entries.iter().filter(|e| e.kind == kind).cloned().collect())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<JournalEntry>, OutpostError> {
        let log = self.log.read().await;
        let skip = log.entries.len().saturating_sub(limit);
        Ok(log.entries.iter().skip(skip).cloned().collect())
    }

    async fn len(&self) -> Result<usize, OutpostError> {
        Ok(self.log.read().await.entries.len())
    }
}
