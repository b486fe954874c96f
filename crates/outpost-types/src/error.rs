use thiserror::Error;

use crate::process::ProcessKind;

#[derive(Debug, Error)]
pub enum OutpostError {
    /// A task reached a phase its descriptor never declared. Always fatal.
    #[error("Invalid phase: task '{task}' has no handler for phase '{phase}'")]
    InvalidPhase { task: String, phase: String },

    #[error("Worker not found: {0}")]
    WorkerNotFound(uuid::Uuid),

    #[error("Building not found: {0}")]
    BuildingNotFound(uuid::Uuid),

    #[error("Process not found: {0}")]
    ProcessNotFound(uuid::Uuid),

    #[error("Meta task already registered: {0}")]
    DuplicateMetaTask(String),

    #[error("Unknown meta task: {0}")]
    UnknownMetaTask(String),

    #[error("Settlement has no queue for {0:?} processes")]
    NoQueue(ProcessKind),

    /// The journal refused an entry.
    #[error("Journal error: {0}")]
    Journal(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

}

impl OutpostError {
    /// Whether this error signals a broken descriptor/implementation contract
    /// that must stop the simulation instead of being retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, OutpostError::InvalidPhase { .. })
    }
}

impl From<serde_json::Error> for OutpostError {
    fn from(e: serde_json::Error) -> Self {
        OutpostError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OutpostError>;
