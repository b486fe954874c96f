use serde::{Deserialize, Serialize};
use uuid::Uuid;

use outpost_execution::TaskSummary;
use outpost_process::LiveProcess;
use outpost_settlement::{BuildingSummary, QueueSummary};
use outpost_types::{JobType, RobotType, Worker, WorkerKind};

/// What a dashboard shows for one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerStatus {
    pub id: Uuid,
    pub name: String,
    pub kind: WorkerKind,
    pub robot_type: Option<RobotType>,
    pub job: Option<JobType>,
    pub building_id: Option<Uuid>,
    pub performance: f64,
    pub stress: f64,
    pub task: Option<TaskSummary>,
}

impl WorkerStatus {
    pub fn new(worker: &Worker, task: Option<TaskSummary>) -> Self {
        Self {
            id: worker.id,
            name: worker.name.clone(),
            kind: worker.kind,
            robot_type: worker.robot_type,
            job: worker.job,
            building_id: worker.location.building_id,
            performance: worker.performance_rating(),
            stress: worker.condition.stress,
            task,
        }
    }
}

/// Read-only picture of a settlement after a pulse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettlementSnapshot {
    pub settlement_id: Uuid,
    pub name: String,
    pub pulse: u64,
    /// Simulated millisols since start.
    pub clock: f64,
    pub queues: Vec<QueueSummary>,
    pub processes: Vec<LiveProcess>,
    pub buildings: Vec<BuildingSummary>,
    pub workers: Vec<WorkerStatus>,
}
