use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use outpost_settlement::Settlement;
use outpost_types::{
    FavoriteActivity, JobType, PersonalityTrait, ProcessKind, RatingScore, RobotType, SkillType,
    Worker, WorkerKind,
};

use crate::candidate::SettlementTask;
use crate::scoring::ScoringContext;

/// Which kinds of agent a descriptor admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerScope {
    PersonOnly,
    RobotOnly,
    Any,
}

impl WorkerScope {
    pub fn admits(&self, kind: WorkerKind) -> bool {
        match self {
            WorkerScope::PersonOnly => kind == WorkerKind::Person,
            WorkerScope::RobotOnly => kind == WorkerKind::Robot,
            WorkerScope::Any => true,
        }
    }
}

/// When during the day a descriptor's work is normally done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskScope {
    AnyHour,
    WorkHour,
    NonWorkHour,
}

/// Named steps of a task. Each descriptor declares the subset it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPhase {
    /// Walk to the target building.
    Approach,
    Manufacture,
    ProduceFood,
    Treat,
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskPhase::Approach => "approach",
            TaskPhase::Manufacture => "manufacture",
            TaskPhase::ProduceFood => "produce food",
            TaskPhase::Treat => "treat",
        };
        f.write_str(name)
    }
}

/// How a task built from this descriptor executes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkProfile {
    /// Ordered phases; the first one is where every task starts.
    pub phases: Vec<TaskPhase>,
    /// Queue the task draws work from, if any.
    pub process_kind: Option<ProcessKind>,
    /// Base accident rate handed to the accident model.
    pub accident_rate: f64,
    /// Stress gained per millisol of work.
    pub stress_modifier: f64,
}

impl WorkProfile {
    pub fn declares(&self, phase: TaskPhase) -> bool {
        self.phases.contains(&phase)
    }

    /// Phase following `phase`, or `None` when it is the last.
    pub fn next_phase(&self, phase: TaskPhase) -> Option<TaskPhase> {
        let pos = self.phases.iter().position(|p| *p == phase)?;
        self.phases.get(pos + 1).copied()
    }
}

pub type GenerateFn = fn(&Arc<MetaTask>, &Settlement) -> Vec<SettlementTask>;

pub type AssessFn =
    fn(&MetaTask, &SettlementTask, &Worker, &Settlement, &ScoringContext) -> RatingScore;

/// A registered category of work with its own candidate generator and scorer.
///
/// Descriptors are immutable after registration and shared through `Arc`.
pub struct MetaTask {
    pub name: String,
    pub worker_scope: WorkerScope,
    pub task_scope: TaskScope,
    /// Discipline gating and modulating the work.
    pub skill: SkillType,
    pub preferred_traits: Vec<PersonalityTrait>,
    pub preferred_jobs: Vec<JobType>,
    pub preferred_robots: Vec<RobotType>,
    pub favorite: Option<FavoriteActivity>,
    pub profile: WorkProfile,
    generate: GenerateFn,
    assess: AssessFn,
}

impl MetaTask {
    pub fn new(
        name: impl Into<String>,
        skill: SkillType,
        profile: WorkProfile,
        generate: GenerateFn,
        assess: AssessFn,
    ) -> Self {
        Self {
            name: name.into(),
            worker_scope: WorkerScope::Any,
            task_scope: TaskScope::AnyHour,
            skill,
            preferred_traits: Vec::new(),
            preferred_jobs: Vec::new(),
            preferred_robots: Vec::new(),
            favorite: None,
            profile,
            generate,
            assess,
        }
    }

    pub fn with_worker_scope(mut self, scope: WorkerScope) -> Self {
        self.worker_scope = scope;
        self
    }

    pub fn with_task_scope(mut self, scope: TaskScope) -> Self {
        self.task_scope = scope;
        self
    }

    pub fn with_traits(mut self, traits: impl IntoIterator<Item = PersonalityTrait>) -> Self {
        self.preferred_traits = traits.into_iter().collect();
        self
    }

    pub fn with_jobs(mut self, jobs: impl IntoIterator<Item = JobType>) -> Self {
        self.preferred_jobs = jobs.into_iter().collect();
        self
    }

    pub fn with_robots(mut self, robots: impl IntoIterator<Item = RobotType>) -> Self {
        self.preferred_robots = robots.into_iter().collect();
        self
    }

    pub fn with_favorite(mut self, favorite: FavoriteActivity) -> Self {
        self.favorite = Some(favorite);
        self
    }

    /// Scan the settlement for work of this category. Read-only; candidates
    /// with no demand are never returned.
    pub fn settlement_candidates(self: &Arc<Self>, settlement: &Settlement) -> Vec<SettlementTask> {
        let mut candidates = (self.generate)(self, settlement);
        candidates.retain(|c| c.demand > 0);
        candidates
    }

    /// Score a candidate for a worker. Workers of a kind this descriptor
    /// does not admit get the zero score without further evaluation.
    pub fn assess_suitability(
        &self,
        candidate: &SettlementTask,
        worker: &Worker,
        settlement: &Settlement,
        ctx: &ScoringContext,
    ) -> RatingScore {
        if !self.worker_scope.admits(worker.kind) {
            return RatingScore::ZERO;
        }
        (self.assess)(self, candidate, worker, settlement, ctx)
    }
}

impl fmt::Debug for MetaTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaTask")
            .field("name", &self.name)
            .field("worker_scope", &self.worker_scope)
            .field("task_scope", &self.task_scope)
            .field("skill", &self.skill)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

/// Serializable description of a registered descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaTaskSummary {
    pub name: String,
    pub worker_scope: WorkerScope,
    pub task_scope: TaskScope,
    pub skill: SkillType,
    pub phases: Vec<TaskPhase>,
}

impl From<&MetaTask> for MetaTaskSummary {
    fn from(meta: &MetaTask) -> Self {
        Self {
            name: meta.name.clone(),
            worker_scope: meta.worker_scope,
            task_scope: meta.task_scope,
            skill: meta.skill,
            phases: meta.profile.phases.clone(),
        }
    }
}
