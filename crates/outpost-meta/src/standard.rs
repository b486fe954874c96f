use outpost_types::{
    FavoriteActivity, JobType, PersonalityTrait, ProcessKind, RobotType, SkillType,
};

use crate::descriptor::{MetaTask, TaskPhase, TaskScope, WorkProfile, WorkerScope};
use crate::generator::{medical_candidates, process_candidates};
use crate::scoring::{assess_medical, assess_standard};

pub const MANUFACTURE_ACCIDENT_RATE: f64 = 0.001;
pub const FOOD_ACCIDENT_RATE: f64 = 0.003;
pub const MEDICAL_ACCIDENT_RATE: f64 = 0.0005;

/// Run queued manufacturing processes in workshops.
pub fn manufacture_good() -> MetaTask {
    let profile = WorkProfile {
        phases: vec![TaskPhase::Approach, TaskPhase::Manufacture],
        process_kind: Some(ProcessKind::Manufacture),
        accident_rate: MANUFACTURE_ACCIDENT_RATE,
        stress_modifier: 0.1,
    };
    MetaTask::new(
        "ManufactureGood",
        SkillType::MaterialsScience,
        profile,
        process_candidates,
        assess_standard,
    )
    .with_task_scope(TaskScope::WorkHour)
    .with_traits([PersonalityTrait::Conscientiousness, PersonalityTrait::Openness])
    .with_jobs([JobType::Engineer, JobType::Technician, JobType::Architect])
    .with_robots([RobotType::Makerbot, RobotType::Repairbot])
    .with_favorite(FavoriteActivity::Tinkering)
}

/// Run queued food production processes in kitchens.
pub fn produce_food() -> MetaTask {
    let profile = WorkProfile {
        phases: vec![TaskPhase::Approach, TaskPhase::ProduceFood],
        process_kind: Some(ProcessKind::FoodProduction),
        accident_rate: FOOD_ACCIDENT_RATE,
        stress_modifier: 0.1,
    };
    MetaTask::new(
        "ProduceFood",
        SkillType::Cooking,
        profile,
        process_candidates,
        assess_standard,
    )
    .with_task_scope(TaskScope::WorkHour)
    .with_traits([PersonalityTrait::Conscientiousness])
    .with_jobs([JobType::Chef])
    .with_robots([RobotType::Chefbot])
    .with_favorite(FavoriteActivity::Cooking)
}

/// Treat patients waiting in sick bays. People only.
pub fn treat_patients() -> MetaTask {
    let profile = WorkProfile {
        phases: vec![TaskPhase::Approach, TaskPhase::Treat],
        process_kind: None,
        accident_rate: MEDICAL_ACCIDENT_RATE,
        stress_modifier: 0.2,
    };
    MetaTask::new(
        "TreatPatients",
        SkillType::Medicine,
        profile,
        medical_candidates,
        assess_medical,
    )
    .with_worker_scope(WorkerScope::PersonOnly)
    .with_traits([PersonalityTrait::Agreeableness])
    .with_jobs([JobType::Doctor])
    .with_favorite(FavoriteActivity::Operation)
}
