use serde::{Deserialize, Serialize};

use outpost_settlement::Settlement;
use outpost_types::{RatingScore, Worker, WorkerKind};

use crate::candidate::SettlementTask;
use crate::descriptor::{MetaTask, TaskScope};

pub const JOB_MODIFIER: f64 = 1.5;
pub const FAVORITE_MODIFIER: f64 = 1.2;
pub const PREFERRED_ROBOT_MODIFIER: f64 = 1.5;
/// Already standing in the target building.
pub const SAME_BUILDING_MODIFIER: f64 = 1.1;
/// Target building is at full occupancy.
pub const CROWDED_MODIFIER: f64 = 0.5;
/// Work offered outside the worker's preferred hours.
pub const OFF_SHIFT_MODIFIER: f64 = 0.2;
/// Score gained per effective skill level.
pub const SKILL_WEIGHT: f64 = 0.1;

/// Settings shared by every scorer during a pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringContext {
    /// Performance below which a worker is not fit to take on work.
    pub min_performance: f64,
}

impl Default for ScoringContext {
    fn default() -> Self {
        Self {
            min_performance: 0.2,
        }
    }
}

impl ScoringContext {
    pub fn new(min_performance: f64) -> Self {
        Self { min_performance }
    }
}

/// Standard scorer used by the process descriptors.
///
/// The skill gate runs first: a worker below the candidate's minimum skill
/// gets the zero score no matter what else is true of them. After that the
/// worker must be present in the settlement and fit for work, then
/// kind-specific modifiers and the shift modifier apply to the candidate's
/// base score.
pub fn assess_standard(
    meta: &MetaTask,
    candidate: &SettlementTask,
    worker: &Worker,
    settlement: &Settlement,
    ctx: &ScoringContext,
) -> RatingScore {
    let skill = worker.effective_skill(meta.skill);
    if skill < candidate.min_skill {
        return RatingScore::ZERO;
    }
    if !worker.is_present_at(settlement.id()) {
        return RatingScore::ZERO;
    }

    let mut score = candidate.base.clone();
    score.add_modifier("skill", 1.0 + skill as f64 * SKILL_WEIGHT);

    if !worker.condition.is_fit(ctx.min_performance) {
        return RatingScore::ZERO;
    }

    match worker.kind {
        WorkerKind::Robot => apply_robot_modifiers(meta, worker, &mut score),
        WorkerKind::Person => {
            apply_person_modifiers(meta, worker, &mut score);
            apply_location_modifier(candidate, worker, settlement, &mut score);
        }
    }

    apply_shift_modifier(meta, worker, &mut score);
    score
}

/// Scorer for patient treatment. Only sick bays without a malfunction
/// qualify; otherwise scored like process work.
pub fn assess_medical(
    meta: &MetaTask,
    candidate: &SettlementTask,
    worker: &Worker,
    settlement: &Settlement,
    ctx: &ScoringContext,
) -> RatingScore {
    let treatable = settlement
        .building(candidate.building_id)
        .map(|b| b.sick_bay().is_some() && !b.has_malfunction())
        .unwrap_or(false);
    if !treatable {
        return RatingScore::ZERO;
    }
    assess_standard(meta, candidate, worker, settlement, ctx)
}

fn apply_robot_modifiers(meta: &MetaTask, worker: &Worker, score: &mut RatingScore) {
    score.add_modifier("performance", worker.performance_rating());
    if worker
        .robot_type
        .is_some_and(|t| meta.preferred_robots.contains(&t))
    {
        score.add_modifier("robot type", PREFERRED_ROBOT_MODIFIER);
    }
}

fn apply_person_modifiers(meta: &MetaTask, worker: &Worker, score: &mut RatingScore) {
    score.add_modifier("fitness", worker.performance_rating());
    for personality in &meta.preferred_traits {
        let value = worker.trait_value(*personality) as f64;
        score.add_modifier(
            format!("trait {personality:?}").to_lowercase(),
            1.0 + (value - 50.0) / 100.0,
        );
    }
    if worker.job.is_some_and(|j| meta.preferred_jobs.contains(&j)) {
        score.add_modifier("job", JOB_MODIFIER);
    }
    if meta.favorite.is_some() && worker.favorite == meta.favorite {
        score.add_modifier("favorite", FAVORITE_MODIFIER);
    }
}

fn apply_location_modifier(
    candidate: &SettlementTask,
    worker: &Worker,
    settlement: &Settlement,
    score: &mut RatingScore,
) {
    if worker.location.building_id == Some(candidate.building_id) {
        score.add_modifier("location", SAME_BUILDING_MODIFIER);
    } else if settlement
        .building(candidate.building_id)
        .is_ok_and(|b| b.is_crowded())
    {
        score.add_modifier("location", CROWDED_MODIFIER);
    }
}

fn apply_shift_modifier(meta: &MetaTask, worker: &Worker, score: &mut RatingScore) {
    let off_shift = match meta.task_scope {
        TaskScope::AnyHour => false,
        TaskScope::WorkHour => !worker.on_duty,
        TaskScope::NonWorkHour => worker.on_duty,
    };
    if off_shift {
        score.add_modifier("shift", OFF_SHIFT_MODIFIER);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::standard::{manufacture_good, produce_food, treat_patients};
    use outpost_settlement::{Building, Patient};
    use outpost_types::{
        EventBus, JobType, LocationSituation, PersonalityTrait, ProcessKind, ProcessSpec,
        RobotType, SkillType, ToolSet,
    };
    use proptest::prelude::*;
    use uuid::Uuid;

    struct Fixture {
        settlement: Settlement,
        workshop_id: Uuid,
        candidate: SettlementTask,
        meta: Arc<MetaTask>,
    }

    fn fixture(min_skill: u32) -> Fixture {
        let events = EventBus::default();
        let mut settlement = Settlement::new("Gale Crater", events.clone());
        let workshop_id = settlement.add_building(Building::new("workshop", 2).with_workshop(
            ProcessKind::Manufacture,
            3,
            ToolSet::all(),
            2,
            &events,
        ));
        settlement
            .enqueue(
                ProcessSpec::new("pipe", ProcessKind::Manufacture)
                    .with_requirements(min_skill, 1)
                    .with_times(20.0, 0.0),
            )
            .unwrap();
        let meta = Arc::new(manufacture_good());
        let candidate = meta.settlement_candidates(&settlement).remove(0);
        Fixture {
            settlement,
            workshop_id,
            candidate,
            meta,
        }
    }

    fn engineer(settlement: &Settlement, skill: u32) -> Worker {
        Worker::person("ada")
            .with_skill(SkillType::MaterialsScience, skill)
            .inside(settlement.id(), None)
    }

    fn assess(f: &Fixture, worker: &Worker) -> RatingScore {
        f.meta
            .assess_suitability(&f.candidate, worker, &f.settlement, &ScoringContext::default())
    }

    #[test]
    fn test_underskilled_worker_scores_zero() {
        let f = fixture(3);
        let novice = engineer(&f.settlement, 2)
            .with_job(JobType::Engineer)
            .with_trait(PersonalityTrait::Conscientiousness, 100);
        assert!(assess(&f, &novice).is_zero());
        assert!(!assess(&f, &engineer(&f.settlement, 3)).is_zero());
    }

    #[test]
    fn test_absent_worker_scores_zero() {
        let f = fixture(0);
        let mut worker = engineer(&f.settlement, 3);
        worker.location.situation = LocationSituation::OutsideSuited;
        assert!(assess(&f, &worker).is_zero());

        let elsewhere = Worker::person("bo")
            .with_skill(SkillType::MaterialsScience, 3)
            .inside(Uuid::new_v4(), None);
        assert!(assess(&f, &elsewhere).is_zero());
    }

    #[test]
    fn test_unfit_person_scores_zero() {
        let f = fixture(0);
        let mut worker = engineer(&f.settlement, 3);
        worker.condition.performance = 0.1;
        assert!(assess(&f, &worker).is_zero());
    }

    #[test]
    fn test_preferred_job_scores_higher() {
        let f = fixture(0);
        let plain = assess(&f, &engineer(&f.settlement, 2));
        let preferred = assess(&f, &engineer(&f.settlement, 2).with_job(JobType::Engineer));
        assert!(preferred.score() > plain.score());
        assert_eq!(
            preferred.modifier("job"),
            Some(outpost_types::ScoreModifier::Factor(JOB_MODIFIER))
        );
    }

    #[test]
    fn test_excluded_robot_type_scores_zero() {
        let events = EventBus::default();
        let mut settlement = Settlement::new("Gale Crater", events.clone());
        settlement.add_building(Building::new("infirmary", 4).with_sick_bay(2));
        settlement
            .sick_bays()
            .for_each(|b| assert!(b.admit(Patient::new("kim", 0, 10.0))));
        let meta = Arc::new(treat_patients());
        let candidate = meta.settlement_candidates(&settlement).remove(0);
        let robot = Worker::robot("medic", RobotType::Medicbot)
            .with_skill(SkillType::Medicine, 4)
            .inside(settlement.id(), None);
        let score =
            meta.assess_suitability(&candidate, &robot, &settlement, &ScoringContext::default());
        assert!(score.is_zero());
    }

    #[test]
    fn test_robot_scored_by_performance() {
        let events = EventBus::default();
        let mut settlement = Settlement::new("Gale Crater", events.clone());
        settlement.add_building(Building::new("kitchen", 4).with_workshop(
            ProcessKind::FoodProduction,
            2,
            ToolSet::all(),
            1,
            &events,
        ));
        settlement
            .enqueue(ProcessSpec::new("bread", ProcessKind::FoodProduction).with_times(10.0, 0.0))
            .unwrap();
        let meta = Arc::new(produce_food());
        let candidate = meta.settlement_candidates(&settlement).remove(0);
        let mut chefbot = Worker::robot("chef", RobotType::Chefbot)
            .with_skill(SkillType::Cooking, 2)
            .inside(settlement.id(), None);
        let ctx = ScoringContext::default();
        let full = meta.assess_suitability(&candidate, &chefbot, &settlement, &ctx);
        chefbot.condition.performance = 0.5;
        let half = meta.assess_suitability(&candidate, &chefbot, &settlement, &ctx);
        assert!(full.modifier("robot type").is_some());
        assert!(half.score() < full.score());
    }

    #[test]
    fn test_robot_below_readiness_threshold_scores_zero() {
        let events = EventBus::default();
        let mut settlement = Settlement::new("Gale Crater", events.clone());
        settlement.add_building(Building::new("kitchen", 4).with_workshop(
            ProcessKind::FoodProduction,
            2,
            ToolSet::all(),
            1,
            &events,
        ));
        settlement
            .enqueue(ProcessSpec::new("bread", ProcessKind::FoodProduction).with_times(10.0, 0.0))
            .unwrap();
        let meta = Arc::new(produce_food());
        let candidate = meta.settlement_candidates(&settlement).remove(0);
        let mut chefbot = Worker::robot("chef", RobotType::Chefbot)
            .with_skill(SkillType::Cooking, 4)
            .inside(settlement.id(), None);
        chefbot.condition.performance = 0.05;
        let ctx = ScoringContext::default();
        let score = meta.assess_suitability(&candidate, &chefbot, &settlement, &ctx);
        assert!(score.is_zero());
        assert!(score.modifier("robot type").is_none());
    }

    #[test]
    fn test_off_duty_penalized() {
        let f = fixture(0);
        let on = engineer(&f.settlement, 2);
        let mut off = on.clone();
        off.on_duty = false;
        let on_score = assess(&f, &on);
        let off_score = assess(&f, &off);
        assert!(off_score.score() < on_score.score());
        assert!(!off_score.is_zero());
    }

    #[test]
    fn test_crowded_building_penalized() {
        let f = fixture(0);
        let worker = engineer(&f.settlement, 2);
        let before = assess(&f, &worker);
        let building = f.settlement.building(f.workshop_id).unwrap();
        assert!(building.enter());
        assert!(building.enter());
        let after = assess(&f, &worker);
        assert!(after.score() < before.score());

        let inside = engineer(&f.settlement, 2).inside(f.settlement.id(), Some(f.workshop_id));
        assert!(assess(&f, &inside).score() > before.score());
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let f = fixture(1);
        let worker = engineer(&f.settlement, 3).with_trait(PersonalityTrait::Openness, 70);
        assert_eq!(assess(&f, &worker), assess(&f, &worker));
    }

    proptest! {
        #[test]
        fn skill_gate_dominates_everything(
            min_skill in 1u32..8,
            deficit in 1u32..8,
            traits in proptest::collection::vec(0u8..=100, 5),
            with_job in any::<bool>(),
            on_duty in any::<bool>(),
            performance in 0.0f64..=1.0,
        ) {
            let f = fixture(min_skill);
            let skill = min_skill.saturating_sub(deficit);
            let mut worker = engineer(&f.settlement, skill)
                .with_trait(PersonalityTrait::Openness, traits[0])
                .with_trait(PersonalityTrait::Conscientiousness, traits[1])
                .with_trait(PersonalityTrait::Extraversion, traits[2])
                .with_trait(PersonalityTrait::Agreeableness, traits[3])
                .with_trait(PersonalityTrait::Neuroticism, traits[4]);
            if with_job {
                worker = worker.with_job(JobType::Engineer);
            }
            worker.on_duty = on_duty;
            worker.condition.performance = performance;
            prop_assert!(assess(&f, &worker).is_zero());
        }
    }
}
