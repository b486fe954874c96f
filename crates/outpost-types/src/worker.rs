use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which kind of agent a worker is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WorkerKind {
    Person,
    Robot,
}

/// Robot sub-types, used by descriptors to prefer particular models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RobotType {
    Makerbot,
    Chefbot,
    Medicbot,
    Repairbot,
    Gardenbot,
    Deliverybot,
}

/// Skill disciplines that govern categories of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillType {
    MaterialsScience,
    Cooking,
    Medicine,
    Mechanics,
    Botany,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JobType {
    Engineer,
    Technician,
    Chef,
    Doctor,
    Botanist,
    Architect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PersonalityTrait {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FavoriteActivity {
    Tinkering,
    Cooking,
    Operation,
    Research,
    Tending,
}

/// Where a worker physically is relative to its settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationSituation {
    InSettlement,
    InVehicle,
    OutsideSuited,
    OutsideUnprotected,
    Away,
}

impl LocationSituation {
    pub fn is_inside(&self) -> bool {
        matches!(self, LocationSituation::InSettlement)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerLocation {
    pub settlement_id: Option<Uuid>,
    pub building_id: Option<Uuid>,
    pub situation: LocationSituation,
}

impl Default for WorkerLocation {
    fn default() -> Self {
        Self {
            settlement_id: None,
            building_id: None,
            situation: LocationSituation::Away,
        }
    }
}

/// Physical (or, for robots, operational) state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalCondition {
    /// Performance rating in [0, 1]. Zero means incapacitated.
    pub performance: f64,
    pub fatigue: f64,
    pub stress: f64,
    pub hunger: f64,
}

pub const MAX_FATIGUE: f64 = 1000.0;
pub const MAX_HUNGER: f64 = 1000.0;
pub const MAX_STRESS: f64 = 100.0;

impl Default for PhysicalCondition {
    fn default() -> Self {
        Self {
            performance: 1.0,
            fatigue: 0.0,
            stress: 0.0,
            hunger: 0.0,
        }
    }
}

impl PhysicalCondition {
    /// Whether the worker is in good enough shape to take on work.
    pub fn is_fit(&self, min_performance: f64) -> bool {
        self.performance >= min_performance
            && self.fatigue < MAX_FATIGUE
            && self.hunger < MAX_HUNGER
            && self.stress < MAX_STRESS
    }

    pub fn add_stress(&mut self, amount: f64) {
        self.stress = (self.stress + amount).clamp(0.0, MAX_STRESS);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub level: u32,
    pub experience: f64,
}

/// Experience needed to advance from `level` to `level + 1`.
pub fn experience_for_next_level(level: u32) -> f64 {
    25.0 * 2f64.powi(level.min(30) as i32)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillManager {
    skills: BTreeMap<SkillType, SkillRecord>,
}

impl SkillManager {
    pub fn level(&self, skill: SkillType) -> u32 {
        self.skills.get(&skill).map(|r| r.level).unwrap_or(0)
    }

    pub fn experience(&self, skill: SkillType) -> f64 {
        self.skills.get(&skill).map(|r| r.experience).unwrap_or(0.0)
    }

    pub fn set_level(&mut self, skill: SkillType, level: u32) {
        self.skills.entry(skill).or_default().level = level;
    }

    /// Add experience points, advancing levels as thresholds are crossed.
    /// Returns the number of levels gained.
    pub fn add_experience(&mut self, skill: SkillType, points: f64) -> u32 {
        if points <= 0.0 {
            return 0;
        }
        let record = self.skills.entry(skill).or_default();
        record.experience += points;
        let mut gained = 0;
        while record.experience >= experience_for_next_level(record.level) {
            record.experience -= experience_for_next_level(record.level);
            record.level += 1;
            gained += 1;
        }
        gained
    }
}

/// A person or robot that can be scheduled for settlement work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: Uuid,
    pub name: String,
    pub kind: WorkerKind,
    pub robot_type: Option<RobotType>,
    pub job: Option<JobType>,
    pub traits: BTreeMap<PersonalityTrait, u8>,
    pub favorite: Option<FavoriteActivity>,
    /// Natural aptitude for learning, 0-100 with 50 as neutral.
    pub experience_aptitude: u8,
    pub skills: SkillManager,
    pub condition: PhysicalCondition,
    pub location: WorkerLocation,
    /// Set by the (external) duty roster.
    pub on_duty: bool,
}

impl Worker {
    fn with_kind(name: impl Into<String>, kind: WorkerKind, robot_type: Option<RobotType>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            robot_type,
            job: None,
            traits: BTreeMap::new(),
            favorite: None,
            experience_aptitude: 50,
            skills: SkillManager::default(),
            condition: PhysicalCondition::default(),
            location: WorkerLocation::default(),
            on_duty: true,
        }
    }

    pub fn person(name: impl Into<String>) -> Self {
        Self::with_kind(name, WorkerKind::Person, None)
    }

    pub fn robot(name: impl Into<String>, robot_type: RobotType) -> Self {
        Self::with_kind(name, WorkerKind::Robot, Some(robot_type))
    }

    pub fn with_skill(mut self, skill: SkillType, level: u32) -> Self {
        self.skills.set_level(skill, level);
        self
    }

    pub fn with_job(mut self, job: JobType) -> Self {
        self.job = Some(job);
        self
    }

    pub fn with_trait(mut self, personality: PersonalityTrait, value: u8) -> Self {
        self.traits.insert(personality, value.min(100));
        self
    }

    pub fn with_favorite(mut self, favorite: FavoriteActivity) -> Self {
        self.favorite = Some(favorite);
        self
    }

    /// Place the worker inside a settlement, optionally in a building.
    pub fn inside(mut self, settlement_id: Uuid, building_id: Option<Uuid>) -> Self {
        self.location = WorkerLocation {
            settlement_id: Some(settlement_id),
            building_id,
            situation: LocationSituation::InSettlement,
        };
        self
    }

    pub fn is_robot(&self) -> bool {
        self.kind == WorkerKind::Robot
    }

    pub fn performance_rating(&self) -> f64 {
        self.condition.performance.clamp(0.0, 1.0)
    }

    /// Skill level adjusted by current performance.
    pub fn effective_skill(&self, skill: SkillType) -> u32 {
        let level = self.skills.level(skill) as f64;
        (level * self.performance_rating()).round() as u32
    }

    /// Personality trait value, 50 when unknown.
    pub fn trait_value(&self, personality: PersonalityTrait) -> u8 {
        self.traits.get(&personality).copied().unwrap_or(50)
    }

    /// Whether the worker is physically inside the given settlement.
    pub fn is_present_at(&self, settlement_id: Uuid) -> bool {
        self.location.settlement_id == Some(settlement_id) && self.location.situation.is_inside()
    }
}
