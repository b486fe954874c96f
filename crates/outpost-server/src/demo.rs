use std::sync::Arc;

use outpost_meta::MetaTaskRegistry;
use outpost_scheduler::{OutpostConfig, Simulation};
use outpost_settlement::{Building, Patient, Settlement};
use outpost_types::{
    EventBus, FavoriteActivity, JobType, PersonalityTrait, ProcessKind, ProcessSpec, RobotType,
    SkillType, Tool, ToolSet, Worker,
};

/// A small outpost with a machine shop, a kitchen, an infirmary and a
/// handful of workers, ready to run.
pub fn demo_simulation(config: &OutpostConfig, events: &EventBus) -> Simulation {
    let mut settlement = Settlement::new("Schiaparelli Station", events.clone());

    settlement.add_building(Building::new("Machine Shop", 6).with_workshop(
        ProcessKind::Manufacture,
        3,
        [Tool::Printer3d, Tool::Lathe, Tool::Furnace]
            .into_iter()
            .collect::<ToolSet>(),
        2,
        events,
    ));
    settlement.add_building(Building::new("Assembly Bay", 4).with_workshop(
        ProcessKind::Manufacture,
        1,
        ToolSet::all(),
        1,
        events,
    ));
    settlement.add_building(Building::new("Kitchen", 4).with_workshop(
        ProcessKind::FoodProduction,
        2,
        [Tool::Oven, Tool::Refrigerator, Tool::Blender]
            .into_iter()
            .collect::<ToolSet>(),
        2,
        events,
    ));
    settlement.add_building(Building::new("Infirmary", 4).with_sick_bay(4));

    let queued = [
        ProcessSpec::new("Pressure valve", ProcessKind::Manufacture)
            .with_requirements(1, 1)
            .with_tools([Tool::Lathe])
            .with_times(40.0, 20.0)
            .with_value(1.5),
        ProcessSpec::new("Solar panel frame", ProcessKind::Manufacture)
            .with_requirements(2, 2)
            .with_tools([Tool::Printer3d, Tool::Furnace])
            .with_times(120.0, 60.0)
            .with_priority(2)
            .with_value(3.0),
        ProcessSpec::new("Airlock seal", ProcessKind::Manufacture)
            .with_times(25.0, 10.0),
        ProcessSpec::new("Flatbread", ProcessKind::FoodProduction)
            .with_tools([Tool::Oven])
            .with_times(15.0, 30.0),
        ProcessSpec::new("Algae soup", ProcessKind::FoodProduction)
            .with_requirements(1, 1)
            .with_tools([Tool::Blender, Tool::Refrigerator])
            .with_times(20.0, 10.0)
            .with_value(1.2),
    ];
    for spec in queued {
        if let Err(e) = settlement.enqueue(spec) {
            tracing::warn!(error = %e, "demo spec rejected");
        }
    }

    if let Some(infirmary) = settlement.sick_bays().next() {
        infirmary.admit(Patient::new("Sprained wrist", 1, 30.0));
        infirmary.admit(Patient::new("Radiation burn", 3, 80.0));
    }

    let settlement = Arc::new(settlement);
    let home = settlement.id();
    let mut sim = Simulation::from_config(
        Arc::clone(&settlement),
        MetaTaskRegistry::standard(),
        config,
    );
    let workers = [
        Worker::person("Ines Alvarez")
            .with_job(JobType::Engineer)
            .with_skill(SkillType::MaterialsScience, 3)
            .with_trait(PersonalityTrait::Conscientiousness, 80)
            .with_favorite(FavoriteActivity::Tinkering),
        Worker::person("Tomas Berg")
            .with_job(JobType::Technician)
            .with_skill(SkillType::MaterialsScience, 1)
            .with_skill(SkillType::Cooking, 2),
        Worker::person("Mei Okafor")
            .with_job(JobType::Chef)
            .with_skill(SkillType::Cooking, 4),
        Worker::person("Sana Iqbal")
            .with_job(JobType::Doctor)
            .with_skill(SkillType::Medicine, 4)
            .with_trait(PersonalityTrait::Agreeableness, 75),
        Worker::robot("MK-7", RobotType::Makerbot).with_skill(SkillType::MaterialsScience, 2),
        Worker::robot("CB-2", RobotType::Chefbot).with_skill(SkillType::Cooking, 2),
    ];
    for worker in workers {
        sim.add_worker(worker.inside(home, None));
    }
    sim
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_outpost_gets_to_work() {
        let config = OutpostConfig {
            accident_seed: Some(1),
            ..Default::default()
        };
        let mut sim = demo_simulation(&config, &EventBus::default());
        let report = sim.pulse(config.pulse_millisols).unwrap();
        assert!(!report.assigned.is_empty());
        assert_eq!(sim.snapshot().buildings.len(), 4);
    }

    #[test]
    fn test_demo_recovers_from_accidents() {
        let config = OutpostConfig {
            accident_seed: Some(1),
            repair_after_pulses: 1,
            ..Default::default()
        };
        let mut sim = demo_simulation(&config, &EventBus::default());
        let kitchen = sim
            .settlement()
            .workshops(ProcessKind::FoodProduction)
            .next()
            .unwrap()
            .clone();
        kitchen.set_malfunction(true);
        sim.pulse(config.pulse_millisols).unwrap();
        let report = sim.pulse(config.pulse_millisols).unwrap();
        assert!(report.repaired >= 1);
        assert!(!sim.snapshot().buildings.iter().any(|b| b.name == "Kitchen" && b.malfunction));
    }
}
