use std::sync::Arc;

use outpost_execution::{EndReason, NoAccidents};
use outpost_meta::MetaTaskRegistry;
use outpost_scheduler::{OutpostConfig, Simulation};
use outpost_settlement::{Building, Patient, Settlement};
use outpost_types::{
    EventBus, JobType, OutpostEvent, ProcessKind, ProcessSpec, SkillType, ToolSet, Worker,
};
use tokio::sync::broadcast;
use uuid::Uuid;

struct Outpost {
    sim: Simulation,
    events: broadcast::Receiver<OutpostEvent>,
    workshops: Vec<Uuid>,
}

fn outpost(workshops: usize, sick_bay: bool) -> Outpost {
    let bus = EventBus::default();
    let events = bus.subscribe();
    let mut settlement = Settlement::new("Schiaparelli", bus.clone());
    let workshops = (0..workshops)
        .map(|i| {
            settlement.add_building(Building::new(format!("machine shop {i}"), 4).with_workshop(
                ProcessKind::Manufacture,
                2,
                ToolSet::all(),
                1,
                &bus,
            ))
        })
        .collect();
    if sick_bay {
        settlement.add_building(Building::new("infirmary", 4).with_sick_bay(3));
    }
    let sim = Simulation::new(Arc::new(settlement), MetaTaskRegistry::standard())
        .with_accidents(Box::new(NoAccidents));
    Outpost {
        sim,
        events,
        workshops,
    }
}

fn engineer(settlement: &Settlement, name: &str, level: u32) -> Worker {
    Worker::person(name)
        .with_skill(SkillType::MaterialsScience, level)
        .with_job(JobType::Engineer)
        .inside(settlement.id(), None)
}

fn drain(events: &mut broadcast::Receiver<OutpostEvent>) -> Vec<OutpostEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn is_idle(sim: &Simulation) -> bool {
    sim.workers().all(|w| sim.task_of(w.id).is_none())
}

/// Queued work is claimed, worked and finished, and every worker ends idle.
#[test]
fn test_manufacturing_lifecycle() {
    let mut o = outpost(2, false);
    let settlement = Arc::clone(o.sim.settlement());
    for name in ["valve", "pump", "filter"] {
        settlement
            .enqueue(ProcessSpec::new(name, ProcessKind::Manufacture).with_times(20.0, 3.0))
            .unwrap();
    }
    for name in ["ana", "ben", "cho"] {
        o.sim.add_worker(engineer(&settlement, name, 2));
    }

    let mut pulses = 0;
    loop {
        o.sim.pulse(5.0).unwrap();
        pulses += 1;
        let snapshot = o.sim.snapshot();
        let queued: usize = snapshot.queues.iter().map(|q| q.specs.len()).sum();
        if queued == 0 && snapshot.processes.is_empty() && is_idle(&o.sim) {
            break;
        }
        assert!(pulses < 100, "simulation did not settle");
    }

    let events = drain(&mut o.events);
    let finished = events
        .iter()
        .filter(|e| matches!(e, OutpostEvent::ProcessEnded { premature: false, .. }))
        .count();
    let started = events
        .iter()
        .filter(|e| matches!(e, OutpostEvent::ProcessStarted { .. }))
        .count();
    assert_eq!(started, 3);
    assert_eq!(finished, 3);
    assert!(
        o.sim
            .workers()
            .all(|w| w.skills.experience(SkillType::MaterialsScience) > 0.0)
    );
    for id in &o.workshops {
        assert_eq!(settlement.building(*id).unwrap().occupants(), 0);
    }
}

/// A malfunction interrupts the task but leaves the live process intact for
/// whoever picks it up after the repair.
#[test]
fn test_malfunction_pauses_and_resumes_work() {
    let mut o = outpost(1, false);
    let settlement = Arc::clone(o.sim.settlement());
    settlement
        .enqueue(ProcessSpec::new("hull plate", ProcessKind::Manufacture).with_times(60.0, 0.0))
        .unwrap();
    let worker = o.sim.add_worker(engineer(&settlement, "ana", 2));

    o.sim.pulse(5.0).unwrap();
    let before = o.sim.snapshot().processes[0].clone();
    assert!(o.sim.task_of(worker).is_some());

    let workshop = settlement.building(o.workshops[0]).unwrap().workshop().unwrap();
    workshop.set_malfunction(true);
    let report = o.sim.pulse(5.0).unwrap();
    assert_eq!(report.finished.len(), 1);
    assert_eq!(report.finished[0].end_reason, Some(EndReason::Malfunction));
    let paused = o.sim.snapshot().processes[0].clone();
    assert_eq!(paused.id, before.id);
    assert_eq!(paused.work_time_remaining(), before.work_time_remaining());

    // Nothing to offer while the workshop is down.
    let report = o.sim.pulse(5.0).unwrap();
    assert!(report.assigned.is_empty());

    workshop.repair();
    let report = o.sim.pulse(5.0).unwrap();
    assert_eq!(report.assigned.len(), 1);
    let resumed = o.sim.snapshot().processes[0].clone();
    assert_eq!(resumed.id, before.id);
    assert!(resumed.work_time_remaining() < paused.work_time_remaining());
}

/// With new processes forbidden, live work is still staffed but the queue
/// is left alone.
#[test]
fn test_process_override_only_blocks_new_work() {
    let mut o = outpost(2, false);
    let settlement = Arc::clone(o.sim.settlement());
    settlement
        .enqueue(ProcessSpec::new("truss", ProcessKind::Manufacture).with_times(200.0, 0.0))
        .unwrap();
    o.sim.add_worker(engineer(&settlement, "ana", 2));
    o.sim.pulse(5.0).unwrap();
    assert_eq!(o.sim.snapshot().processes.len(), 1);

    settlement
        .enqueue(ProcessSpec::new("beam", ProcessKind::Manufacture).with_times(200.0, 0.0))
        .unwrap();
    settlement.set_process_override(ProcessKind::Manufacture, true);
    o.sim.add_worker(engineer(&settlement, "ben", 2));
    for _ in 0..5 {
        o.sim.pulse(5.0).unwrap();
    }

    let snapshot = o.sim.snapshot();
    assert_eq!(snapshot.processes.len(), 1);
    let queue = snapshot
        .queues
        .iter()
        .find(|q| q.kind == ProcessKind::Manufacture)
        .unwrap();
    assert!(queue.overridden);
    assert_eq!(queue.specs.len(), 1);
    assert!(o.sim.workers().all(|w| o.sim.task_of(w.id).is_some()));
}

/// An underqualified worker is never handed work it cannot do.
#[test]
fn test_skill_requirements_respected() {
    let mut o = outpost(1, false);
    let settlement = Arc::clone(o.sim.settlement());
    settlement
        .enqueue(
            ProcessSpec::new("reactor part", ProcessKind::Manufacture)
                .with_requirements(5, 2)
                .with_times(10.0, 0.0),
        )
        .unwrap();
    let novice = o.sim.add_worker(engineer(&settlement, "novice", 1));
    let report = o.sim.pulse(5.0).unwrap();
    assert!(report.assigned.is_empty());
    assert!(o.sim.task_of(novice).is_none());

    let expert = o.sim.add_worker(engineer(&settlement, "expert", 6));
    let report = o.sim.pulse(5.0).unwrap();
    assert_eq!(report.assigned.len(), 1);
    assert_eq!(report.assigned[0].worker_id, expert);
}

/// Doctors go to the sick bay and stay until the patients are discharged.
#[test]
fn test_treatment_lifecycle() {
    let mut o = outpost(0, true);
    let settlement = Arc::clone(o.sim.settlement());
    let sick_bay = settlement.sick_bays().next().unwrap().clone();
    assert!(sick_bay.admit(Patient::new("dana", 1, 6.0)));
    assert!(sick_bay.admit(Patient::new("eli", 1, 6.0)));
    let doctor = o.sim.add_worker(
        Worker::person("doc")
            .with_skill(SkillType::Medicine, 3)
            .with_job(JobType::Doctor)
            .inside(settlement.id(), None),
    );

    let report = o.sim.pulse(5.0).unwrap();
    assert_eq!(report.assigned[0].meta_task, "TreatPatients");
    for _ in 0..10 {
        if sick_bay.patient_count() == 0 && o.sim.task_of(doctor).is_none() {
            break;
        }
        o.sim.pulse(5.0).unwrap();
    }
    assert_eq!(sick_bay.patient_count(), 0);
    assert!(o.sim.task_of(doctor).is_none());
    assert!(o.sim.worker(doctor).unwrap().condition.stress > 0.0);
}

#[test]
fn test_snapshot_renders_as_json() {
    let mut o = outpost(1, false);
    let settlement = Arc::clone(o.sim.settlement());
    settlement
        .enqueue(ProcessSpec::new("gasket", ProcessKind::Manufacture).with_times(50.0, 0.0))
        .unwrap();
    o.sim.add_worker(engineer(&settlement, "ana", 2));
    o.sim.pulse(5.0).unwrap();

    let json = serde_json::to_value(o.sim.snapshot()).unwrap();
    assert_eq!(json["name"], "Schiaparelli");
    assert_eq!(json["pulse"], 1);
    assert_eq!(json["workers"][0]["task"]["meta_task"], "ManufactureGood");
    assert_eq!(json["processes"].as_array().unwrap().len(), 1);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let run = || {
        let o = outpost(1, false);
        let settlement = Arc::clone(o.sim.settlement());
        let config = OutpostConfig {
            accident_seed: Some(7),
            ..Default::default()
        };
        settlement
            .enqueue(ProcessSpec::new("weld", ProcessKind::Manufacture).with_times(400.0, 0.0))
            .unwrap();
        let registry = MetaTaskRegistry::standard();
        let mut sim = Simulation::from_config(Arc::clone(&settlement), registry, &config);
        sim.add_worker(engineer(&settlement, "ana", 0));
        let mut reasons = Vec::new();
        for _ in 0..30 {
            let report = sim.pulse(5.0).unwrap();
            reasons.extend(report.finished.into_iter().map(|t| t.end_reason));
        }
        reasons
    };
    assert_eq!(run(), run());
}
