use outpost_types::{SkillType, Worker};

/// Millisols of work per base experience point.
pub const EXPERIENCE_DIVISOR: f64 = 100.0;

/// Productive time a worker gets out of `time`: robots work at half speed,
/// unskilled workers at half speed, each skill level adds 20%.
pub fn effective_work_time(worker: &Worker, skill: u32, time: f64) -> f64 {
    let mut work_time = time;
    if worker.is_robot() {
        work_time /= 2.0;
    }
    if skill == 0 {
        work_time / 2.0
    } else {
        work_time * (1.0 + 0.2 * skill as f64)
    }
}

/// Experience points earned for `time` millisols of work, scaled by the
/// worker's experience aptitude.
pub fn experience_points(worker: &Worker, time: f64) -> f64 {
    if time <= 0.0 {
        return 0.0;
    }
    let base = time / EXPERIENCE_DIVISOR;
    let aptitude = (worker.experience_aptitude as f64 - 50.0) / 100.0;
    (base + base * aptitude).max(0.0)
}

/// Credit the worker with experience (and stress, for people) for `time`
/// millisols of work. Returns the experience points added.
pub fn apply_work_effects(worker: &mut Worker, skill: SkillType, time: f64, stress_modifier: f64) -> f64 {
    let points = experience_points(worker, time);
    let gained = worker.skills.add_experience(skill, points);
    if gained > 0 {
        tracing::info!(worker = %worker.name, ?skill, level = worker.skills.level(skill), "skill improved");
    }
    if !worker.is_robot() && time > 0.0 {
        worker.condition.add_stress(stress_modifier * time);
    }
    points
}
