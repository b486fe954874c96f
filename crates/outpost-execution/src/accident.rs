use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use outpost_types::Malfunctionable;

/// Decides whether work on a resource caused an accident.
///
/// Called exactly once per productive phase invocation with the time that
/// invocation spent working.
pub trait AccidentModel: Send {
    fn check_for_accident(
        &mut self,
        resource: &dyn Malfunctionable,
        time: f64,
        base_rate: f64,
        skill: u32,
    ) -> bool;
}

/// Accident chance in percent per millisol. Unskilled workers are more
/// accident prone, experts much less.
pub fn accident_chance(base_rate: f64, skill: u32, resource_modifier: f64) -> f64 {
    let chance = if skill <= 3 {
        base_rate * (4 - skill) as f64
    } else {
        base_rate / (skill - 2) as f64
    };
    chance * resource_modifier
}

/// Accidents drawn from a seedable RNG. An accident marks the resource as
/// malfunctioning.
#[derive(Debug)]
pub struct RandomAccidents {
    rng: StdRng,
}

impl RandomAccidents {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl Default for RandomAccidents {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AccidentModel for RandomAccidents {
    fn check_for_accident(
        &mut self,
        resource: &dyn Malfunctionable,
        time: f64,
        base_rate: f64,
        skill: u32,
    ) -> bool {
        if time <= 0.0 {
            return false;
        }
        let chance = accident_chance(base_rate, skill, resource.accident_modifier());
        let roll: f64 = self.rng.gen_range(0.0..100.0);
        if roll < chance * time {
            tracing::warn!(resource = %resource.resource_name(), skill, "accident");
            resource.record_accident();
            return true;
        }
        false
    }
}

/// Never fires.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAccidents;

impl AccidentModel for NoAccidents {
    fn check_for_accident(&mut self, _: &dyn Malfunctionable, _: f64, _: f64, _: u32) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_types::MalfunctionFlag;
    use uuid::Uuid;

    struct Machine {
        id: Uuid,
        flag: MalfunctionFlag,
    }

    impl Malfunctionable for Machine {
        fn resource_id(&self) -> Uuid {
            self.id
        }

        fn resource_name(&self) -> &str {
            "lathe"
        }

        fn has_malfunction(&self) -> bool {
            self.flag.is_active()
        }

        fn accident_modifier(&self) -> f64 {
            self.flag.wear_modifier()
        }

        fn record_accident(&self) {
            self.flag.record_accident();
        }
    }

    #[test]
    fn test_chance_scales_with_skill() {
        assert_eq!(accident_chance(0.001, 0, 1.0), 0.004);
        assert_eq!(accident_chance(0.001, 3, 1.0), 0.001);
        assert_eq!(accident_chance(0.001, 4, 1.0), 0.0005);
        assert_eq!(accident_chance(0.001, 3, 2.0), 0.002);
    }

    #[test]
    fn test_certain_accident_marks_resource() {
        let machine = Machine {
            id: Uuid::new_v4(),
            flag: MalfunctionFlag::default(),
        };
        let mut model = RandomAccidents::new(Some(7));
        // chance * time = 100% or more always fires
        assert!(model.check_for_accident(&machine, 1000.0, 0.1, 3));
        assert!(machine.has_malfunction());
        assert_eq!(machine.flag.accidents(), 1);
    }

    #[test]
    fn test_zero_time_never_fires() {
        let machine = Machine {
            id: Uuid::new_v4(),
            flag: MalfunctionFlag::default(),
        };
        let mut model = RandomAccidents::new(Some(7));
        assert!(!model.check_for_accident(&machine, 0.0, 10.0, 0));
        assert!(!machine.has_malfunction());
    }

    #[test]
    fn test_seeded_models_agree() {
        let machine = Machine {
            id: Uuid::new_v4(),
            flag: MalfunctionFlag::new(0.0),
        };
        let mut a = RandomAccidents::new(Some(42));
        let mut b = RandomAccidents::new(Some(42));
        for _ in 0..20 {
            assert_eq!(
                a.check_for_accident(&machine, 5.0, 0.003, 1),
                b.check_for_accident(&machine, 5.0, 0.003, 1)
            );
        }
    }
}
