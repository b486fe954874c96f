use std::collections::BTreeMap;

use outpost_types::ProcessKind;

/// Economic model supplying how much the settlement currently values each
/// kind of process output. Applied as a multiplier to candidate base scores.
pub trait DemandModel: Send + Sync + std::fmt::Debug {
    fn commerce_factor(&self, kind: ProcessKind) -> f64;
}

/// Constant factors per kind; kinds without an entry get 1.0.
#[derive(Debug, Clone, Default)]
pub struct FixedDemand {
    factors: BTreeMap<ProcessKind, f64>,
}

impl FixedDemand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factor(mut self, kind: ProcessKind, factor: f64) -> Self {
        self.factors.insert(kind, factor.max(0.0));
        self
    }
}

impl DemandModel for FixedDemand {
    fn commerce_factor(&self, kind: ProcessKind) -> f64 {
        self.factors.get(&kind).copied().unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_factor_is_neutral() {
        let demand = FixedDemand::new().with_factor(ProcessKind::FoodProduction, 2.5);
        assert_eq!(demand.commerce_factor(ProcessKind::FoodProduction), 2.5);
        assert_eq!(demand.commerce_factor(ProcessKind::Manufacture), 1.0);
    }

    #[test]
    fn test_negative_factor_clamped() {
        let demand = FixedDemand::new().with_factor(ProcessKind::Manufacture, -1.0);
        assert_eq!(demand.commerce_factor(ProcessKind::Manufacture), 0.0);
    }
}
