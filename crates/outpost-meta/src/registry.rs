use std::sync::Arc;

use outpost_settlement::Settlement;
use outpost_types::{OutpostError, Result};

use crate::candidate::SettlementTask;
use crate::descriptor::{MetaTask, MetaTaskSummary};
use crate::standard::{manufacture_good, produce_food, treat_patients};

/// Ordered set of descriptors, built once at startup and passed to the
/// scheduler. Registration order breaks score ties.
#[derive(Debug, Default, Clone)]
pub struct MetaTaskRegistry {
    tasks: Vec<Arc<MetaTask>>,
}

impl MetaTaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in descriptor.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for meta in [manufacture_good(), produce_food(), treat_patients()] {
            // Built-in names are distinct.
            let _ = registry.register(meta);
        }
        registry
    }

    pub fn register(&mut self, meta: MetaTask) -> Result<Arc<MetaTask>> {
        if self.tasks.iter().any(|t| t.name == meta.name) {
            return Err(OutpostError::DuplicateMetaTask(meta.name));
        }
        tracing::debug!(meta_task = %meta.name, "meta task registered");
        let meta = Arc::new(meta);
        self.tasks.push(Arc::clone(&meta));
        Ok(meta)
    }

    pub fn get(&self, name: &str) -> Result<&Arc<MetaTask>> {
        self.tasks
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| OutpostError::UnknownMetaTask(name.to_string()))
    }

    /// Registration index of a descriptor, used for tie-breaking.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<MetaTask>> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Every descriptor's candidates, in registration order.
    pub fn generate_all(&self, settlement: &Settlement) -> Vec<SettlementTask> {
        self.tasks
            .iter()
            .flat_map(|meta| meta.settlement_candidates(settlement))
            .collect()
    }

    pub fn summaries(&self) -> Vec<MetaTaskSummary> {
        self.tasks.iter().map(|t| MetaTaskSummary::from(t.as_ref())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_order() {
        let registry = MetaTaskRegistry::standard();
        let names: Vec<_> = registry.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["ManufactureGood", "ProduceFood", "TreatPatients"]);
        assert_eq!(registry.position("ProduceFood"), Some(1));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = MetaTaskRegistry::standard();
        let err = registry.register(manufacture_good()).unwrap_err();
        assert!(matches!(err, OutpostError::DuplicateMetaTask(name) if name == "ManufactureGood"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unknown_lookup() {
        let registry = MetaTaskRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get("Sleep"),
            Err(OutpostError::UnknownMetaTask(_))
        ));
    }
}
