use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of process work a workshop can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProcessKind {
    Manufacture,
    FoodProduction,
}

/// Equipment a process may need at its workshop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tool {
    Printer3d,
    Lathe,
    Furnace,
    Oven,
    Refrigerator,
    Blender,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::Printer3d,
        Tool::Lathe,
        Tool::Furnace,
        Tool::Oven,
        Tool::Refrigerator,
        Tool::Blender,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSet(BTreeSet<Tool>);

impl ToolSet {
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn all() -> Self {
        Self(Tool::ALL.into_iter().collect())
    }

    pub fn contains(&self, tool: Tool) -> bool {
        self.0.contains(&tool)
    }

    pub fn is_subset_of(&self, available: &ToolSet) -> bool {
        self.0.is_subset(&available.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.0.iter()
    }
}

impl FromIterator<Tool> for ToolSet {
    fn from_iter<I: IntoIterator<Item = Tool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A not-yet-started unit of process work waiting in a settlement queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub id: Uuid,
    /// Recipe name, e.g. "make aluminum sheet".
    pub name: String,
    pub kind: ProcessKind,
    pub skill_required: u32,
    pub tech_level_required: u32,
    pub tools: ToolSet,
    /// Labor (millisols) the process needs from workers.
    pub work_time: f64,
    /// Elapsed time (millisols) the process needs regardless of labor.
    pub process_time: f64,
    /// Higher priorities are claimed first.
    pub priority: u8,
    /// Value of the outputs to the settlement economy.
    pub value: f64,
}

impl ProcessSpec {
    pub fn new(name: impl Into<String>, kind: ProcessKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            skill_required: 0,
            tech_level_required: 0,
            tools: ToolSet::none(),
            work_time: 0.0,
            process_time: 0.0,
            priority: 0,
            value: 1.0,
        }
    }

    pub fn with_requirements(mut self, skill: u32, tech_level: u32) -> Self {
        self.skill_required = skill;
        self.tech_level_required = tech_level;
        self
    }

    pub fn with_tools(mut self, tools: impl IntoIterator<Item = Tool>) -> Self {
        self.tools = tools.into_iter().collect();
        self
    }

    pub fn with_times(mut self, work_time: f64, process_time: f64) -> Self {
        self.work_time = work_time.max(0.0);
        self.process_time = process_time.max(0.0);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value.max(0.0);
        self
    }

    /// Whether a worker and workshop with these capabilities may run this spec.
    pub fn can_run(&self, tech_level: u32, skill: u32, tools: &ToolSet) -> bool {
        self.tech_level_required <= tech_level
            && self.skill_required <= skill
            && self.tools.is_subset_of(tools)
    }
}
