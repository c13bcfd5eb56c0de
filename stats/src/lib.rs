pub mod scheduler;
pub mod sim;

pub use scheduler::Scheduler;
pub use sim::Sim;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Issue counts per operation class, in first-issue order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionCounts {
    pub inner: IndexMap<String, u64>,
}

impl InstructionCounts {
    pub fn inc(&mut self, op_class: impl Into<String>) {
        *self.inner.entry(op_class.into()).or_insert(0) += 1;
    }

    #[must_use]
    pub fn get(&self, op_class: &str) -> u64 {
        self.inner.get(op_class).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.inner.values().sum()
    }
}

impl std::ops::AddAssign for InstructionCounts {
    fn add_assign(&mut self, other: Self) {
        for (op_class, count) in other.inner {
            *self.inner.entry(op_class).or_insert(0) += count;
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub sim: Sim,
    pub scheduler: Scheduler,
    pub instructions: InstructionCounts,
}

impl std::ops::AddAssign for Stats {
    fn add_assign(&mut self, other: Self) {
        self.sim += other.sim;
        self.scheduler += other.scheduler;
        self.instructions += other.instructions;
    }
}
