use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduler {
    /// Requests bound to a functional unit.
    pub num_issued: u64,
    /// Request-cycles spent waiting because every capable unit was occupied.
    pub issue_structural_hazard_stall: u64,
    /// Requests whose operation class no instantiated unit implements.
    pub num_unschedulable: u64,
}

impl std::ops::AddAssign for Scheduler {
    fn add_assign(&mut self, other: Self) {
        self.num_issued += other.num_issued;
        self.issue_structural_hazard_stall += other.issue_structural_hazard_stall;
        self.num_unschedulable += other.num_unschedulable;
    }
}
