use crate::{config, op::OperationClass, Cycle};
use indexmap::IndexMap;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("functional unit class {class} does not implement {op}")]
    UnsupportedOperation { class: String, op: OperationClass },

    #[error("no instantiated functional unit class implements {op}")]
    Unschedulable { op: OperationClass },
}

/// Occupancy of one functional unit replica.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Free,
    /// A non-pipelined operation holds the unit until the given cycle.
    Busy { until: Cycle },
}

/// One replica of a functional unit class.
#[derive(Debug, Clone)]
pub struct FunctionalUnit {
    pub id: usize,
    /// Index of the owning class in the pool.
    pub class: usize,
    status: Status,
    /// Cycle of the most recent start. A replica accepts at most one new
    /// start per cycle, pipelined or not.
    last_issue: Option<Cycle>,
}

impl FunctionalUnit {
    fn new(id: usize, class: usize) -> Self {
        Self {
            id,
            class,
            status: Status::Free,
            last_issue: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Can this replica start a new operation at `cycle`?
    #[must_use]
    pub fn is_free(&self, cycle: Cycle) -> bool {
        if self.last_issue == Some(cycle) {
            return false;
        }
        match self.status {
            Status::Free => true,
            Status::Busy { until } => until <= cycle,
        }
    }
}

/// The functional unit pool.
///
/// Owns every replica and arbitrates capability and occupancy. Replicas are
/// probed in ascending id order, so a given request stream always lands on
/// the same units.
#[derive(Debug, Default)]
pub struct Pool {
    classes: Vec<config::FuDesc>,
    class_index: IndexMap<String, usize>,
    units: Vec<FunctionalUnit>,
}

impl std::fmt::Display for Pool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pool({} units: {})",
            self.units.len(),
            self.classes
                .iter()
                .filter(|class| class.count > 0)
                .map(|class| format!("{}x{}", class.name, class.count))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Pool {
    pub fn new(machine: &config::Machine) -> Result<Self, config::Error> {
        let mut pool = Self::default();
        for desc in &machine.functional_units {
            pool.register_class(desc.clone())?;
        }
        Ok(pool)
    }

    /// Validates and stores a class definition and materializes its replicas,
    /// all initially free.
    pub fn register_class(&mut self, desc: config::FuDesc) -> Result<(), config::Error> {
        desc.validate()?;
        if self.class_index.contains_key(&desc.name) {
            return Err(config::Error::DuplicateClass { class: desc.name });
        }
        let class = self.classes.len();
        let count = desc.count as usize;
        log::debug!(
            "pool: register class {} ({} replicas, {} ops)",
            desc.name,
            count,
            desc.ops.len()
        );
        self.class_index.insert(desc.name.clone(), class);
        self.classes.push(desc);
        for _ in 0..count {
            let id = self.units.len();
            self.units.push(FunctionalUnit::new(id, class));
        }
        Ok(())
    }

    fn op_desc(&self, class: usize, op: &OperationClass) -> Option<&config::OpDesc> {
        self.classes[class].ops.iter().find(|desc| desc.class == *op)
    }

    /// True iff some class with at least one replica lists `op`.
    #[must_use]
    pub fn has_capable_class(&self, op: &OperationClass) -> bool {
        self.classes
            .iter()
            .any(|class| class.count > 0 && class.ops.iter().any(|desc| desc.class == *op))
    }

    /// Lowest-id replica that can start `op` at `cycle`.
    #[must_use]
    pub fn find_capable_free_instance(&self, op: &OperationClass, cycle: Cycle) -> Option<usize> {
        self.units
            .iter()
            .find(|unit| unit.is_free(cycle) && self.op_desc(unit.class, op).is_some())
            .map(|unit| unit.id)
    }

    /// Starts `op` on `unit` at `cycle` and returns the completion cycle.
    pub fn reserve(
        &mut self,
        unit: usize,
        op: &OperationClass,
        cycle: Cycle,
    ) -> Result<Cycle, CapabilityError> {
        let class = self.units[unit].class;
        let Some(desc) = self.op_desc(class, op) else {
            return Err(CapabilityError::UnsupportedOperation {
                class: self.classes[class].name.clone(),
                op: op.clone(),
            });
        };
        let (latency, pipelined) = (desc.latency, desc.pipelined);
        let completes_at = cycle + latency;
        debug_assert!(completes_at > cycle);

        log::trace!(
            "fu[{:03}] {}: start {} at cycle {} (latency {}, completes at {})",
            unit,
            self.classes[class].name,
            op,
            cycle,
            latency,
            completes_at,
        );

        let unit = &mut self.units[unit];
        debug_assert!(unit.is_free(cycle));
        unit.last_issue = Some(cycle);
        if !pipelined {
            unit.status = Status::Busy { until: completes_at };
        }
        Ok(completes_at)
    }

    /// Frees every replica whose busy window has ended.
    ///
    /// Runs once per cycle before issue, so a unit whose occupancy elapses at
    /// `cycle` can accept a new operation in that same cycle.
    pub fn release_expired(&mut self, cycle: Cycle) {
        for unit in &mut self.units {
            if let Status::Busy { until } = unit.status {
                if until <= cycle {
                    log::trace!(
                        "fu[{:03}] {}: released at cycle {}",
                        unit.id,
                        self.classes[unit.class].name,
                        cycle,
                    );
                    unit.status = Status::Free;
                }
            }
        }
    }

    #[must_use]
    pub fn num_units(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn units(&self) -> &[FunctionalUnit] {
        &self.units
    }

    #[must_use]
    pub fn class_name(&self, unit: usize) -> &str {
        &self.classes[self.units[unit].class].name
    }
}
