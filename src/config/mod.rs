pub mod sequestered;

use crate::op::OperationClass;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("functional unit class {class}: operation {op} has zero latency")]
    ZeroLatency { class: String, op: OperationClass },

    #[error("functional unit class {class}: negative replica count {count}")]
    NegativeCount { class: String, count: i64 },

    #[error("duplicate functional unit class {class}")]
    DuplicateClass { class: String },
}

fn default_latency() -> u64 {
    1
}

fn default_pipelined() -> bool {
    true
}

fn default_count() -> i64 {
    1
}

/// Timing of one operation class on a functional unit class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpDesc {
    pub class: OperationClass,
    /// Cycles from start until the result is ready. Must be at least 1.
    #[serde(default = "default_latency")]
    pub latency: u64,
    /// Pipelined operations accept a new start every cycle; non-pipelined
    /// operations occupy their unit for the full latency.
    #[serde(default = "default_pipelined")]
    pub pipelined: bool,
}

impl OpDesc {
    #[must_use]
    pub fn new(class: impl Into<OperationClass>) -> Self {
        Self {
            class: class.into(),
            latency: default_latency(),
            pipelined: default_pipelined(),
        }
    }

    #[must_use]
    pub fn latency(mut self, latency: u64) -> Self {
        self.latency = latency;
        self
    }

    #[must_use]
    pub fn non_pipelined(mut self) -> Self {
        self.pipelined = false;
        self
    }
}

pub type OpList = SmallVec<[OpDesc; 8]>;

/// A functional unit class: the operations one replica implements, and how
/// many replicas to instantiate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuDesc {
    pub name: String,
    pub ops: OpList,
    /// Replica count as it appears in the external table. Zero declares the
    /// class without instantiating it.
    #[serde(default = "default_count")]
    pub count: i64,
}

impl FuDesc {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        ops: impl IntoIterator<Item = OpDesc>,
        count: i64,
    ) -> Self {
        Self {
            name: name.into(),
            ops: ops.into_iter().collect(),
            count,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.count < 0 {
            return Err(Error::NegativeCount {
                class: self.name.clone(),
                count: self.count,
            });
        }
        for op in &self.ops {
            if op.latency == 0 {
                return Err(Error::ZeroLatency {
                    class: self.name.clone(),
                    op: op.class.clone(),
                });
            }
        }
        Ok(())
    }
}

/// The machine description: the full functional unit class table, in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub functional_units: Vec<FuDesc>,
}

impl Default for Machine {
    fn default() -> Self {
        sequestered::machine(&sequestered::EncryptionConfig::default())
    }
}

impl Machine {
    #[must_use]
    pub fn new(functional_units: impl IntoIterator<Item = FuDesc>) -> Self {
        Self {
            functional_units: functional_units.into_iter().collect(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if let Some(class) = self
            .functional_units
            .iter()
            .map(|fu| &fu.name)
            .duplicates()
            .next()
        {
            return Err(Error::DuplicateClass {
                class: class.clone(),
            });
        }
        for fu in &self.functional_units {
            fu.validate()?;
        }
        Ok(())
    }

    /// Total replica count over all classes.
    #[must_use]
    pub fn num_units(&self) -> usize {
        self.functional_units
            .iter()
            .map(|fu| fu.count.max(0) as usize)
            .sum()
    }

    pub fn from_json_reader(reader: impl std::io::Read) -> Result<Self, crate::Error> {
        let machine: Self = serde_json::from_reader(reader)?;
        machine.validate()?;
        Ok(machine)
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, FuDesc, Machine, OpDesc};
    use color_eyre::eyre;

    #[test]
    fn op_desc_defaults_match_the_table_format() -> eyre::Result<()> {
        let op: OpDesc = serde_json::from_str(r#"{ "class": "IntAlu" }"#)?;
        assert_eq!(op, OpDesc::new("IntAlu"));
        assert_eq!(op.latency, 1);
        assert!(op.pipelined);

        let op: OpDesc = serde_json::from_str(
            r#"{ "class": "IntDiv", "latency": 20, "pipelined": false }"#,
        )?;
        assert_eq!(op, OpDesc::new("IntDiv").latency(20).non_pipelined());
        Ok(())
    }

    #[test]
    fn fu_desc_count_defaults_to_one() -> eyre::Result<()> {
        let fu: FuDesc = serde_json::from_str(
            r#"{ "name": "IntALU", "ops": [{ "class": "IntAlu" }] }"#,
        )?;
        assert_eq!(fu.count, 1);
        Ok(())
    }

    #[test]
    fn zero_latency_is_rejected() {
        let machine = Machine::new([FuDesc::new(
            "IntALU",
            [OpDesc::new("IntAlu").latency(0)],
            6,
        )]);
        assert_eq!(
            machine.validate(),
            Err(Error::ZeroLatency {
                class: "IntALU".to_string(),
                op: "IntAlu".into(),
            })
        );
    }

    #[test]
    fn negative_count_is_rejected() {
        let machine = Machine::new([FuDesc::new("IntALU", [OpDesc::new("IntAlu")], -1)]);
        assert_eq!(
            machine.validate(),
            Err(Error::NegativeCount {
                class: "IntALU".to_string(),
                count: -1,
            })
        );
    }

    #[test]
    fn duplicate_class_names_are_rejected() {
        let machine = Machine::new([
            FuDesc::new("IntALU", [OpDesc::new("IntAlu")], 6),
            FuDesc::new("IntALU", [OpDesc::new("IntAlu")], 2),
        ]);
        assert_eq!(
            machine.validate(),
            Err(Error::DuplicateClass {
                class: "IntALU".to_string(),
            })
        );
    }

    #[test]
    fn zero_count_declares_but_disables() -> eyre::Result<()> {
        let machine = Machine::new([FuDesc::new(
            "ReadPort",
            [OpDesc::new("MemRead"), OpDesc::new("FloatMemRead")],
            0,
        )]);
        machine.validate()?;
        assert_eq!(machine.num_units(), 0);
        Ok(())
    }

    #[test]
    fn machine_parses_from_the_json_table_form() -> eyre::Result<()> {
        let table = r#"{
            "functional_units": [
                { "name": "IntALU", "ops": [{ "class": "IntAlu" }], "count": 6 },
                {
                    "name": "IntMultDiv",
                    "ops": [
                        { "class": "IntMult", "latency": 3 },
                        { "class": "IntDiv", "latency": 20, "pipelined": false }
                    ],
                    "count": 2
                }
            ]
        }"#;
        let machine = Machine::from_json_reader(table.as_bytes())?;
        assert_eq!(machine.functional_units.len(), 2);
        assert_eq!(machine.num_units(), 8);
        assert_eq!(machine.functional_units[1].ops[1].latency, 20);
        assert!(!machine.functional_units[1].ops[1].pipelined);
        Ok(())
    }

    #[test]
    fn unknown_tags_are_accepted_verbatim() -> eyre::Result<()> {
        let table = r#"{
            "functional_units": [
                { "name": "Weird", "ops": [{ "class": "FrobnicateWide" }], "count": 1 }
            ]
        }"#;
        let machine = Machine::from_json_reader(table.as_bytes())?;
        assert_eq!(machine.functional_units[0].ops[0].class, "FrobnicateWide");
        Ok(())
    }
}
