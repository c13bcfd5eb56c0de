//! The built-in machine description: the standard out-of-order core units
//! plus the sequestered-encryption units, whose latencies are all derived
//! from one [`EncryptionConfig`] at table construction.

use super::{FuDesc, Machine, OpDesc};
use crate::op::class;
use serde::{Deserialize, Serialize};

/// Block cipher evaluated by the encryption units.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    Serialize,
    Deserialize,
)]
pub enum EncryptionAlgorithm {
    /// AES-128
    #[default]
    Aes128,
    /// Simon-128/128
    Simon128128,
    /// Qarma11-128-o1
    Qarma11,
}

impl EncryptionAlgorithm {
    /// Encrypt/decrypt latency in cycles.
    #[must_use]
    pub fn latency(self) -> u64 {
        match self {
            Self::Aes128 => 40,
            Self::Simon128128 => 20,
            Self::Qarma11 => 12,
        }
    }
}

/// Element counts of the private-read kernels backing the `EncMem` latency.
pub mod span {
    pub const MIN_SPAN: u64 = 100;
    pub const BOYER_MOORE: u64 = 400;
    pub const KNAPSACK: u64 = 251;
    pub const FLOOD_FILL: u64 = 100;
}

/// Parameters of the sequestered-encryption units.
///
/// The cipher is the single knob: every encryption unit latency is computed
/// from it here, when the table is built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionConfig {
    pub algorithm: EncryptionAlgorithm,
    /// Baseline cache round trip subtracted from the private-read spans.
    pub mem_latency: u64,
    /// Instantiate a dedicated read/write port for encrypted memory ops.
    pub rd_wr_port: bool,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            algorithm: EncryptionAlgorithm::default(),
            mem_latency: 20,
            rd_wr_port: false,
        }
    }
}

impl EncryptionConfig {
    #[must_use]
    pub fn enc_dec_latency(&self) -> u64 {
        self.algorithm.latency()
    }

    #[must_use]
    pub fn enc_int_alu_latency(&self) -> u64 {
        self.algorithm.latency() * 2 + 3
    }

    #[must_use]
    pub fn enc_int_mult_latency(&self) -> u64 {
        self.algorithm.latency() * 2 + 5
    }

    #[must_use]
    pub fn enc_rd_wr_latency(&self) -> u64 {
        self.algorithm.latency() * 2 + 1
    }

    /// Latency of a private read over `span` elements: decrypt latency minus
    /// the memory round trip, plus an average extra cycle per element.
    /// Clamped to the one-cycle minimum for fast ciphers.
    #[must_use]
    pub fn span_latency(&self, span: u64) -> u64 {
        let latency =
            self.algorithm.latency() as i64 - self.mem_latency as i64 + span as i64 - 1;
        latency.max(1) as u64
    }
}

/// All operation classes served by the SIMD unit.
pub const SIMD_OP_CLASSES: [&str; 28] = [
    class::SIMD_ADD,
    class::SIMD_ADD_ACC,
    class::SIMD_ALU,
    class::SIMD_CMP,
    class::SIMD_CVT,
    class::SIMD_MISC,
    class::SIMD_MULT,
    class::SIMD_MULT_ACC,
    class::SIMD_MAT_MULT_ACC,
    class::SIMD_SHIFT,
    class::SIMD_SHIFT_ACC,
    class::SIMD_DIV,
    class::SIMD_SQRT,
    class::SIMD_FLOAT_ADD,
    class::SIMD_FLOAT_ALU,
    class::SIMD_FLOAT_CMP,
    class::SIMD_FLOAT_CVT,
    class::SIMD_FLOAT_DIV,
    class::SIMD_FLOAT_MISC,
    class::SIMD_FLOAT_MULT,
    class::SIMD_FLOAT_MULT_ACC,
    class::SIMD_FLOAT_MAT_MULT_ACC,
    class::SIMD_FLOAT_SQRT,
    class::SIMD_REDUCE_ADD,
    class::SIMD_REDUCE_ALU,
    class::SIMD_REDUCE_CMP,
    class::SIMD_FLOAT_REDUCE_ADD,
    class::SIMD_FLOAT_REDUCE_CMP,
];

/// The full machine description.
#[must_use]
pub fn machine(enc: &EncryptionConfig) -> Machine {
    let mut units = vec![
        FuDesc::new(
            "EncDec",
            [OpDesc::new(class::ENC_DEC).latency(enc.enc_dec_latency())],
            1,
        ),
        FuDesc::new(
            "EncIntAlu",
            [OpDesc::new(class::ENC_INT_ALU).latency(enc.enc_int_alu_latency())],
            1,
        ),
        FuDesc::new(
            "EncIntMult",
            [OpDesc::new(class::ENC_INT_MULT).latency(enc.enc_int_mult_latency())],
            1,
        ),
        FuDesc::new(
            "EncMem",
            [OpDesc::new(class::ENC_MEM).latency(enc.span_latency(span::MIN_SPAN))],
            1,
        ),
        FuDesc::new("IntALU", [OpDesc::new(class::INT_ALU)], 6),
        FuDesc::new(
            "IntMultDiv",
            [
                OpDesc::new(class::INT_MULT).latency(3),
                OpDesc::new(class::INT_DIV).latency(20).non_pipelined(),
            ],
            2,
        ),
        FuDesc::new(
            "FP_ALU",
            [
                OpDesc::new(class::FLOAT_ADD).latency(2),
                OpDesc::new(class::FLOAT_CMP).latency(2),
                OpDesc::new(class::FLOAT_CVT).latency(2),
            ],
            4,
        ),
        FuDesc::new(
            "FP_MultDiv",
            [
                OpDesc::new(class::FLOAT_MULT).latency(4),
                OpDesc::new(class::FLOAT_MULT_ACC).latency(5),
                OpDesc::new(class::FLOAT_MISC).latency(3),
                OpDesc::new(class::FLOAT_DIV).latency(12).non_pipelined(),
                OpDesc::new(class::FLOAT_SQRT).latency(24).non_pipelined(),
            ],
            2,
        ),
        FuDesc::new(
            "SIMD_Unit",
            SIMD_OP_CLASSES.iter().map(|&class| OpDesc::new(class)),
            4,
        ),
        FuDesc::new("PredALU", [OpDesc::new(class::SIMD_PRED_ALU)], 1),
        FuDesc::new(
            "ReadPort",
            [
                OpDesc::new(class::MEM_READ),
                OpDesc::new(class::FLOAT_MEM_READ),
            ],
            0,
        ),
        FuDesc::new(
            "WritePort",
            [
                OpDesc::new(class::MEM_WRITE),
                OpDesc::new(class::FLOAT_MEM_WRITE),
            ],
            0,
        ),
        FuDesc::new(
            "RdWrPort",
            [
                OpDesc::new(class::MEM_READ),
                OpDesc::new(class::MEM_WRITE),
                OpDesc::new(class::FLOAT_MEM_READ),
                OpDesc::new(class::FLOAT_MEM_WRITE),
            ],
            4,
        ),
        FuDesc::new(
            "IprPort",
            [OpDesc::new(class::IPR_ACCESS).latency(3).non_pipelined()],
            1,
        ),
    ];
    if enc.rd_wr_port {
        units.push(FuDesc::new(
            "EncRdWrPort",
            [OpDesc::new(class::ENC_MEM).latency(enc.enc_rd_wr_latency())],
            1,
        ));
    }
    Machine { functional_units: units }
}

#[cfg(test)]
mod tests {
    use super::{machine, span, EncryptionAlgorithm, EncryptionConfig};
    use color_eyre::eyre;
    use strum::IntoEnumIterator;

    #[test]
    fn derived_latencies_for_aes() {
        let enc = EncryptionConfig::default();
        assert_eq!(enc.enc_dec_latency(), 40);
        assert_eq!(enc.enc_int_alu_latency(), 83);
        assert_eq!(enc.enc_int_mult_latency(), 85);
        assert_eq!(enc.enc_rd_wr_latency(), 81);
        assert_eq!(enc.span_latency(span::MIN_SPAN), 119);
        assert_eq!(enc.span_latency(span::BOYER_MOORE), 419);
        assert_eq!(enc.span_latency(span::KNAPSACK), 270);
        assert_eq!(enc.span_latency(span::FLOOD_FILL), 119);
    }

    #[test]
    fn span_latency_stays_positive_for_fast_ciphers() {
        let enc = EncryptionConfig {
            algorithm: EncryptionAlgorithm::Qarma11,
            mem_latency: 200,
            ..EncryptionConfig::default()
        };
        // 12 - 200 + 100 - 1 would go negative
        assert_eq!(enc.span_latency(span::MIN_SPAN), 1);
    }

    #[test]
    fn every_cipher_builds_a_valid_machine() -> eyre::Result<()> {
        for algorithm in EncryptionAlgorithm::iter() {
            let enc = EncryptionConfig {
                algorithm,
                ..EncryptionConfig::default()
            };
            machine(&enc).validate()?;
        }
        Ok(())
    }

    #[test]
    fn default_machine_matches_the_table() -> eyre::Result<()> {
        let machine = machine(&EncryptionConfig::default());
        machine.validate()?;

        let by_name = |name: &str| {
            machine
                .functional_units
                .iter()
                .find(|fu| fu.name == name)
                .unwrap()
        };
        assert_eq!(by_name("IntALU").count, 6);
        assert_eq!(by_name("SIMD_Unit").ops.len(), 28);
        assert_eq!(by_name("ReadPort").count, 0);
        assert_eq!(by_name("WritePort").count, 0);
        assert_eq!(by_name("RdWrPort").count, 4);
        assert_eq!(by_name("IprPort").ops[0].latency, 3);
        assert!(!by_name("IprPort").ops[0].pipelined);
        assert_eq!(by_name("EncDec").ops[0].latency, 40);

        // the dedicated encrypted port only exists when enabled
        assert!(machine
            .functional_units
            .iter()
            .all(|fu| fu.name != "EncRdWrPort"));
        let enc = EncryptionConfig {
            rd_wr_port: true,
            ..EncryptionConfig::default()
        };
        let with_port = super::machine(&enc);
        assert_eq!(with_port.functional_units.last().unwrap().name, "EncRdWrPort");
        assert_eq!(with_port.functional_units.last().unwrap().ops[0].latency, 81);
        Ok(())
    }
}
