use serde::{Deserialize, Serialize};

/// An operation class tag.
///
/// Capability matching is exact string equality against the tags declared in
/// the machine description. Tags unknown to this crate are accepted verbatim,
/// both in descriptions and in issue requests.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationClass(String);

impl OperationClass {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OperationClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for OperationClass {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OperationClass {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

impl From<String> for OperationClass {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

impl PartialEq<str> for OperationClass {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for OperationClass {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Well-known operation class tags.
pub mod class {
    pub const INT_ALU: &str = "IntAlu";
    pub const INT_MULT: &str = "IntMult";
    pub const INT_DIV: &str = "IntDiv";

    pub const FLOAT_ADD: &str = "FloatAdd";
    pub const FLOAT_CMP: &str = "FloatCmp";
    pub const FLOAT_CVT: &str = "FloatCvt";
    pub const FLOAT_MULT: &str = "FloatMult";
    pub const FLOAT_MULT_ACC: &str = "FloatMultAcc";
    pub const FLOAT_MISC: &str = "FloatMisc";
    pub const FLOAT_DIV: &str = "FloatDiv";
    pub const FLOAT_SQRT: &str = "FloatSqrt";

    pub const SIMD_ADD: &str = "SimdAdd";
    pub const SIMD_ADD_ACC: &str = "SimdAddAcc";
    pub const SIMD_ALU: &str = "SimdAlu";
    pub const SIMD_CMP: &str = "SimdCmp";
    pub const SIMD_CVT: &str = "SimdCvt";
    pub const SIMD_MISC: &str = "SimdMisc";
    pub const SIMD_MULT: &str = "SimdMult";
    pub const SIMD_MULT_ACC: &str = "SimdMultAcc";
    pub const SIMD_MAT_MULT_ACC: &str = "SimdMatMultAcc";
    pub const SIMD_SHIFT: &str = "SimdShift";
    pub const SIMD_SHIFT_ACC: &str = "SimdShiftAcc";
    pub const SIMD_DIV: &str = "SimdDiv";
    pub const SIMD_SQRT: &str = "SimdSqrt";
    pub const SIMD_FLOAT_ADD: &str = "SimdFloatAdd";
    pub const SIMD_FLOAT_ALU: &str = "SimdFloatAlu";
    pub const SIMD_FLOAT_CMP: &str = "SimdFloatCmp";
    pub const SIMD_FLOAT_CVT: &str = "SimdFloatCvt";
    pub const SIMD_FLOAT_DIV: &str = "SimdFloatDiv";
    pub const SIMD_FLOAT_MISC: &str = "SimdFloatMisc";
    pub const SIMD_FLOAT_MULT: &str = "SimdFloatMult";
    pub const SIMD_FLOAT_MULT_ACC: &str = "SimdFloatMultAcc";
    pub const SIMD_FLOAT_MAT_MULT_ACC: &str = "SimdFloatMatMultAcc";
    pub const SIMD_FLOAT_SQRT: &str = "SimdFloatSqrt";
    pub const SIMD_REDUCE_ADD: &str = "SimdReduceAdd";
    pub const SIMD_REDUCE_ALU: &str = "SimdReduceAlu";
    pub const SIMD_REDUCE_CMP: &str = "SimdReduceCmp";
    pub const SIMD_FLOAT_REDUCE_ADD: &str = "SimdFloatReduceAdd";
    pub const SIMD_FLOAT_REDUCE_CMP: &str = "SimdFloatReduceCmp";
    pub const SIMD_PRED_ALU: &str = "SimdPredAlu";

    pub const MEM_READ: &str = "MemRead";
    pub const MEM_WRITE: &str = "MemWrite";
    pub const FLOAT_MEM_READ: &str = "FloatMemRead";
    pub const FLOAT_MEM_WRITE: &str = "FloatMemWrite";

    pub const IPR_ACCESS: &str = "IprAccess";

    pub const ENC_DEC: &str = "EncDec";
    pub const ENC_INT_ALU: &str = "EncIntAlu";
    pub const ENC_INT_MULT: &str = "EncIntMult";
    pub const ENC_MEM: &str = "EncMem";
}
