use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// Element encodings understood by the tensor layer.
///
/// Plain floating-point types are addressed element by element; the `Q*`
/// types are packed blocks described by a [`crate::quant::BlockLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum Dtype {
    F16,
    F32,
    F64,
    BF16,
    I8,
    I16,
    I32,
    I64,
    Q4_0,
    Q4_1,
    Q5_0,
    Q5_1,
    Q8_0,
    Q8_1,
    Q2_K,
    Q3_K,
    Q4_K,
    Q5_K,
    Q6_K,
    Q8_K,
}

impl Dtype {
    /// Bytes per element for non-block types. Block types return `None`;
    /// use their [`crate::quant::QuantBlockSpec`] instead.
    pub fn size_bytes(&self) -> Option<usize> {
        match self {
            Dtype::F64 | Dtype::I64 => Some(8),
            Dtype::F32 | Dtype::I32 => Some(4),
            Dtype::F16 | Dtype::BF16 | Dtype::I16 => Some(2),
            Dtype::I8 => Some(1),
            _ => None,
        }
    }

    pub fn is_quantized(&self) -> bool {
        matches!(
            self,
            Dtype::Q4_0
                | Dtype::Q4_1
                | Dtype::Q5_0
                | Dtype::Q5_1
                | Dtype::Q8_0
                | Dtype::Q8_1
                | Dtype::Q2_K
                | Dtype::Q3_K
                | Dtype::Q4_K
                | Dtype::Q5_K
                | Dtype::Q6_K
                | Dtype::Q8_K
        )
    }

    /// Dense IEEE float types that bind to a [`crate::PrimitiveTensor`].
    pub fn is_plain_float(&self) -> bool {
        matches!(self, Dtype::F16 | Dtype::F32 | Dtype::F64)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Dtype::F16 => "F16",
            Dtype::F32 => "F32",
            Dtype::F64 => "F64",
            Dtype::BF16 => "BF16",
            Dtype::I8 => "I8",
            Dtype::I16 => "I16",
            Dtype::I32 => "I32",
            Dtype::I64 => "I64",
            Dtype::Q4_0 => "Q4_0",
            Dtype::Q4_1 => "Q4_1",
            Dtype::Q5_0 => "Q5_0",
            Dtype::Q5_1 => "Q5_1",
            Dtype::Q8_0 => "Q8_0",
            Dtype::Q8_1 => "Q8_1",
            Dtype::Q2_K => "Q2_K",
            Dtype::Q3_K => "Q3_K",
            Dtype::Q4_K => "Q4_K",
            Dtype::Q5_K => "Q5_K",
            Dtype::Q6_K => "Q6_K",
            Dtype::Q8_K => "Q8_K",
        }
    }
}

impl Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dtype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "F16" => Ok(Dtype::F16),
            "F32" => Ok(Dtype::F32),
            "F64" => Ok(Dtype::F64),
            "BF16" => Ok(Dtype::BF16),
            "I8" => Ok(Dtype::I8),
            "I16" => Ok(Dtype::I16),
            "I32" => Ok(Dtype::I32),
            "I64" => Ok(Dtype::I64),
            "Q4_0" => Ok(Dtype::Q4_0),
            "Q4_1" => Ok(Dtype::Q4_1),
            "Q5_0" => Ok(Dtype::Q5_0),
            "Q5_1" => Ok(Dtype::Q5_1),
            "Q8_0" => Ok(Dtype::Q8_0),
            "Q8_1" => Ok(Dtype::Q8_1),
            "Q2_K" => Ok(Dtype::Q2_K),
            "Q3_K" => Ok(Dtype::Q3_K),
            "Q4_K" => Ok(Dtype::Q4_K),
            "Q5_K" => Ok(Dtype::Q5_K),
            "Q6_K" => Ok(Dtype::Q6_K),
            "Q8_K" => Ok(Dtype::Q8_K),
            _ => Err(format!("Unknown Dtype: {s}")),
        }
    }
}

#[path = "dtype.test.rs"]
mod tests;
