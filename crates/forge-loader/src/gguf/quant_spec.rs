use forge_sdk::quant::{
    IQ1_M_SPEC, IQ1_S_SPEC, IQ2_S_SPEC, IQ2_XS_SPEC, IQ2_XXS_SPEC, IQ3_S_SPEC, IQ3_XXS_SPEC, IQ4_NL_SPEC, IQ4_XS_SPEC, MXFP4_SPEC,
    Q2_K_SPEC, Q3_K_SPEC, Q4_0_SPEC, Q4_1_SPEC, Q4_K_SPEC, Q5_0_SPEC, Q5_1_SPEC, Q5_K_SPEC, Q6_K_SPEC, Q8_0_SPEC, Q8_1_SPEC,
    Q8_K_SPEC, QuantBlockSpec, TQ1_0_SPEC, TQ2_0_SPEC,
};

use super::GGUFDataType;

/// How a tensor type is stored, which decides the size of its byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GGUFDtypeClass {
    Scalar { element_size_bytes: usize },
    BlockQuant(QuantBlockSpec),
    Deprecated { replacement_hint: &'static str },
    Unsupported { reason: &'static str },
}

const LEGACY_Q4: &str = "Removed ggml type id (Q4_2/Q4_3); re-export the model with a current quantizer";
const TILED_Q4_0: &str = "Runtime-repacked Q4_0 layout; archives should store plain Q4_0";
const TILED_IQ4_NL: &str = "Runtime-repacked IQ4_NL layout; archives should store plain IQ4_NL";

pub fn classify_gguf_dtype(dtype: GGUFDataType) -> GGUFDtypeClass {
    use GGUFDataType as T;
    use GGUFDtypeClass::{BlockQuant, Deprecated, Scalar};

    match dtype {
        T::F64 | T::I64 => Scalar { element_size_bytes: 8 },
        T::F32 | T::I32 => Scalar { element_size_bytes: 4 },
        T::F16 | T::BF16 | T::I16 => Scalar { element_size_bytes: 2 },
        T::I8 => Scalar { element_size_bytes: 1 },
        T::Q4_0 => BlockQuant(Q4_0_SPEC),
        T::Q4_1 => BlockQuant(Q4_1_SPEC),
        T::Q5_0 => BlockQuant(Q5_0_SPEC),
        T::Q5_1 => BlockQuant(Q5_1_SPEC),
        T::Q8_0 => BlockQuant(Q8_0_SPEC),
        T::Q8_1 => BlockQuant(Q8_1_SPEC),
        T::Q2_K => BlockQuant(Q2_K_SPEC),
        T::Q3_K => BlockQuant(Q3_K_SPEC),
        T::Q4_K => BlockQuant(Q4_K_SPEC),
        T::Q5_K => BlockQuant(Q5_K_SPEC),
        T::Q6_K => BlockQuant(Q6_K_SPEC),
        T::Q8_K => BlockQuant(Q8_K_SPEC),
        T::IQ2_XXS => BlockQuant(IQ2_XXS_SPEC),
        T::IQ2_XS => BlockQuant(IQ2_XS_SPEC),
        T::IQ3_XXS => BlockQuant(IQ3_XXS_SPEC),
        T::IQ1_S => BlockQuant(IQ1_S_SPEC),
        T::IQ4_NL => BlockQuant(IQ4_NL_SPEC),
        T::IQ3_S => BlockQuant(IQ3_S_SPEC),
        T::IQ2_S => BlockQuant(IQ2_S_SPEC),
        T::IQ4_XS => BlockQuant(IQ4_XS_SPEC),
        T::IQ1_M => BlockQuant(IQ1_M_SPEC),
        T::TQ1_0 => BlockQuant(TQ1_0_SPEC),
        T::TQ2_0 => BlockQuant(TQ2_0_SPEC),
        T::MXFP4 => BlockQuant(MXFP4_SPEC),
        T::Q4_2 | T::Q4_3 => Deprecated {
            replacement_hint: LEGACY_Q4,
        },
        T::Q4_0_4_4 | T::Q4_0_4_8 | T::Q4_0_8_8 => Deprecated {
            replacement_hint: TILED_Q4_0,
        },
        T::IQ4_NL_4_4 | T::IQ4_NL_4_8 | T::IQ4_NL_8_8 => Deprecated {
            replacement_hint: TILED_IQ4_NL,
        },
        T::Unknown(_) => GGUFDtypeClass::Unsupported {
            reason: "type id is not known to this reader",
        },
    }
}

/// Bytes a tensor of `dtype` and `dims` occupies, `None` when the type is
/// unsized or the element count is not a whole number of blocks.
pub fn tensor_storage_bytes_for_gguf_dtype(dtype: GGUFDataType, dims: &[u64]) -> Option<usize> {
    let elements = dims.iter().try_fold(1u64, |acc, &d| acc.checked_mul(d))?;
    let bytes = match classify_gguf_dtype(dtype) {
        GGUFDtypeClass::Scalar { element_size_bytes } => elements.checked_mul(element_size_bytes as u64)?,
        GGUFDtypeClass::BlockQuant(spec) => {
            if elements % spec.weights_per_block as u64 != 0 {
                return None;
            }
            (elements / spec.weights_per_block as u64).checked_mul(spec.block_bytes as u64)?
        }
        GGUFDtypeClass::Deprecated { .. } | GGUFDtypeClass::Unsupported { .. } => return None,
    };
    usize::try_from(bytes).ok()
}

#[path = "quant_spec.test.rs"]
mod tests;
