//! Block-quantized storage layouts.
//!
//! A layout knows the byte structure of one block, how many weights it packs,
//! and how to turn a block back into `f32` values. Tensors keep the raw blocks
//! and only dequantize when asked.

mod q4;
mod q5;
mod q8;

use std::fmt::Debug;

pub use q4::{Q4_0Layout, Q4_1Layout};
pub use q5::{Q5_0Layout, Q5_1Layout};
pub use q8::{Q8_0Layout, Q8_1Layout};

use crate::{Dtype, TensorError, tensor::element_count};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantBlockSpec {
    pub weights_per_block: usize,
    pub block_bytes: usize,
}

impl QuantBlockSpec {
    pub const fn new(weights_per_block: usize, block_bytes: usize) -> Self {
        Self {
            weights_per_block,
            block_bytes,
        }
    }

    /// Bytes needed for `elements` weights, or `None` when the count is not a
    /// whole number of blocks.
    pub fn storage_bytes(&self, elements: usize) -> Option<usize> {
        if elements % self.weights_per_block != 0 {
            return None;
        }
        (elements / self.weights_per_block).checked_mul(self.block_bytes)
    }
}

pub const GGML_QK_K: usize = 256;

pub const Q4_0_SPEC: QuantBlockSpec = QuantBlockSpec::new(32, 2 + 16);
pub const Q4_1_SPEC: QuantBlockSpec = QuantBlockSpec::new(32, 2 + 2 + 16);
pub const Q5_0_SPEC: QuantBlockSpec = QuantBlockSpec::new(32, 2 + 4 + 16);
pub const Q5_1_SPEC: QuantBlockSpec = QuantBlockSpec::new(32, 2 + 2 + 4 + 16);
pub const Q8_0_SPEC: QuantBlockSpec = QuantBlockSpec::new(32, 2 + 32);
pub const Q8_1_SPEC: QuantBlockSpec = QuantBlockSpec::new(32, 2 + 2 + 32);
pub const Q2_K_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + 2 + GGML_QK_K / 16 + GGML_QK_K / 4);
pub const Q3_K_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + GGML_QK_K / 4 + GGML_QK_K / 8 + 12);
pub const Q4_K_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + 2 + GGML_QK_K / 2 + 12);
pub const Q5_K_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + 2 + GGML_QK_K / 2 + GGML_QK_K / 8 + 12);
pub const Q6_K_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + GGML_QK_K / 2 + GGML_QK_K / 4 + GGML_QK_K / 16);
pub const Q8_K_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 4 + GGML_QK_K + GGML_QK_K / 8);
pub const IQ2_XXS_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + GGML_QK_K / 4);
pub const IQ2_XS_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + GGML_QK_K / 4 + GGML_QK_K / 32);
pub const IQ3_XXS_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + 3 * GGML_QK_K / 8);
pub const IQ1_S_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + GGML_QK_K / 8 + GGML_QK_K / 16);
pub const IQ4_NL_SPEC: QuantBlockSpec = QuantBlockSpec::new(32, 2 + 16);
pub const IQ3_S_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + GGML_QK_K / 4 + GGML_QK_K / 32 + GGML_QK_K / 8 + GGML_QK_K / 64);
pub const IQ2_S_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + GGML_QK_K / 4 + GGML_QK_K / 16);
pub const IQ4_XS_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + 2 + GGML_QK_K / 64 + GGML_QK_K / 2);
pub const IQ1_M_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, GGML_QK_K / 8 + GGML_QK_K / 16 + GGML_QK_K / 32);
pub const TQ1_0_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + 4 * 13);
pub const TQ2_0_SPEC: QuantBlockSpec = QuantBlockSpec::new(GGML_QK_K, 2 + GGML_QK_K / 4);
pub const MXFP4_SPEC: QuantBlockSpec = QuantBlockSpec::new(32, 1 + 16);

/// Layouts with a block decoder. K-quants are known for sizing only.
pub fn layout_for_dtype(dtype: Dtype) -> Option<&'static dyn BlockLayout> {
    match dtype {
        Dtype::Q4_0 => Some(&Q4_0Layout),
        Dtype::Q4_1 => Some(&Q4_1Layout),
        Dtype::Q5_0 => Some(&Q5_0Layout),
        Dtype::Q5_1 => Some(&Q5_1Layout),
        Dtype::Q8_0 => Some(&Q8_0Layout),
        Dtype::Q8_1 => Some(&Q8_1Layout),
        _ => None,
    }
}

/// Byte structure of one quantized block family.
///
/// Implementors provide the per-block codec; whole-buffer validation and
/// conversion come for free. `dequantize_block` receives exactly
/// `spec().block_bytes` bytes and an output of `spec().weights_per_block`.
pub trait BlockLayout: Send + Sync + Debug {
    fn dtype(&self) -> Dtype;

    fn spec(&self) -> QuantBlockSpec;

    fn name(&self) -> &'static str {
        self.dtype().as_str()
    }

    fn dequantize_block(&self, block: &[u8], out: &mut [f32]);

    fn quantize_block(&self, _values: &[f32], _block: &mut [u8]) -> Result<(), TensorError> {
        Err(TensorError::UnsupportedOperation {
            layout: self.name(),
            operation: "quantize",
        })
    }

    /// Check that `raw_len` bytes hold exactly the elements of `dims`.
    /// Returns the block count.
    fn validate(&self, raw_len: usize, dims: &[usize]) -> Result<usize, TensorError> {
        let spec = self.spec();
        let elements = element_count(dims).ok_or_else(|| TensorError::MalformedLayout {
            layout: self.name(),
            reason: format!("shape {dims:?} overflows usize"),
        })?;
        if raw_len % spec.block_bytes != 0 {
            return Err(TensorError::MalformedLayout {
                layout: self.name(),
                reason: format!("{raw_len} bytes is not a whole number of {}-byte blocks", spec.block_bytes),
            });
        }
        let blocks = raw_len / spec.block_bytes;
        if blocks.checked_mul(spec.weights_per_block) != Some(elements) {
            return Err(TensorError::MalformedLayout {
                layout: self.name(),
                reason: format!(
                    "{blocks} blocks of {} weights do not cover shape {dims:?} ({elements} elements)",
                    spec.weights_per_block
                ),
            });
        }
        Ok(blocks)
    }

    fn dequantize(&self, raw: &[u8], dims: &[usize]) -> Result<Vec<f32>, TensorError> {
        let spec = self.spec();
        let blocks = self.validate(raw.len(), dims)?;
        let mut out = vec![0.0f32; blocks * spec.weights_per_block];
        for (block, dst) in raw
            .chunks_exact(spec.block_bytes)
            .zip(out.chunks_exact_mut(spec.weights_per_block))
        {
            self.dequantize_block(block, dst);
        }
        Ok(out)
    }

    fn quantize(&self, values: &[f32]) -> Result<Vec<u8>, TensorError> {
        let spec = self.spec();
        if values.len() % spec.weights_per_block != 0 {
            return Err(TensorError::MalformedLayout {
                layout: self.name(),
                reason: format!("{} values is not a whole number of {}-weight blocks", values.len(), spec.weights_per_block),
            });
        }
        let mut out = vec![0u8; values.len() / spec.weights_per_block * spec.block_bytes];
        for (src, block) in values
            .chunks_exact(spec.weights_per_block)
            .zip(out.chunks_exact_mut(spec.block_bytes))
        {
            self.quantize_block(src, block)?;
        }
        Ok(out)
    }
}

#[inline]
pub(crate) fn read_f16(bytes: &[u8], offset: usize) -> f32 {
    half::f16::from_le_bytes([bytes[offset], bytes[offset + 1]]).to_f32()
}

#[inline]
pub(crate) fn write_f16(bytes: &mut [u8], offset: usize, value: f32) {
    bytes[offset..offset + 2].copy_from_slice(&half::f16::from_f32(value).to_le_bytes());
}

#[path = "mod.test.rs"]
mod tests;
