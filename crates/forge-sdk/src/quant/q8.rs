use super::{BlockLayout, Q8_0_SPEC, Q8_1_SPEC, QuantBlockSpec, read_f16, write_f16};
use crate::{Dtype, TensorError};

/// `{ d: f16, qs: [i8; 32] }`, value = `qs[i] * d`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Q8_0Layout;

impl BlockLayout for Q8_0Layout {
    fn dtype(&self) -> Dtype {
        Dtype::Q8_0
    }

    fn spec(&self) -> QuantBlockSpec {
        Q8_0_SPEC
    }

    fn dequantize_block(&self, block: &[u8], out: &mut [f32]) {
        let d = read_f16(block, 0);
        for (dst, &q) in out.iter_mut().zip(&block[2..]) {
            *dst = f32::from(q as i8) * d;
        }
    }

    fn quantize_block(&self, values: &[f32], block: &mut [u8]) -> Result<(), TensorError> {
        let amax = values.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
        let d = amax / 127.0;
        let id = if d != 0.0 { 1.0 / d } else { 0.0 };

        write_f16(block, 0, d);
        for (dst, &v) in block[2..].iter_mut().zip(values) {
            *dst = (v * id).round() as i8 as u8;
        }
        Ok(())
    }
}

/// `{ d: f16, s: f16, qs: [i8; 32] }`, value = `qs[i] * d`.
///
/// `s` caches `d * sum(qs)` for dot products and plays no part in decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Q8_1Layout;

impl BlockLayout for Q8_1Layout {
    fn dtype(&self) -> Dtype {
        Dtype::Q8_1
    }

    fn spec(&self) -> QuantBlockSpec {
        Q8_1_SPEC
    }

    fn dequantize_block(&self, block: &[u8], out: &mut [f32]) {
        let d = read_f16(block, 0);
        for (dst, &q) in out.iter_mut().zip(&block[4..]) {
            *dst = f32::from(q as i8) * d;
        }
    }
}
