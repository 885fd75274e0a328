use super::{BlockLayout, Q4_0_SPEC, Q4_1_SPEC, QuantBlockSpec, read_f16, write_f16};
use crate::{Dtype, TensorError};

const HALF: usize = 16;

/// `{ d: f16, qs: [u8; 16] }`. Low nibbles hold weights 0..16, high nibbles
/// weights 16..32; value = `(q - 8) * d`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Q4_0Layout;

impl BlockLayout for Q4_0Layout {
    fn dtype(&self) -> Dtype {
        Dtype::Q4_0
    }

    fn spec(&self) -> QuantBlockSpec {
        Q4_0_SPEC
    }

    fn dequantize_block(&self, block: &[u8], out: &mut [f32]) {
        let d = read_f16(block, 0);
        let qs = &block[2..2 + HALF];
        for (j, &byte) in qs.iter().enumerate() {
            out[j] = (i32::from(byte & 0x0F) - 8) as f32 * d;
            out[j + HALF] = (i32::from(byte >> 4) - 8) as f32 * d;
        }
    }

    fn quantize_block(&self, values: &[f32], block: &mut [u8]) -> Result<(), TensorError> {
        // The signed extreme maps to code 0 so the full -8..=7 range is used.
        let mut amax = 0.0f32;
        let mut max = 0.0f32;
        for &v in values {
            if v.abs() > amax {
                amax = v.abs();
                max = v;
            }
        }
        let d = max / -8.0;
        let id = if d != 0.0 { 1.0 / d } else { 0.0 };

        write_f16(block, 0, d);
        for j in 0..HALF {
            let lo = ((values[j] * id + 8.5) as u8).min(15);
            let hi = ((values[j + HALF] * id + 8.5) as u8).min(15);
            block[2 + j] = lo | (hi << 4);
        }
        Ok(())
    }
}

/// `{ d: f16, m: f16, qs: [u8; 16] }`, value = `q * d + m`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Q4_1Layout;

impl BlockLayout for Q4_1Layout {
    fn dtype(&self) -> Dtype {
        Dtype::Q4_1
    }

    fn spec(&self) -> QuantBlockSpec {
        Q4_1_SPEC
    }

    fn dequantize_block(&self, block: &[u8], out: &mut [f32]) {
        let d = read_f16(block, 0);
        let m = read_f16(block, 2);
        let qs = &block[4..4 + HALF];
        for (j, &byte) in qs.iter().enumerate() {
            out[j] = f32::from(byte & 0x0F) * d + m;
            out[j + HALF] = f32::from(byte >> 4) * d + m;
        }
    }
}
