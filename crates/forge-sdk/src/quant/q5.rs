use super::{BlockLayout, Q5_0_SPEC, Q5_1_SPEC, QuantBlockSpec, read_f16};
use crate::Dtype;

const HALF: usize = 16;

/// Rebuild the two 5-bit codes stored at nibble byte `j`.
///
/// Bit `j` of `qh` is the fifth bit of weight `j`, bit `j + 16` that of
/// weight `j + 16`.
#[inline]
fn codes(qh: u32, byte: u8, j: usize) -> (u32, u32) {
    let xh0 = ((qh >> j) << 4) & 0x10;
    let xh1 = (qh >> (j + 12)) & 0x10;
    (u32::from(byte & 0x0F) | xh0, u32::from(byte >> 4) | xh1)
}

/// `{ d: f16, qh: u32, qs: [u8; 16] }`, value = `(q - 16) * d`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Q5_0Layout;

impl BlockLayout for Q5_0Layout {
    fn dtype(&self) -> Dtype {
        Dtype::Q5_0
    }

    fn spec(&self) -> QuantBlockSpec {
        Q5_0_SPEC
    }

    fn dequantize_block(&self, block: &[u8], out: &mut [f32]) {
        let d = read_f16(block, 0);
        let qh = u32::from_le_bytes([block[2], block[3], block[4], block[5]]);
        for (j, &byte) in block[6..6 + HALF].iter().enumerate() {
            let (x0, x1) = codes(qh, byte, j);
            out[j] = (x0 as i32 - 16) as f32 * d;
            out[j + HALF] = (x1 as i32 - 16) as f32 * d;
        }
    }
}

/// `{ d: f16, m: f16, qh: u32, qs: [u8; 16] }`, value = `q * d + m`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Q5_1Layout;

impl BlockLayout for Q5_1Layout {
    fn dtype(&self) -> Dtype {
        Dtype::Q5_1
    }

    fn spec(&self) -> QuantBlockSpec {
        Q5_1_SPEC
    }

    fn dequantize_block(&self, block: &[u8], out: &mut [f32]) {
        let d = read_f16(block, 0);
        let m = read_f16(block, 2);
        let qh = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
        for (j, &byte) in block[8..8 + HALF].iter().enumerate() {
            let (x0, x1) = codes(qh, byte, j);
            out[j] = x0 as f32 * d + m;
            out[j + HALF] = x1 as f32 * d + m;
        }
    }
}
