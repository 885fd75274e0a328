#![cfg(test)]

use half::f16;

use super::*;

fn f16_bytes(value: f32) -> [u8; 2] {
    f16::from_f32(value).to_le_bytes()
}

fn ramp(len: usize) -> Vec<f32> {
    (0..len).map(|i| ((i as f32) * 0.37).sin() * 3.0 - 0.25).collect()
}

#[test]
fn block_constants_match_ggml() {
    assert_eq!(Q8_0_SPEC, QuantBlockSpec::new(32, 34));
    assert_eq!(Q8_1_SPEC, QuantBlockSpec::new(32, 36));
    assert_eq!(Q4_0_SPEC.block_bytes, 18);
    assert_eq!(Q4_1_SPEC.block_bytes, 20);
    assert_eq!(Q5_0_SPEC.block_bytes, 22);
    assert_eq!(Q5_1_SPEC.block_bytes, 24);
    assert_eq!(Q6_K_SPEC, QuantBlockSpec::new(256, 210));
    assert_eq!(IQ4_XS_SPEC.block_bytes, 136);
    assert_eq!(TQ1_0_SPEC.block_bytes, 54);
}

#[test]
fn q6_k_storage_size_matches_known_tensor_shape() {
    let elements = 4864 * 896;
    assert_eq!(Q6_K_SPEC.storage_bytes(elements), Some(3_575_040));
    assert_eq!(Q8_0_SPEC.storage_bytes(33), None);
}

#[test]
fn lookup_covers_decodable_layouts_only() {
    for dtype in [Dtype::Q4_0, Dtype::Q4_1, Dtype::Q5_0, Dtype::Q5_1, Dtype::Q8_0, Dtype::Q8_1] {
        let layout = layout_for_dtype(dtype).unwrap();
        assert_eq!(layout.dtype(), dtype);
        assert!(layout.spec().weights_per_block > 0);
    }
    assert!(layout_for_dtype(Dtype::Q6_K).is_none());
    assert!(layout_for_dtype(Dtype::F32).is_none());
}

#[test]
fn q8_0_block_decodes_code_times_scale() {
    let mut block = vec![0u8; 34];
    block[..2].copy_from_slice(&f16_bytes(0.5));
    block[2] = (-4i8) as u8;
    block[3] = 2;
    block[33] = 127;

    let values = Q8_0Layout.dequantize(&block, &[32]).unwrap();
    assert_eq!(values[0], -2.0);
    assert_eq!(values[1], 1.0);
    assert_eq!(values[2], 0.0);
    assert_eq!(values[31], 63.5);
}

#[test]
fn q8_1_ignores_cached_sum() {
    let mut block = vec![0u8; 36];
    block[..2].copy_from_slice(&f16_bytes(0.25));
    block[2..4].copy_from_slice(&f16_bytes(100.0));
    block[4] = 8;
    block[5] = (-8i8) as u8;

    let values = Q8_1Layout.dequantize(&block, &[32]).unwrap();
    assert_eq!(&values[..3], &[2.0, -2.0, 0.0]);
}

#[test]
fn q4_0_low_nibbles_lead_high_nibbles_follow() {
    let mut block = vec![0x88u8; 18];
    block[..2].copy_from_slice(&f16_bytes(1.0));
    block[2] = 0x1F;

    let values = Q4_0Layout.dequantize(&block, &[32]).unwrap();
    assert_eq!(values[0], 7.0);
    assert_eq!(values[16], -7.0);
    assert_eq!(values[1], 0.0);
    assert_eq!(values[17], 0.0);
}

#[test]
fn q4_1_applies_min_offset() {
    let mut block = vec![0u8; 20];
    block[..2].copy_from_slice(&f16_bytes(2.0));
    block[2..4].copy_from_slice(&f16_bytes(-1.0));
    block[4] = 0x32;

    let values = Q4_1Layout.dequantize(&block, &[32]).unwrap();
    assert_eq!(values[0], 3.0);
    assert_eq!(values[16], 5.0);
    assert_eq!(values[1], -1.0);
}

#[test]
fn q5_0_takes_fifth_bit_from_qh() {
    let mut block = vec![0u8; 22];
    block[..2].copy_from_slice(&f16_bytes(1.0));
    block[2..6].copy_from_slice(&(1u32 | (1 << 16)).to_le_bytes());
    block[6] = 0x1F;

    let values = Q5_0Layout.dequantize(&block, &[32]).unwrap();
    assert_eq!(values[0], 15.0);
    assert_eq!(values[16], 1.0);
    assert_eq!(values[1], -16.0);
    assert_eq!(values[17], -16.0);
}

#[test]
fn q5_1_is_unsigned_with_min() {
    let mut block = vec![0u8; 24];
    block[..2].copy_from_slice(&f16_bytes(1.0));
    block[2..4].copy_from_slice(&f16_bytes(0.5));
    block[4..8].copy_from_slice(&(1u32 | (1 << 16)).to_le_bytes());
    block[8] = 0x1F;

    let values = Q5_1Layout.dequantize(&block, &[32]).unwrap();
    assert_eq!(values[0], 31.5);
    assert_eq!(values[16], 17.5);
    assert_eq!(values[1], 0.5);
}

#[test]
fn q8_0_round_trip_stays_within_one_step() {
    let input = ramp(96);
    let raw = Q8_0Layout.quantize(&input).unwrap();
    assert_eq!(raw.len(), 3 * 34);

    let output = Q8_0Layout.dequantize(&raw, &[3, 32]).unwrap();
    for (block_in, block_out) in input.chunks(32).zip(output.chunks(32)) {
        let step = block_in.iter().fold(0.0f32, |m, v| m.max(v.abs())) / 127.0;
        for (a, b) in block_in.iter().zip(block_out) {
            assert!((a - b).abs() <= step, "{a} vs {b} (step {step})");
        }
    }
}

#[test]
fn q4_0_round_trip_stays_within_one_step() {
    let input = ramp(64);
    let raw = Q4_0Layout.quantize(&input).unwrap();
    assert_eq!(raw.len(), 2 * 18);

    let output = Q4_0Layout.dequantize(&raw, &[64]).unwrap();
    for (block_in, block_out) in input.chunks(32).zip(output.chunks(32)) {
        let step = block_in.iter().fold(0.0f32, |m, v| m.max(v.abs())) / 8.0 * 1.01;
        for (a, b) in block_in.iter().zip(block_out) {
            assert!((a - b).abs() <= step, "{a} vs {b} (step {step})");
        }
    }
}

#[test]
fn zero_block_quantizes_to_zeros() {
    let raw = Q8_0Layout.quantize(&[0.0; 32]).unwrap();
    assert!(Q8_0Layout.dequantize(&raw, &[32]).unwrap().iter().all(|v| *v == 0.0));
}

#[test]
fn one_byte_short_is_malformed() {
    let raw = vec![0u8; 2 * 34 - 1];
    let err = Q8_0Layout.validate(raw.len(), &[64]).unwrap_err();
    assert!(matches!(err, TensorError::MalformedLayout { layout: "Q8_0", .. }), "{err}");
}

#[test]
fn block_count_must_cover_shape_exactly() {
    assert_eq!(Q4_0Layout.validate(36, &[2, 32]).unwrap(), 2);
    assert!(Q4_0Layout.validate(36, &[3, 32]).is_err());
    assert!(Q4_0Layout.validate(36, &[40]).is_err());
}

#[test]
fn decode_only_layouts_reject_quantize() {
    let err = Q5_1Layout.quantize(&[0.0; 32]).unwrap_err();
    assert!(matches!(err, TensorError::UnsupportedOperation { layout: "Q5_1", .. }));
    assert!(Q8_0Layout.quantize(&[0.0; 31]).is_err());
}
