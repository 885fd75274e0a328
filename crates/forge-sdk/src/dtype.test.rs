#![cfg(test)]

use super::Dtype;

#[test]
fn display_round_trips_through_from_str() {
    for dtype in [Dtype::F16, Dtype::F64, Dtype::Q5_1, Dtype::Q8_K, Dtype::I64] {
        assert_eq!(dtype.to_string().parse::<Dtype>(), Ok(dtype));
    }
}

#[test]
fn plain_float_and_quantized_are_disjoint() {
    assert!(Dtype::F32.is_plain_float());
    assert!(!Dtype::F32.is_quantized());
    assert!(Dtype::Q8_0.is_quantized());
    assert!(!Dtype::Q8_0.is_plain_float());
    assert!(!Dtype::BF16.is_plain_float());
    assert_eq!(Dtype::Q8_0.size_bytes(), None);
    assert_eq!(Dtype::F64.size_bytes(), Some(8));
}
