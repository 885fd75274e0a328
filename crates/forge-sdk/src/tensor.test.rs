#![cfg(test)]

use half::f16;

use super::*;
use crate::quant::{Q8_0Layout, layout_for_dtype};

#[test]
fn primitive_view_is_zero_copy() {
    let buffer = TensorBuffer::from_pod(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let tensor = PrimitiveTensor::new("t", vec![2, 3], Dtype::F32, buffer.clone()).unwrap();

    let values = tensor.as_slice::<f32>().unwrap();
    assert_eq!(values, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(values.as_ptr() as *const u8, buffer.as_bytes().as_ptr());
    assert!(tensor.buffer().shares_storage_with(&buffer));
}

#[test]
fn primitive_rejects_wrong_byte_length() {
    let err = PrimitiveTensor::new("t", vec![4], Dtype::F32, TensorBuffer::from_bytes(&[0; 15])).unwrap_err();
    assert!(matches!(err, TensorError::SizeMismatch { expected: 16, actual: 15, .. }), "{err}");
}

#[test]
fn primitive_rejects_quantized_dtype_and_empty_dims() {
    let buffer = TensorBuffer::from_bytes(&[0; 34]);
    assert!(matches!(
        PrimitiveTensor::new("t", vec![32], Dtype::Q8_0, buffer).unwrap_err(),
        TensorError::NotPlain(Dtype::Q8_0)
    ));
    assert!(matches!(
        PrimitiveTensor::new("t", vec![0, 4], Dtype::F32, TensorBuffer::from_bytes(&[])).unwrap_err(),
        TensorError::InvalidShape { .. }
    ));
}

#[test]
fn as_slice_checks_requested_dtype() {
    let tensor = PrimitiveTensor::from_values("h", vec![2], &[f16::from_f32(0.5), f16::from_f32(-1.0)]).unwrap();
    assert!(matches!(
        tensor.as_slice::<f32>().unwrap_err(),
        TensorError::DtypeMismatch {
            requested: Dtype::F32,
            actual: Dtype::F16
        }
    ));
    assert_eq!(tensor.as_slice::<f16>().unwrap()[1], f16::from_f32(-1.0));
    assert_eq!(tensor.to_f32_vec(), vec![0.5, -1.0]);
}

#[test]
fn misaligned_view_is_reported_but_still_widens() {
    let mut bytes = vec![0u8];
    bytes.extend_from_slice(bytemuck::cast_slice(&[1.5f64, -2.5]));
    let view = TensorBuffer::from_bytes(&bytes).slice(1..17).unwrap();
    let tensor = PrimitiveTensor::new("d", vec![2], Dtype::F64, view).unwrap();

    assert!(matches!(tensor.as_slice::<f64>().unwrap_err(), TensorError::Misaligned { dtype: Dtype::F64 }));
    assert_eq!(tensor.to_f32_vec(), vec![1.5, -2.5]);
}

#[test]
fn quantized_tensor_keeps_blocks_until_asked() {
    let values: Vec<f32> = (0..64).map(|i| i as f32 / 8.0).collect();
    let raw = Q8_0Layout.quantize(&values).unwrap();
    let tensor = QuantizedTensor::new("q", vec![2, 32], &Q8_0Layout, TensorBuffer::from_bytes(&raw)).unwrap();

    assert_eq!(tensor.dtype(), Dtype::Q8_0);
    assert_eq!(tensor.block_count(), 2);
    assert_eq!(tensor.raw(), raw.as_slice());
    assert_eq!(tensor.element_count(), 64);

    let decoded = tensor.dequantize().unwrap();
    assert_eq!(decoded.len(), 64);
    assert!((decoded[63] - 7.875).abs() < 0.05);
}

#[test]
fn quantized_tensor_rejects_short_buffer() {
    let err = QuantizedTensor::for_dtype("q", vec![64], Dtype::Q4_0, TensorBuffer::from_bytes(&[0; 35])).unwrap_err();
    assert!(matches!(err, TensorError::MalformedLayout { layout: "Q4_0", .. }), "{err}");
    assert!(matches!(
        QuantizedTensor::for_dtype("q", vec![256], Dtype::Q6_K, TensorBuffer::from_bytes(&[0; 210])).unwrap_err(),
        TensorError::NoLayout(Dtype::Q6_K)
    ));
}

#[test]
fn inference_tensor_forwards_to_variant() {
    let plain: InferenceTensor = PrimitiveTensor::from_values("p", vec![3], &[1.0f64, 2.0, 3.0]).unwrap().into();
    assert_eq!(plain.name(), "p");
    assert_eq!(plain.dtype(), Dtype::F64);
    assert_eq!(plain.byte_len(), 24);
    assert!(plain.as_quantized().is_none());

    let layout = layout_for_dtype(Dtype::Q8_0).unwrap();
    let quant: InferenceTensor = QuantizedTensor::new("q", vec![32], layout, TensorBuffer::from_bytes(&[0; 34])).unwrap().into();
    assert!(quant.is_quantized());
    assert_eq!(quant.shape(), &[32]);
    assert_eq!(quant.to_f32_vec().unwrap(), vec![0.0; 32]);
}
