#![cfg(test)]

use half::{bf16, f16};

use super::*;

fn record(name: &str, dims: Vec<u64>, data_type: GGUFDataType, len: usize) -> GGUFTensorInfo {
    GGUFTensorInfo {
        name: name.into(),
        dimensions: dims,
        data_type,
        offset: 0,
        byte_range: Some(0..len),
    }
}

#[test]
fn f32_record_binds_with_reversed_shape_over_shared_bytes() {
    let archive = TensorBuffer::from_pod(&[0.5f32; 24]);
    let tensor = TensorBinder::with_defaults()
        .bind(&record("t", vec![2, 3, 4], GGUFDataType::F32, 96), &archive)
        .unwrap();

    assert_eq!(tensor.shape(), &[4, 3, 2]);
    assert_eq!(tensor.dtype(), Dtype::F32);
    assert!(tensor.buffer().shares_storage_with(&archive));
    assert_eq!(tensor.as_primitive().unwrap().as_slice::<f32>().unwrap()[23], 0.5);
}

#[test]
fn f16_and_q8_0_records_bind_by_default() {
    let binder = TensorBinder::with_defaults();
    let half = TensorBuffer::from_pod(&[f16::ONE; 4]);
    assert_eq!(binder.bind(&record("h", vec![4], GGUFDataType::F16, 8), &half).unwrap().dtype(), Dtype::F16);

    let blocks = TensorBuffer::from_bytes(&[0; 68]);
    let quant = binder.bind(&record("q", vec![32, 2], GGUFDataType::Q8_0, 68), &blocks).unwrap();
    assert_eq!(quant.as_quantized().unwrap().block_count(), 2);
    assert_eq!(quant.shape(), &[2, 32]);
}

#[test]
fn unregistered_type_names_tensor_and_tag() {
    let archive = TensorBuffer::from_bytes(&[0; 136]);
    let err = TensorBinder::with_defaults()
        .bind(&record("w", vec![256], GGUFDataType::IQ4_XS, 136), &archive)
        .unwrap_err();

    let message = err.to_string();
    assert!(matches!(&err, GGUFError::UnsupportedType { tensor, tag } if tensor == "w" && tag == "IQ4_XS"));
    assert!(message.contains("'w'") && message.contains("IQ4_XS"), "{message}");

    let unknown = record("w", vec![4], GGUFDataType::Unknown(77), 0);
    let err = TensorBinder::with_defaults().bind(&unknown, &archive).unwrap_err();
    assert!(err.to_string().contains("UNKNOWN(77)"), "{err}");
}

#[test]
fn registered_constructor_extends_supported_types() {
    let mut binder = TensorBinder::with_defaults();
    assert!(!binder.supports(GGUFDataType::BF16));
    binder.register(
        GGUFDataType::BF16,
        Arc::new(|request: BindRequest<'_>| {
            let widened: Vec<f32> = bytemuck::cast_slice::<u8, u16>(request.buffer.as_bytes())
                .iter()
                .map(|&bits| bf16::from_bits(bits).to_f32())
                .collect();
            PrimitiveTensor::from_values(request.name, request.shape, &widened).map(InferenceTensor::from)
        }),
    );

    let archive = TensorBuffer::from_pod(&[bf16::from_f32(1.5), bf16::from_f32(-2.0)]);
    let tensor = binder.bind(&record("b", vec![2], GGUFDataType::BF16, 4), &archive).unwrap();
    assert_eq!(tensor.to_f32_vec().unwrap(), vec![1.5, -2.0]);
}

#[test]
fn constructor_failure_is_reported_as_malformed_record() {
    let archive = TensorBuffer::from_bytes(&[0; 33]);
    let err = TensorBinder::with_defaults()
        .bind(&record("short", vec![32], GGUFDataType::Q8_0, 33), &archive)
        .unwrap_err();
    assert!(matches!(&err, GGUFError::MalformedArchive { tensor, .. } if tensor == "short"), "{err}");
}
