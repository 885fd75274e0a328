#![cfg(test)]

use forge_sdk::QuantizedTensor;
use forge_sdk::TensorBuffer;

use super::*;
use crate::testing::{Expr, RecordingOps};

fn theta() -> Theta {
    // Two rows of one Q8_0 block each.
    let table = QuantizedTensor::for_dtype("token_embd.weight", vec![2, 32], Dtype::Q8_0, TensorBuffer::from_bytes(&[0; 68])).unwrap();
    Theta::from_entries([("weight".to_string(), table.into())]).unwrap()
}

#[test]
fn forward_looks_up_rows_as_f32_by_default() {
    let ops = Arc::new(RecordingOps::new());
    let layer = TokenEmbedding::new(theta(), Arc::clone(&ops)).unwrap();
    assert_eq!(layer.dtype(), Dtype::F32);
    assert!(layer.weight().is_quantized());

    let out = layer.forward(&Expr::input("ids")).unwrap();
    assert_eq!(out.to_string(), "embedding(ids, token_embd.weight, F32)");
    assert_eq!(ops.calls()[0].weight_dtype, Dtype::Q8_0);
}

#[test]
fn output_dtype_is_configurable() {
    let config = TokenEmbeddingConfig {
        dtype: Dtype::F16,
        ..TokenEmbeddingConfig::default()
    };
    let layer = TokenEmbedding::with_config(theta(), Arc::new(RecordingOps::new()), config).unwrap();
    assert!(matches!(layer.forward(&Expr::input("ids")).unwrap(), Expr::Embedding { dtype: Dtype::F16, .. }));
}
