#![cfg(test)]

use forge_sdk::PrimitiveTensor;

use super::*;
use crate::testing::{Expr, RecordingOps};

fn theta() -> Theta {
    let weight = PrimitiveTensor::from_values("output.weight", vec![3, 2], &[0.0f32; 6]).unwrap();
    Theta::from_entries([("weight".to_string(), weight.into())]).unwrap()
}

#[test]
fn forward_delegates_to_transposed_matmul() {
    let ops = Arc::new(RecordingOps::new());
    let layer = LinearLayer::new(theta(), Arc::clone(&ops)).unwrap();
    assert!(layer.transpose_weight());

    let out = layer.forward(&Expr::input("x")).unwrap();
    assert_eq!(out.to_string(), "matmul(x, output.weight^T)");
    let calls = ops.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].op, "matmul");
    assert_eq!(calls[0].weight_shape, vec![3, 2]);
}

#[test]
fn config_controls_weight_name_and_transpose() {
    let config = LinearConfig {
        weight_name: "weight".into(),
        transpose_weight: false,
    };
    let layer = LinearLayer::with_config(theta(), Arc::new(RecordingOps::new()), config).unwrap();
    let out = layer.forward(&Expr::input("x")).unwrap();
    assert!(matches!(out, Expr::MatMul { transpose_rhs: false, .. }));
}

#[test]
fn missing_weight_fails_at_construction() {
    let config = LinearConfig {
        weight_name: "bias".into(),
        ..LinearConfig::default()
    };
    let err = LinearLayer::with_config(theta(), Arc::new(RecordingOps::new()), config).unwrap_err();
    assert_eq!(err, ThetaError::NotFound("bias".into()));
}
