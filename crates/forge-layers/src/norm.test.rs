#![cfg(test)]

use forge_sdk::PrimitiveTensor;

use super::*;
use crate::testing::{Expr, RecordingOps};

fn theta() -> Theta {
    let weight = PrimitiveTensor::from_values("attn_norm.weight", vec![4], &[1.0f32; 4]).unwrap();
    Theta::from_entries([("weight".to_string(), weight.into())]).unwrap()
}

#[test]
fn forward_passes_weight_and_default_epsilon() {
    let layer = RmsNormLayer::new(theta(), Arc::new(RecordingOps::new())).unwrap();
    assert_eq!(layer.epsilon(), 1e-6);

    let out = layer.forward(&Expr::input("h")).unwrap();
    assert_eq!(
        out,
        Expr::RmsNorm {
            input: Box::new(Expr::input("h")),
            weight: "attn_norm.weight".into(),
            epsilon: 1e-6,
        }
    );
}

#[test]
fn custom_epsilon_reaches_the_operator() {
    let config = RmsNormConfig {
        epsilon: 1e-5,
        ..RmsNormConfig::default()
    };
    let layer = RmsNormLayer::with_config(theta(), Arc::new(RecordingOps::new()), config).unwrap();
    assert!(matches!(layer.forward(&Expr::input("h")).unwrap(), Expr::RmsNorm { epsilon, .. } if epsilon == 1e-5));
}

#[test]
fn operator_errors_propagate_from_forward() {
    let config = RmsNormConfig {
        epsilon: 0.0,
        ..RmsNormConfig::default()
    };
    let layer = RmsNormLayer::with_config(theta(), Arc::new(RecordingOps::new()), config).unwrap();
    assert!(matches!(layer.forward(&Expr::input("h")), Err(OpError::InvalidArgument(_))));
}
