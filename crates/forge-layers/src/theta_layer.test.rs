#![cfg(test)]

use forge_sdk::PrimitiveTensor;

use super::*;
use crate::testing::RecordingOps;

fn theta(names: &[&str]) -> Theta {
    Theta::new(names.iter().map(|name| PrimitiveTensor::from_values(*name, vec![2], &[1.0f32, 2.0]).unwrap().into())).unwrap()
}

#[test]
fn theta_tensor_resolves_or_fails_with_the_name() {
    let layer = ThetaLayer::new(theta(&["a.w", "a.b"]), Arc::new(RecordingOps::new()));
    assert_eq!(layer.theta_tensor("a.w").unwrap().name(), "a.w");
    assert_eq!(layer.theta_tensor("a.x").unwrap_err(), ThetaError::NotFound("a.x".into()));
}

#[test]
fn scoped_layers_share_the_operator_set() {
    let ops = Arc::new(RecordingOps::new());
    let layer = ThetaLayer::new(theta(&["blk.0.weight", "blk.1.weight"]), Arc::clone(&ops));
    let block = layer.scoped("blk.1").unwrap();

    assert_eq!(block.theta().keys().collect::<Vec<_>>(), vec!["weight"]);
    assert_eq!(block.theta_tensor("weight").unwrap().name(), "blk.1.weight");
    assert!(Arc::ptr_eq(&block.ops_handle(), &ops));
    assert!(matches!(layer.scoped("blk.2"), Err(ThetaError::NotFound(_))));
}

#[test]
fn clones_share_parameters() {
    let layer = ThetaLayer::new(theta(&["w"]), Arc::new(RecordingOps::new()));
    let copy = layer.clone();
    let original = layer.theta_tensor("w").unwrap();
    assert!(original.buffer().shares_storage_with(copy.theta_tensor("w").unwrap().buffer()));
    assert!(format!("{copy:?}").contains("\"w\""));
}
