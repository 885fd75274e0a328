#![cfg(test)]

use super::*;
use crate::PrimitiveTensor;

fn scalar(name: &str, value: f32) -> InferenceTensor {
    PrimitiveTensor::from_values(name, vec![1], &[value]).unwrap().into()
}

#[test]
fn lookup_hits_and_misses() {
    let theta = Theta::new([scalar("a.w", 1.0), scalar("a.b", 2.0)]).unwrap();

    assert_eq!(theta.tensor("a.w").unwrap().name(), "a.w");
    assert_eq!(theta.tensor_path(&["a", "b"]).unwrap().name(), "a.b");
    assert_eq!(theta.tensor("a.x").unwrap_err(), ThetaError::NotFound("a.x".into()));
    assert!(theta.get("a").is_none());
}

#[test]
fn duplicate_names_are_rejected() {
    let err = Theta::new([scalar("w", 1.0), scalar("b", 0.0), scalar("w", 2.0)]).unwrap_err();
    assert_eq!(err, ThetaError::Duplicate("w".into()));
}

#[test]
fn keys_keep_insertion_order() {
    let theta = Theta::new([scalar("z", 0.0), scalar("a", 0.0), scalar("m", 0.0)]).unwrap();
    assert_eq!(theta.keys().collect::<Vec<_>>(), ["z", "a", "m"]);
    assert_eq!(theta.len(), 3);
    assert!(!theta.is_empty());
}

#[test]
fn scope_rekeys_relative_to_prefix() {
    let theta = Theta::new([
        scalar("blk.0.attn.weight", 0.0),
        scalar("blk.0.norm.weight", 0.0),
        scalar("blk.1.attn.weight", 0.0),
        scalar("blk.10.attn.weight", 0.0),
        scalar("output.weight", 0.0),
    ])
    .unwrap();

    let block = theta.scope("blk.1").unwrap();
    assert_eq!(block.keys().collect::<Vec<_>>(), ["attn.weight"]);
    assert_eq!(block.tensor("attn.weight").unwrap().name(), "blk.1.attn.weight");

    let nested = theta.scope("blk").unwrap().scope("0").unwrap();
    assert_eq!(nested.child_names(), ["attn", "norm"]);

    assert_eq!(theta.scope("missing").unwrap_err(), ThetaError::NotFound("missing".into()));
    assert_eq!(theta.child_names(), ["blk", "output"]);
}

#[test]
fn clones_share_entries() {
    let theta = Theta::new([scalar("w", 3.0)]).unwrap();
    let copy = theta.clone();
    assert!(std::ptr::eq(theta.tensor("w").unwrap(), copy.tensor("w").unwrap()));
}
