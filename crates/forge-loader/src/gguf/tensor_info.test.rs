#![cfg(test)]

use super::*;

fn info(dimensions: Vec<u64>) -> GGUFTensorInfo {
    GGUFTensorInfo {
        name: "t".into(),
        dimensions,
        data_type: GGUFDataType::F32,
        offset: 0,
        byte_range: None,
    }
}

#[test]
fn logical_shape_reverses_declared_dims() {
    assert_eq!(info(vec![2, 3, 4]).logical_shape().unwrap(), vec![4, 3, 2]);
    assert_eq!(info(vec![7]).logical_shape().unwrap(), vec![7]);
}

#[test]
fn element_count_detects_overflow() {
    assert_eq!(info(vec![2, 3, 4]).element_count(), Some(24));
    assert_eq!(info(vec![u64::MAX, 2]).element_count(), None);
}
