#![cfg(test)]

use super::TensorBuffer;

#[test]
fn heap_buffer_is_word_aligned() {
    let buffer = TensorBuffer::from_bytes(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(buffer.len(), 9);
    assert_eq!(buffer.as_bytes().as_ptr() as usize % 8, 0);
    assert_eq!(buffer.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
}

#[test]
fn slices_share_storage_and_nest() {
    let buffer = TensorBuffer::from_bytes(&(0u8..32).collect::<Vec<_>>());
    let outer = buffer.slice(8..24).unwrap();
    let inner = outer.slice(4..8).unwrap();

    assert_eq!(inner.as_bytes(), &[12, 13, 14, 15]);
    assert!(inner.shares_storage_with(&buffer));
    assert!(!inner.shares_storage_with(&TensorBuffer::from_bytes(&[12, 13, 14, 15])));
}

#[test]
fn out_of_bounds_slice_is_rejected() {
    let buffer = TensorBuffer::from_bytes(&[0; 16]);
    assert!(buffer.slice(0..17).is_none());
    assert!(buffer.slice(8..16).unwrap().slice(4..9).is_none());
    assert!(buffer.slice(16..16).unwrap().is_empty());
}

#[test]
fn pod_values_are_stored_little_endian_on_le_hosts() {
    let buffer = TensorBuffer::from_pod(&[1.0f32, -2.0]);
    assert_eq!(buffer.len(), 8);
    assert_eq!(&buffer.as_bytes()[..4], &1.0f32.to_le_bytes());
}
