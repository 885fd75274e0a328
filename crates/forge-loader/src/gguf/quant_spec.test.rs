#![cfg(test)]

use super::*;

#[test]
fn q6k_gguf_size_matches_known_shape() {
    let size = tensor_storage_bytes_for_gguf_dtype(GGUFDataType::Q6_K, &[4864, 896]).expect("q6_k bytes");
    assert_eq!(size, 3_575_040);
}

#[test]
fn iq4nl_block_spec_matches_reference_constants() {
    let GGUFDtypeClass::BlockQuant(spec) = classify_gguf_dtype(GGUFDataType::IQ4_NL) else {
        panic!("iq4_nl should be block quantized");
    };
    assert_eq!(spec.weights_per_block, 32);
    assert_eq!(spec.block_bytes, 18);
}

#[test]
fn scalar_sizes_follow_element_width() {
    assert_eq!(tensor_storage_bytes_for_gguf_dtype(GGUFDataType::F32, &[4, 2]), Some(32));
    assert_eq!(tensor_storage_bytes_for_gguf_dtype(GGUFDataType::BF16, &[3]), Some(6));
    assert_eq!(tensor_storage_bytes_for_gguf_dtype(GGUFDataType::Q8_0, &[32, 2]), Some(68));
}

#[test]
fn partial_blocks_have_no_size() {
    assert_eq!(tensor_storage_bytes_for_gguf_dtype(GGUFDataType::Q4_0, &[33]), None);
}

#[test]
fn deprecated_and_unknown_ids_are_classified_explicitly() {
    assert!(matches!(classify_gguf_dtype(GGUFDataType::Q4_2), GGUFDtypeClass::Deprecated { .. }));
    assert!(matches!(classify_gguf_dtype(GGUFDataType::Q4_0_4_4), GGUFDtypeClass::Deprecated { .. }));
    assert!(matches!(classify_gguf_dtype(GGUFDataType::IQ4_NL_8_8), GGUFDtypeClass::Deprecated { .. }));
    assert!(matches!(classify_gguf_dtype(GGUFDataType::Unknown(99)), GGUFDtypeClass::Unsupported { .. }));
    assert_eq!(tensor_storage_bytes_for_gguf_dtype(GGUFDataType::Unknown(99), &[32]), None);
}
