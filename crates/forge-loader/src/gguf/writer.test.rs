#![cfg(test)]

use forge_sdk::TensorBuffer;
use tracing::Span;

use super::*;
use crate::gguf::{GGUFFile, GGUFValue, ReaderLimits};

fn parse(bytes: Vec<u8>) -> GGUFFile {
    GGUFFile::parse(TensorBuffer::from_bytes(&bytes), &ReaderLimits::default(), &Span::none()).unwrap()
}

#[test]
fn written_archive_parses_back() {
    let mut writer = GGUFWriter::new();
    writer.add_field("general.name", "demo").add_field("llama.block_count", PropertyValue::U32(2));
    writer
        .add_tensor("a", vec![3], GGUFDataType::F32, bytemuck::cast_slice(&[1.0f32, 2.0, 3.0]).to_vec())
        .unwrap()
        .add_tensor("b", vec![32], GGUFDataType::Q8_0, vec![0; 34])
        .unwrap();

    let file = parse(writer.to_bytes().unwrap());
    assert_eq!(file.header.version, 3);
    assert_eq!(file.header.field_count, 2);
    assert_eq!(file.field("general.name").unwrap().value.as_str(), Some("demo"));
    assert!(matches!(file.field("llama.block_count").unwrap().value, GGUFValue::U32(2)));

    assert_eq!(file.data_offset % 32, 0);
    let a = file.tensor("a").unwrap();
    let b = file.tensor("b").unwrap();
    assert_eq!(a.offset, 0);
    assert_eq!(b.offset, 32);
    assert_eq!(bytemuck::cast_slice::<u8, f32>(file.tensor_data(a).unwrap()), &[1.0, 2.0, 3.0]);
    assert_eq!(file.tensor_data(b).unwrap().len(), 34);
    assert_eq!(b.byte_range.as_ref().unwrap().end, file.buffer().len());
}

#[test]
fn custom_alignment_is_recorded_and_honoured() {
    let mut writer = GGUFWriter::new().with_alignment(64).unwrap();
    writer
        .add_tensor("x", vec![5], GGUFDataType::F32, vec![0; 20])
        .unwrap()
        .add_tensor("y", vec![1], GGUFDataType::F64, vec![0; 8])
        .unwrap();

    let file = parse(writer.to_bytes().unwrap());
    assert_eq!(file.alignment, 64);
    assert_eq!(file.data_offset % 64, 0);
    assert_eq!(file.tensor("y").unwrap().offset, 64);
    assert!(GGUFWriter::new().with_alignment(48).is_err());
}

#[test]
fn arrays_are_kept_as_tables() {
    let mut writer = GGUFWriter::new();
    writer
        .add_array(
            "tokenizer.ggml.tokens",
            ValueKind::String,
            vec!["<s>".into(), "hello".into(), "</s>".into()],
        )
        .unwrap();

    let file = parse(writer.to_bytes().unwrap());
    let GGUFValue::Array(array) = &file.field("tokenizer.ggml.tokens").unwrap().value else {
        panic!("expected array");
    };
    assert_eq!(array.element_type, GGUFValueType::String);
    assert_eq!(array.len, 3);
    assert_eq!(array.bytes.len(), 3 * 8 + 3 + 5 + 4);
}

#[test]
fn writer_rejects_inconsistent_input() {
    let mut writer = GGUFWriter::new();
    assert!(writer.add_tensor("t", vec![4], GGUFDataType::F32, vec![0; 15]).is_err());
    assert!(writer.add_array("a", ValueKind::U32, vec![PropertyValue::U32(1), PropertyValue::I32(2)]).is_err());
    assert!(GGUFWriter::new().with_version(1).is_err());
}

#[test]
fn version_two_archives_are_accepted() {
    let mut writer = GGUFWriter::new().with_version(2).unwrap();
    writer.add_field("general.name", "old");
    assert_eq!(parse(writer.to_bytes().unwrap()).header.version, 2);
}
