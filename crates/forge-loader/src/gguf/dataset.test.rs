#![cfg(test)]

use byteorder::{LittleEndian, WriteBytesExt};
use forge_sdk::Dtype;

use super::*;
use crate::gguf::{GGUFDataType, GGUFWriter};

fn load(writer: &GGUFWriter) -> Dataset {
    load_gguf_bytes(&writer.to_bytes().unwrap(), &GGUFLoadOptions::default()).unwrap()
}

#[test]
fn fields_become_properties_and_arrays_become_tables() {
    let mut writer = GGUFWriter::new();
    writer
        .add_field("general.name", "demo")
        .add_field("llama.block_count", PropertyValue::U32(2))
        .add_field("llama.rope.freq_base", PropertyValue::F32(10000.0))
        .add_array("tokenizer.ggml.tokens", ValueKind::String, vec!["a".into(), "b".into()])
        .unwrap();

    let dataset = load(&writer);
    let props = &dataset.properties;
    assert_eq!(props.get_str("general.name"), Some("demo"));
    assert_eq!(props.get_u64("llama.block_count"), Some(2));
    assert_eq!(props.get_f64("llama.rope.freq_base"), Some(10000.0));
    assert_eq!(props.get_str(SCHEMA_KEY), Some(SCHEMA));
    assert_eq!(props.get_u64("GGUF.version"), Some(3));
    assert_eq!(props.get_u64("GGUF.tensor_count"), Some(0));
    assert_eq!(props.get_u64("GGUF.kv_count"), Some(4));

    assert!(!props.contains_key("tokenizer.ggml.tokens"));
    let table = &dataset.tables["tokenizer.ggml.tokens"];
    assert_eq!(table.element_kind, ValueKind::String);
    assert_eq!(table.len, 2);
    assert!(dataset.root_theta.is_empty());
}

#[test]
fn archive_schema_field_replaces_default_tag() {
    let mut writer = GGUFWriter::new();
    writer.add_field(SCHEMA_KEY, "something-else");
    assert_eq!(load(&writer).properties.get_str(SCHEMA_KEY), Some("something-else"));

    let plain = GGUFWriter::new();
    assert_eq!(load(&plain).properties.get_str(SCHEMA_KEY), Some(SCHEMA));
}

#[test]
fn invalid_utf8_property_is_skipped() {
    let mut value = Vec::new();
    value.write_u64::<LittleEndian>(3).unwrap();
    value.extend_from_slice(&[b'o', 0xC3, 0x28]);
    let mut writer = GGUFWriter::new();
    writer.add_raw_field("general.author", 8, value).add_field("general.name", "kept");

    let dataset = load(&writer);
    assert!(!dataset.properties.contains_key("general.author"));
    assert_eq!(dataset.properties.get_str("general.name"), Some("kept"));
}

#[test]
fn tensors_are_bound_into_the_root_theta() {
    let mut writer = GGUFWriter::new();
    writer
        .add_tensor("blk.0.attn_norm.weight", vec![4], GGUFDataType::F32, vec![0; 16])
        .unwrap()
        .add_tensor("blk.0.ffn_up.weight", vec![32, 3], GGUFDataType::Q8_0, vec![0; 102])
        .unwrap();

    let dataset = load(&writer);
    let theta = &dataset.root_theta;
    assert_eq!(theta.len(), 2);
    let up = theta.tensor("blk.0.ffn_up.weight").unwrap();
    assert_eq!(up.shape(), &[3, 32]);
    assert_eq!(up.dtype(), Dtype::Q8_0);
    assert_eq!(theta.scope("blk.0").unwrap().child_names(), vec!["attn_norm", "ffn_up"]);
}

#[test]
fn duplicate_tensor_names_fail_as_theta_errors() {
    let mut writer = GGUFWriter::new();
    writer
        .add_tensor("t", vec![1], GGUFDataType::F32, vec![0; 4])
        .unwrap()
        .add_tensor("t", vec![1], GGUFDataType::F32, vec![0; 4])
        .unwrap();

    let err = load_gguf_bytes(&writer.to_bytes().unwrap(), &GGUFLoadOptions::default()).unwrap_err();
    assert!(matches!(err, LoaderError::Theta(forge_sdk::ThetaError::Duplicate(name)) if name == "t"));
}

#[test]
fn decode_table_reads_scalars_and_strings() {
    let mut writer = GGUFWriter::new();
    writer
        .add_array("scores", ValueKind::F32, vec![PropertyValue::F32(0.5), PropertyValue::F32(-1.0)])
        .unwrap()
        .add_array("tokens", ValueKind::String, vec!["<s>".into(), "hi".into()])
        .unwrap()
        .add_array("empty", ValueKind::I32, Vec::new())
        .unwrap();
    let dataset = load(&writer);

    assert_eq!(
        decode_table("scores", &dataset.tables["scores"]).unwrap(),
        vec![PropertyValue::F32(0.5), PropertyValue::F32(-1.0)]
    );
    assert_eq!(
        decode_table("tokens", &dataset.tables["tokens"]).unwrap(),
        vec![PropertyValue::from("<s>"), PropertyValue::from("hi")]
    );
    assert!(decode_table("empty", &dataset.tables["empty"]).unwrap().is_empty());
}

#[test]
fn decode_table_rejects_nested_and_short_tables() {
    let nested = OpaqueTable {
        element_kind: ValueKind::Array,
        len: 1,
        bytes: TensorBuffer::from_bytes(&[0; 12]),
    };
    assert!(matches!(decode_table("n", &nested).unwrap_err(), GGUFError::InvalidData { .. }));

    let short = OpaqueTable {
        element_kind: ValueKind::U32,
        len: 2,
        bytes: TensorBuffer::from_bytes(&[0; 6]),
    };
    assert!(matches!(decode_table("s", &short).unwrap_err(), GGUFError::Truncated { .. }));
}
