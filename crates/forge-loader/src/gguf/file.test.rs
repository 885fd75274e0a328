#![cfg(test)]

use byteorder::{LittleEndian, WriteBytesExt};

use super::*;
use crate::gguf::GGUFWriter;

fn parse_with(bytes: &[u8], limits: &ReaderLimits) -> Result<GGUFFile, GGUFError> {
    GGUFFile::parse(TensorBuffer::from_bytes(bytes), limits, &Span::none())
}

fn parse(bytes: &[u8]) -> Result<GGUFFile, GGUFError> {
    parse_with(bytes, &ReaderLimits::default())
}

/// Archive with no fields and hand-placed tensor records.
fn raw_archive(tensors: &[(&str, &[u64], u32, u64)], data_len: usize) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"GGUF");
    out.write_u32::<LittleEndian>(3).unwrap();
    out.write_u64::<LittleEndian>(tensors.len() as u64).unwrap();
    out.write_u64::<LittleEndian>(0).unwrap();
    for &(name, dims, tag, offset) in tensors {
        out.write_u64::<LittleEndian>(name.len() as u64).unwrap();
        out.extend_from_slice(name.as_bytes());
        out.write_u32::<LittleEndian>(dims.len() as u32).unwrap();
        for &d in dims {
            out.write_u64::<LittleEndian>(d).unwrap();
        }
        out.write_u32::<LittleEndian>(tag).unwrap();
        out.write_u64::<LittleEndian>(offset).unwrap();
    }
    out.resize(out.len().next_multiple_of(32) + data_len, 0);
    out
}

#[test]
fn data_type_ids_round_trip_and_display_ggml_names() {
    for id in 0..=40 {
        assert_eq!(GGUFDataType::from_u32(id).to_u32(), id);
    }
    assert_eq!(GGUFDataType::from_u32(8), GGUFDataType::Q8_0);
    assert_eq!(GGUFDataType::from_u32(39), GGUFDataType::MXFP4);
    assert_eq!(GGUFDataType::Q4_0_4_8.to_string(), "Q4_0_4_8");
    assert_eq!(GGUFDataType::Unknown(40).to_string(), "UNKNOWN(40)");
    assert_eq!(GGUFDataType::from(Dtype::Q6_K), GGUFDataType::Q6_K);
}

#[test]
fn value_type_table_uses_a_single_mapping() {
    for id in 0..=12 {
        assert_eq!(GGUFValueType::from_u32(id).unwrap().to_u32(), id);
    }
    assert_eq!(GGUFValueType::from_u32(10), Some(GGUFValueType::U64));
    assert_eq!(GGUFValueType::from_u32(12), Some(GGUFValueType::F64));
    assert_eq!(GGUFValueType::from_u32(13), None);
}

#[test]
fn header_errors_are_specific() {
    assert!(matches!(parse(b"GGML\x03\0\0\0").unwrap_err(), GGUFError::InvalidMagic(_)));

    let mut v4 = raw_archive(&[], 0);
    v4[4] = 4;
    assert!(matches!(parse(&v4).unwrap_err(), GGUFError::UnsupportedVersion(4)));

    let err = parse(b"GGUF\x03\0\0\0\x01").unwrap_err();
    assert!(matches!(&err, GGUFError::Truncated { location } if location.contains("tensor count")), "{err}");
}

#[test]
fn empty_archive_has_no_records() {
    let file = parse(&raw_archive(&[], 0)).unwrap();
    assert!(file.fields.is_empty());
    assert!(file.tensors.is_empty());
    assert_eq!(file.alignment, DEFAULT_ALIGNMENT);
}

#[test]
fn unknown_value_kind_is_fatal_and_names_the_field() {
    let mut writer = GGUFWriter::new();
    writer.add_field("general.name", "ok").add_raw_field("mystery", 13, vec![0; 8]);
    let err = parse(&writer.to_bytes().unwrap()).unwrap_err();
    assert!(matches!(&err, GGUFError::InvalidData { location, .. } if location.contains("mystery")), "{err}");
}

#[test]
fn duplicate_field_keys_are_rejected() {
    let mut writer = GGUFWriter::new();
    writer.add_field("k", PropertyValue::U8(1)).add_field("k", PropertyValue::U8(2));
    assert!(matches!(parse(&writer.to_bytes().unwrap()).unwrap_err(), GGUFError::InvalidData { .. }));
}

#[test]
fn string_and_array_limits_are_enforced() {
    let mut writer = GGUFWriter::new();
    writer.add_field("general.description", "x".repeat(100));
    let bytes = writer.to_bytes().unwrap();
    let tight = ReaderLimits {
        max_string_bytes: 64,
        ..ReaderLimits::default()
    };
    assert!(matches!(parse_with(&bytes, &tight).unwrap_err(), GGUFError::InvalidData { .. }));
    assert!(parse(&bytes).is_ok());

    let mut writer = GGUFWriter::new();
    writer
        .add_array("scores", ValueKind::F32, vec![PropertyValue::F32(0.0); 11])
        .unwrap();
    let tight = ReaderLimits {
        max_array_len: 10,
        ..ReaderLimits::default()
    };
    assert!(matches!(parse_with(&writer.to_bytes().unwrap(), &tight).unwrap_err(), GGUFError::InvalidData { .. }));
}

#[test]
fn invalid_utf8_string_values_are_kept_raw() {
    let mut value = Vec::new();
    value.write_u64::<LittleEndian>(2).unwrap();
    value.extend_from_slice(&[0xFF, 0xFE]);
    let mut writer = GGUFWriter::new();
    writer.add_raw_field("general.name", 8, value);

    let file = parse(&writer.to_bytes().unwrap()).unwrap();
    let field = file.field("general.name").unwrap();
    assert_eq!(field.value.value_type(), GGUFValueType::String);
    assert_eq!(field.value.as_str(), None);
}

#[test]
fn non_power_of_two_alignment_is_invalid() {
    let mut writer = GGUFWriter::new();
    writer.add_field(ALIGNMENT_KEY, PropertyValue::U32(24));
    let err = parse(&writer.to_bytes().unwrap()).unwrap_err();
    assert!(matches!(&err, GGUFError::InvalidData { location, .. } if location == ALIGNMENT_KEY), "{err}");
}

#[test]
fn byte_ranges_are_absolute_and_sized_by_type() {
    let bytes = raw_archive(&[("w", &[32, 2], 8, 0), ("n", &[4], 0, 96)], 112);
    let file = parse(&bytes).unwrap();

    let w = file.tensor("w").unwrap();
    assert_eq!(w.byte_range, Some(file.data_offset..file.data_offset + 68));
    let n = file.tensor("n").unwrap();
    assert_eq!(n.byte_len(), Some(16));
}

#[test]
fn range_past_end_is_malformed() {
    let mut bytes = raw_archive(&[("w", &[32], 8, 0)], 34);
    assert!(parse(&bytes).is_ok());
    bytes.pop();
    let err = parse(&bytes).unwrap_err();
    assert!(matches!(&err, GGUFError::MalformedArchive { tensor, .. } if tensor == "w"), "{err}");
}

#[test]
fn overlapping_tensors_are_malformed() {
    let bytes = raw_archive(&[("a", &[16], 0, 0), ("b", &[4], 0, 32)], 128);
    let err = parse(&bytes).unwrap_err();
    assert!(matches!(&err, GGUFError::MalformedArchive { tensor, reason } if tensor == "a" && reason.contains("'b'")), "{err}");
}

#[test]
fn unaligned_offsets_fail_unless_allowed() {
    let bytes = raw_archive(&[("a", &[1], 0, 4)], 8);
    assert!(matches!(parse(&bytes).unwrap_err(), GGUFError::MalformedArchive { .. }));

    let lenient = ReaderLimits {
        allow_unaligned_offsets: true,
        ..ReaderLimits::default()
    };
    let file = parse_with(&bytes, &lenient).unwrap();
    assert_eq!(file.tensor("a").unwrap().byte_len(), Some(4));
}

#[test]
fn unsized_types_parse_without_a_range() {
    let bytes = raw_archive(&[("odd", &[32], 77, 0), ("old", &[32], 4, 0)], 0);
    let file = parse(&bytes).unwrap();
    assert_eq!(file.tensor("odd").unwrap().data_type, GGUFDataType::Unknown(77));
    assert_eq!(file.tensor("odd").unwrap().byte_range, None);
    assert_eq!(file.tensor("old").unwrap().byte_range, None);
}

#[test]
fn zero_sized_and_partial_block_tensors_are_malformed() {
    let zero = raw_archive(&[("z", &[0, 4], 0, 0)], 0);
    assert!(matches!(parse(&zero).unwrap_err(), GGUFError::MalformedArchive { .. }));

    let partial = raw_archive(&[("p", &[33], 8, 0)], 64);
    assert!(matches!(parse(&partial).unwrap_err(), GGUFError::MalformedArchive { .. }));
}

#[test]
fn too_many_dimensions_is_invalid() {
    let bytes = raw_archive(&[("t", &[1, 1, 1, 1, 1], 0, 0)], 4);
    assert!(matches!(parse(&bytes).unwrap_err(), GGUFError::InvalidData { .. }));
}
