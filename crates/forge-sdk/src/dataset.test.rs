#![cfg(test)]

use serde_json::json;

use super::*;

#[test]
fn properties_are_sorted_and_typed() {
    let mut properties = Properties::new();
    properties.insert("schema", "GGUF");
    properties.insert("general.alignment", PropertyValue::U32(32));
    properties.insert("general.name", "demo");
    properties.insert("rope.freq_base", PropertyValue::F32(10000.0));

    assert_eq!(properties.keys().collect::<Vec<_>>(), ["general.alignment", "general.name", "rope.freq_base", "schema"]);
    assert_eq!(properties.get_str("general.name"), Some("demo"));
    assert_eq!(properties.get_i64("general.alignment"), Some(32));
    assert_eq!(properties.get_u64("general.alignment"), Some(32));
    assert_eq!(properties.get_f64("rope.freq_base"), Some(10000.0));
    assert_eq!(properties.get_str("general.alignment"), None);
}

#[test]
fn integer_accessors_do_not_wrap() {
    assert_eq!(PropertyValue::U64(u64::MAX).as_i64(), None);
    assert_eq!(PropertyValue::U64(u64::MAX).as_u64(), Some(u64::MAX));
    assert_eq!(PropertyValue::I8(-1).as_u64(), None);
    assert_eq!(PropertyValue::Bool(true).as_i64(), None);
}

#[test]
fn properties_serialize_with_variant_tags() {
    let properties: Properties = [
        ("schema", PropertyValue::from("GGUF")),
        ("vocab", PropertyValue::U32(3)),
        ("tied", PropertyValue::Bool(false)),
    ]
    .into_iter()
    .collect();

    assert_eq!(
        serde_json::to_value(&properties).unwrap(),
        json!({
            "schema": { "type": "String", "value": "GGUF" },
            "tied": { "type": "Bool", "value": false },
            "vocab": { "type": "U32", "value": 3 },
        })
    );
}

#[test]
fn json_round_trip_keeps_widths_and_precision() {
    let properties: Properties = [
        ("eps", PropertyValue::F64(0.1)),
        ("heads", PropertyValue::U32(5)),
        ("scale", PropertyValue::F32(0.25)),
        ("offset", PropertyValue::I64(-7)),
        ("count", PropertyValue::U64(u64::MAX)),
    ]
    .into_iter()
    .collect();

    let text = serde_json::to_string(&properties).unwrap();
    let restored: Properties = serde_json::from_str(&text).unwrap();
    assert_eq!(restored, properties);
    assert_eq!(restored.get("eps"), Some(&PropertyValue::F64(0.1)));
    assert_eq!(restored.get("heads"), Some(&PropertyValue::U32(5)));
}

#[test]
fn value_kind_widths() {
    assert_eq!(ValueKind::Bool.fixed_size(), Some(1));
    assert_eq!(ValueKind::F64.fixed_size(), Some(8));
    assert_eq!(ValueKind::String.fixed_size(), None);
}
