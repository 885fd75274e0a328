#![cfg(test)]

use serial_test::serial;

use super::*;
use crate::environment::loader::{GGUF_ALLOW_UNALIGNED_OFFSETS, GGUF_MAX_ARRAY_LEN, GGUF_MAX_STRING_BYTES};

#[test]
fn parse_bool_accepts_common_spellings() {
    for truthy in ["1", "true", "YES", " on "] {
        assert!(parse_bool(truthy).unwrap(), "{truthy}");
    }
    for falsy in ["0", "false", "No", "off"] {
        assert!(!parse_bool(falsy).unwrap(), "{falsy}");
    }
    assert!(parse_bool("maybe").is_err());
}

#[test]
fn parse_usize_trims_and_rejects_negatives() {
    assert_eq!(parse_usize(" 42 ").unwrap(), 42);
    assert!(parse_usize("-1").is_err());
    assert!(parse_usize("").is_err());
}

#[test]
#[serial]
fn unset_variable_reads_as_none() {
    let _clear = GGUF_MAX_ARRAY_LEN.unset_guard();
    assert_eq!(GGUF_MAX_ARRAY_LEN.get().unwrap(), None);
    assert_eq!(GGUF_MAX_ARRAY_LEN.get_or(7).unwrap(), 7);
}

#[test]
#[serial]
fn invalid_value_reports_key_and_raw_value() {
    let _set = EnvVarGuard::set(GGUF_MAX_STRING_BYTES.var(), "lots");
    let err = GGUF_MAX_STRING_BYTES.get().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("FORGE_GGUF_MAX_STRING_BYTES"), "{message}");
    assert!(message.contains("lots"), "{message}");
}

#[test]
#[serial]
fn typed_guard_restores_previous_value() {
    let _outer = EnvVarGuard::set(GGUF_ALLOW_UNALIGNED_OFFSETS.var(), "false");
    {
        let guard = GGUF_ALLOW_UNALIGNED_OFFSETS.set_guard(true).unwrap();
        assert!(*guard);
        assert_eq!(GGUF_ALLOW_UNALIGNED_OFFSETS.get().unwrap(), Some(true));
    }
    assert_eq!(GGUF_ALLOW_UNALIGNED_OFFSETS.get().unwrap(), Some(false));
}
