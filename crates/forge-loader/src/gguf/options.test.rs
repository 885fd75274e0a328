#![cfg(test)]

use forge_env::EnvVarGuard;
use serial_test::serial;

use super::*;

#[test]
#[serial]
fn limits_default_when_environment_is_empty() {
    let _a = GGUF_MAX_STRING_BYTES.unset_guard();
    let _b = GGUF_MAX_ARRAY_LEN.unset_guard();
    let _c = GGUF_ALLOW_UNALIGNED_OFFSETS.unset_guard();

    assert_eq!(ReaderLimits::from_env().unwrap(), ReaderLimits::default());
}

#[test]
#[serial]
fn limits_follow_environment() {
    let _a = GGUF_MAX_STRING_BYTES.set_guard(64).unwrap();
    let _b = GGUF_MAX_ARRAY_LEN.set_guard(10).unwrap();
    let _c = GGUF_ALLOW_UNALIGNED_OFFSETS.set_guard(true).unwrap();

    let limits = GGUFLoadOptions::from_env().unwrap().limits;
    assert_eq!(
        limits,
        ReaderLimits {
            max_string_bytes: 64,
            max_array_len: 10,
            allow_unaligned_offsets: true,
        }
    );
}

#[test]
#[serial]
fn malformed_limit_is_a_config_error() {
    let _a = EnvVarGuard::set(GGUF_MAX_ARRAY_LEN.var(), "-3");
    let err = ReaderLimits::from_env().unwrap_err();
    assert!(err.to_string().contains("FORGE_GGUF_MAX_ARRAY_LEN"), "{err}");
}
