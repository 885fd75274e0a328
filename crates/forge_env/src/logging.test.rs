#![cfg(test)]

use serial_test::serial;

use super::*;
use crate::EnvVarGuard;

#[test]
#[serial]
fn level_defaults_to_info() {
    let _clear = LOG_LEVEL.unset_guard();
    assert_eq!(LogConfig::from_env().unwrap(), LogConfig::default());
}

#[test]
#[serial]
fn level_is_read_case_insensitively() {
    let _set = EnvVarGuard::set(LOG_LEVEL.var(), "debug");
    assert_eq!(LogConfig::from_env().unwrap().level, Level::DEBUG);
}

#[test]
#[serial]
fn bad_level_is_an_error() {
    let _set = EnvVarGuard::set(LOG_LEVEL.var(), "chatty");
    assert!(LogConfig::from_env().is_err());
}

#[test]
#[serial]
fn init_is_idempotent() {
    let _set = EnvVarGuard::set(LOG_LEVEL.var(), "warn");
    let first = init_from_env().unwrap();
    let _changed = EnvVarGuard::set(LOG_LEVEL.var(), "trace");
    assert_eq!(init_from_env().unwrap(), first);
}
