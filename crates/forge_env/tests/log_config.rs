use forge_env::{EnvVarGuard, InstrumentEnvVar, LOG_LEVEL, LogConfig};
use serial_test::serial;
use tracing::Level;

#[test]
#[serial]
fn log_config_defaults_to_info() {
    let _clear = EnvVarGuard::unset(InstrumentEnvVar::LogLevel);
    assert_eq!(LogConfig::from_env().unwrap(), LogConfig { level: Level::INFO });
}

#[test]
#[serial]
fn log_config_reads_level_from_env() {
    let _set = LOG_LEVEL.set_guard(Level::DEBUG).unwrap();
    assert_eq!(LogConfig::from_env().unwrap().level, Level::DEBUG);
}

#[test]
#[serial]
fn log_config_rejects_unknown_level() {
    let _set = EnvVarGuard::set(InstrumentEnvVar::LogLevel, "chatty");
    assert!(LogConfig::from_env().is_err());
}
