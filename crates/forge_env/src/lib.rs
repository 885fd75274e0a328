//! Shared process environment helpers for the forge crates.

pub mod environment;
pub mod logging;

pub use environment::{
    EnvVar, Environment,
    guard::EnvVarGuard,
    instrument::{InstrumentEnvVar, LOG_LEVEL},
    loader::{
        DEFAULT_MAX_ARRAY_LEN, DEFAULT_MAX_STRING_BYTES, GGUF_ALLOW_UNALIGNED_OFFSETS, GGUF_MAX_ARRAY_LEN, GGUF_MAX_STRING_BYTES,
        LoaderEnvVar,
    },
    value::{EnvVarError, EnvVarFormatError, EnvVarParseError, TypedEnvVar, TypedEnvVarGuard},
};
pub use logging::{LogConfig, init_from_env};
