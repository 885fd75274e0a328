//! Archive reader limits configurable through the environment.

use super::{
    EnvVar,
    value::{TypedEnvVar, format_display, parse_bool, parse_u64, parse_usize},
};

/// Default cap on a single encoded string (field keys, values, tensor names).
pub const DEFAULT_MAX_STRING_BYTES: usize = 1024 * 1024;
/// Default cap on the element count of one array field.
pub const DEFAULT_MAX_ARRAY_LEN: u64 = 16 * 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoaderEnvVar {
    MaxStringBytes,
    MaxArrayLen,
    AllowUnalignedOffsets,
}

impl LoaderEnvVar {
    pub const fn key(self) -> &'static str {
        match self {
            LoaderEnvVar::MaxStringBytes => "FORGE_GGUF_MAX_STRING_BYTES",
            LoaderEnvVar::MaxArrayLen => "FORGE_GGUF_MAX_ARRAY_LEN",
            LoaderEnvVar::AllowUnalignedOffsets => "FORGE_GGUF_ALLOW_UNALIGNED_OFFSETS",
        }
    }

    pub const fn into_env(self) -> EnvVar {
        EnvVar::Loader(self)
    }
}

/// Maximum byte length accepted for any string in an archive.
pub const GGUF_MAX_STRING_BYTES: TypedEnvVar<usize> =
    TypedEnvVar::new(LoaderEnvVar::MaxStringBytes.into_env(), parse_usize, format_display);

/// Maximum element count accepted for an array field.
pub const GGUF_MAX_ARRAY_LEN: TypedEnvVar<u64> = TypedEnvVar::new(LoaderEnvVar::MaxArrayLen.into_env(), parse_u64, format_display);

/// Downgrade tensor offsets that ignore `general.alignment` from an error to a warning.
pub const GGUF_ALLOW_UNALIGNED_OFFSETS: TypedEnvVar<bool> =
    TypedEnvVar::new(LoaderEnvVar::AllowUnalignedOffsets.into_env(), parse_bool, format_display);
