use forge_env::{
    DEFAULT_MAX_ARRAY_LEN, DEFAULT_MAX_STRING_BYTES, EnvVarError, GGUF_ALLOW_UNALIGNED_OFFSETS, GGUF_MAX_ARRAY_LEN, GGUF_MAX_STRING_BYTES,
};
use tracing::Span;

use super::binder::TensorBinder;

/// Bounds applied while walking untrusted archive metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderLimits {
    pub max_string_bytes: usize,
    pub max_array_len: u64,
    /// Accept tensor offsets that ignore `general.alignment`, logging a warning.
    pub allow_unaligned_offsets: bool,
}

impl Default for ReaderLimits {
    fn default() -> Self {
        Self {
            max_string_bytes: DEFAULT_MAX_STRING_BYTES,
            max_array_len: DEFAULT_MAX_ARRAY_LEN,
            allow_unaligned_offsets: false,
        }
    }
}

impl ReaderLimits {
    pub fn from_env() -> Result<Self, EnvVarError> {
        let defaults = Self::default();
        Ok(Self {
            max_string_bytes: GGUF_MAX_STRING_BYTES.get_or(defaults.max_string_bytes)?,
            max_array_len: GGUF_MAX_ARRAY_LEN.get_or(defaults.max_array_len)?,
            allow_unaligned_offsets: GGUF_ALLOW_UNALIGNED_OFFSETS.get_or(defaults.allow_unaligned_offsets)?,
        })
    }
}

/// Everything a GGUF load needs besides the bytes.
///
/// Log events are emitted under `span`, so callers decide where reader
/// output goes and with which context fields.
#[derive(Clone)]
pub struct GGUFLoadOptions {
    pub span: Span,
    pub limits: ReaderLimits,
    pub binder: TensorBinder,
}

impl Default for GGUFLoadOptions {
    fn default() -> Self {
        Self {
            span: Span::current(),
            limits: ReaderLimits::default(),
            binder: TensorBinder::with_defaults(),
        }
    }
}

impl GGUFLoadOptions {
    /// Default binder and span, limits taken from the environment.
    pub fn from_env() -> Result<Self, EnvVarError> {
        Ok(Self {
            limits: ReaderLimits::from_env()?,
            ..Self::default()
        })
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn with_limits(mut self, limits: ReaderLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn with_binder(mut self, binder: TensorBinder) -> Self {
        self.binder = binder;
        self
    }
}

#[path = "options.test.rs"]
mod tests;
