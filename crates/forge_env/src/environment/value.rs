//! Typed environment variable descriptors and guard helpers.
//!
//! [`TypedEnvVar`] wraps an [`EnvVar`] with caller-supplied parse and format
//! callbacks. Descriptors expose getters, setters and scoped guards that
//! restore the previous process environment state on drop.
//!
//! # Examples
//!
//! ```
//! use forge_env::environment::loader::GGUF_MAX_STRING_BYTES;
//!
//! let guard = GGUF_MAX_STRING_BYTES.set_guard(4096).expect("set limit");
//! assert_eq!(*guard, 4096);
//! assert_eq!(GGUF_MAX_STRING_BYTES.get().unwrap(), Some(4096));
//! ```

use std::{marker::PhantomData, ops::Deref};

use super::{EnvVar, Environment, guard::EnvVarGuard};

/// Errors emitted when interacting with typed environment variables.
#[derive(Debug, thiserror::Error)]
pub enum EnvVarError {
    /// The environment value could not be parsed into the desired type.
    #[error("failed to parse environment variable {name} from '{value}': {source}")]
    Parse {
        name: &'static str,
        value: String,
        source: EnvVarParseError,
    },
    /// The provided value could not be formatted for storage.
    #[error("failed to format environment variable {name}: {source}")]
    Format { name: &'static str, source: EnvVarFormatError },
}

/// Error produced by a [`TypedEnvVar`] parsing callback.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct EnvVarParseError {
    message: String,
}

impl EnvVarParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Error produced by a [`TypedEnvVar`] formatting callback.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct EnvVarFormatError {
    message: String,
}

impl EnvVarFormatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Callback used to parse an environment string into a concrete value.
pub type ParseFn<T> = fn(&str) -> Result<T, EnvVarParseError>;
/// Callback used to format a typed value before storing it in the environment.
pub type FormatFn<T> = fn(&T) -> Result<String, EnvVarFormatError>;

/// Descriptor for a strongly-typed environment variable.
#[derive(Clone, Copy)]
pub struct TypedEnvVar<T> {
    var: EnvVar,
    parse: ParseFn<T>,
    format: FormatFn<T>,
    _marker: PhantomData<T>,
}

impl<T> TypedEnvVar<T> {
    pub const fn new(var: EnvVar, parse: ParseFn<T>, format: FormatFn<T>) -> Self {
        Self {
            var,
            parse,
            format,
            _marker: PhantomData,
        }
    }

    /// Canonical environment variable key.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.var.key()
    }

    #[must_use]
    pub const fn var(&self) -> EnvVar {
        self.var
    }

    fn format_value(&self, value: &T) -> Result<String, EnvVarError> {
        (self.format)(value).map_err(|source| EnvVarError::Format { name: self.key(), source })
    }

    /// Read the environment variable and parse it into the typed value.
    ///
    /// Returns `Ok(None)` when the variable is unset.
    pub fn get(&self) -> Result<Option<T>, EnvVarError> {
        match Environment::get(self.var) {
            Some(raw) => (self.parse)(&raw).map(Some).map_err(|source| EnvVarError::Parse {
                name: self.key(),
                value: raw,
                source,
            }),
            None => Ok(None),
        }
    }

    /// Read the variable, falling back to `default` when it is unset.
    pub fn get_or(&self, default: T) -> Result<T, EnvVarError> {
        Ok(self.get()?.unwrap_or(default))
    }

    pub fn set(&self, value: T) -> Result<(), EnvVarError> {
        let formatted = self.format_value(&value)?;
        Environment::set(self.var, &formatted);
        Ok(())
    }

    pub fn unset(&self) {
        Environment::remove(self.var);
    }

    /// Set the environment variable for the lifetime of the returned guard.
    pub fn set_guard(&self, value: T) -> Result<TypedEnvVarGuard<'_, T>, EnvVarError> {
        let formatted = self.format_value(&value)?;
        let inner = EnvVarGuard::set(self.var, &formatted);
        Ok(TypedEnvVarGuard {
            _inner: inner,
            value,
            _marker: PhantomData,
        })
    }

    /// Unset the environment variable for the lifetime of the guard.
    #[must_use]
    pub fn unset_guard(&self) -> EnvVarGuard {
        EnvVarGuard::unset(self.var)
    }
}

/// Guard that restores the previous state of a typed environment variable.
pub struct TypedEnvVarGuard<'a, T> {
    _inner: EnvVarGuard,
    value: T,
    _marker: PhantomData<&'a TypedEnvVar<T>>,
}

impl<T> TypedEnvVarGuard<'_, T> {
    /// The typed value that was set.
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T> Deref for TypedEnvVarGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

pub(crate) fn parse_usize(value: &str) -> Result<usize, EnvVarParseError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|e| EnvVarParseError::new(format!("expected an unsigned integer: {e}")))
}

pub(crate) fn parse_u64(value: &str) -> Result<u64, EnvVarParseError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| EnvVarParseError::new(format!("expected an unsigned integer: {e}")))
}

pub(crate) fn format_display<T: std::fmt::Display>(value: &T) -> Result<String, EnvVarFormatError> {
    Ok(value.to_string())
}

pub(crate) fn parse_bool(value: &str) -> Result<bool, EnvVarParseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EnvVarParseError::new("value is not a recognised boolean")),
    }
}

#[path = "value.test.rs"]
mod tests;
