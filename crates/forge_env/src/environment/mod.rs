//! Process environment abstractions shared by the loader and logging bootstrap.

pub mod guard;
pub mod instrument;
pub mod loader;
pub mod value;

use std::sync::{Mutex, MutexGuard, OnceLock};

use instrument::InstrumentEnvVar;
use loader::LoaderEnvVar;

/// Namespaced environment variable identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnvVar {
    /// Variables controlling logging.
    Instrument(InstrumentEnvVar),
    /// Variables controlling archive parsing.
    Loader(LoaderEnvVar),
}

impl From<InstrumentEnvVar> for EnvVar {
    fn from(value: InstrumentEnvVar) -> Self {
        Self::Instrument(value)
    }
}

impl From<LoaderEnvVar> for EnvVar {
    fn from(value: LoaderEnvVar) -> Self {
        Self::Loader(value)
    }
}

impl EnvVar {
    /// Retrieve the canonical environment variable key for the identifier.
    pub const fn key(self) -> &'static str {
        match self {
            EnvVar::Instrument(inner) => inner.key(),
            EnvVar::Loader(inner) => inner.key(),
        }
    }
}

/// Process environment facade that centralises access and synchronisation.
pub struct Environment;

impl Environment {
    /// Acquire the global environment mutex, ensuring serialised mutations.
    pub fn lock() -> MutexGuard<'static, ()> {
        static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_MUTEX.get_or_init(|| Mutex::new(())).lock().expect("environment mutex poisoned")
    }

    /// Read the environment variable as a UTF-8 string if present.
    pub fn get(var: impl Into<EnvVar>) -> Option<String> {
        let var = var.into();
        std::env::var(var.key()).ok()
    }

    /// Set the environment variable using the provided UTF-8 value.
    ///
    /// Acquires the global environment mutex for the duration of the write.
    /// Use [`Environment::lock`] when several operations must share one
    /// critical section.
    pub fn set(var: impl Into<EnvVar>, value: &str) {
        let var = var.into();
        let mut guard = Self::lock();
        Self::set_locked(var, value, &mut guard);
    }

    /// Remove the environment variable from the process environment.
    pub fn remove(var: impl Into<EnvVar>) {
        let var = var.into();
        let mut guard = Self::lock();
        Self::remove_locked(var, &mut guard);
    }

    /// Set the environment variable while reusing an existing environment lock.
    pub(crate) fn set_locked(var: EnvVar, value: &str, _guard: &mut MutexGuard<'static, ()>) {
        // SAFETY: the guard proves the caller holds the global environment
        // mutex, so no other thread in this crate mutates the environment.
        unsafe { std::env::set_var(var.key(), value) };
    }

    /// Remove the environment variable while reusing an existing environment lock.
    pub(crate) fn remove_locked(var: EnvVar, _guard: &mut MutexGuard<'static, ()>) {
        // SAFETY: serialised by the guard parameter, as in `set_locked`.
        unsafe { std::env::remove_var(var.key()) };
    }
}
