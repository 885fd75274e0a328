//! Scoped overrides of loader and logging variables.

use std::sync::MutexGuard;

use super::{EnvVar, Environment};

/// Holds a variable at an overridden value (or unset) until dropped, then
/// puts back whatever was there before.
pub struct EnvVarGuard {
    var: EnvVar,
    previous: Option<String>,
}

impl EnvVarGuard {
    pub fn set(var: impl Into<EnvVar>, value: &str) -> Self {
        Self::replace(var.into(), Some(value))
    }

    pub fn unset(var: impl Into<EnvVar>) -> Self {
        Self::replace(var.into(), None)
    }

    /// Read and overwrite under one lock so concurrent guards cannot
    /// interleave between the two steps.
    fn replace(var: EnvVar, value: Option<&str>) -> Self {
        let mut lock = Environment::lock();
        let previous = Environment::get(var);
        write(var, value, &mut lock);
        Self { var, previous }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        let mut lock = Environment::lock();
        write(self.var, self.previous.as_deref(), &mut lock);
    }
}

fn write(var: EnvVar, value: Option<&str>, lock: &mut MutexGuard<'static, ()>) {
    match value {
        Some(value) => Environment::set_locked(var, value, lock),
        None => Environment::remove_locked(var, lock),
    }
}

#[path = "guard.test.rs"]
mod tests;
