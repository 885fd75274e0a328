//! Logging bootstrap driven by [`LOG_LEVEL`].
//!
//! Library code never installs a subscriber itself; binaries and tests call
//! [`init_from_env`] once and the loader emits events through whatever span
//! it is handed.

use std::sync::OnceLock;

use tracing::Level;

use crate::environment::{instrument::LOG_LEVEL, value::EnvVarError};

/// Logging configuration resolved from the process environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LogConfig {
    /// Load configuration from `FORGE_LOG_LEVEL`, defaulting to INFO.
    pub fn from_env() -> Result<Self, EnvVarError> {
        let level = LOG_LEVEL.get_or(Level::INFO)?;
        Ok(Self { level })
    }

    /// Install a global fmt subscriber at the configured level.
    ///
    /// Returns `false` when a global subscriber was already installed.
    pub fn install(&self) -> bool {
        tracing_subscriber::fmt()
            .with_max_level(self.level)
            .with_target(true)
            .try_init()
            .is_ok()
    }
}

/// Initialise logging from the environment once per process.
///
/// Subsequent calls return the configuration resolved by the first call.
pub fn init_from_env() -> Result<LogConfig, EnvVarError> {
    static INSTALLED: OnceLock<LogConfig> = OnceLock::new();
    if let Some(config) = INSTALLED.get() {
        return Ok(*config);
    }
    let config = LogConfig::from_env()?;
    config.install();
    Ok(*INSTALLED.get_or_init(|| config))
}

#[path = "logging.test.rs"]
mod tests;
