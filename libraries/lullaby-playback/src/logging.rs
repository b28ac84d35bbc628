//! Logging policy
//!
//! Each controller carries its own [`Logger`] built from the injected
//! [`LoggingConfig`], so two mixers in one process can log differently.
//!
//! Rules:
//! - errors are always emitted
//! - warnings are emitted when logging is enabled
//! - info/debug are emitted when logging is enabled and verbose

use lullaby_core::{MixerError, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Logging options recognized by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit warnings (and, with `verbose`, informational messages)
    pub enabled: bool,

    /// Emit info and debug messages
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            verbose: false,
        }
    }
}

impl LoggingConfig {
    /// Most verbose level this policy lets through
    pub fn level_filter(&self) -> LevelFilter {
        match (self.enabled, self.verbose) {
            (false, _) => LevelFilter::ERROR,
            (true, false) => LevelFilter::WARN,
            (true, true) => LevelFilter::DEBUG,
        }
    }
}

/// Per-controller gate in front of the `tracing` macros
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Logger {
    config: LoggingConfig,
}

impl Logger {
    pub fn new(config: LoggingConfig) -> Self {
        Self { config }
    }

    /// Logger that only lets errors through
    pub fn quiet() -> Self {
        Self::new(LoggingConfig {
            enabled: false,
            verbose: false,
        })
    }

    pub fn config(&self) -> LoggingConfig {
        self.config
    }

    /// Whether an event at `level` should be emitted
    pub fn allows(&self, level: Level) -> bool {
        if level == Level::ERROR {
            true
        } else if level == Level::WARN {
            self.config.enabled
        } else {
            self.config.enabled && self.config.verbose
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level comes from `config`.
pub fn init_subscriber(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level_filter().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| MixerError::Config(e.to_string()))
}

/// `tracing::warn!` gated by a [`Logger`]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        if $logger.allows(::tracing::Level::WARN) {
            ::tracing::warn!($($arg)+);
        }
    };
}

/// `tracing::info!` gated by a [`Logger`]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        if $logger.allows(::tracing::Level::INFO) {
            ::tracing::info!($($arg)+);
        }
    };
}

/// `tracing::debug!` gated by a [`Logger`]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)+) => {
        if $logger.allows(::tracing::Level::DEBUG) {
            ::tracing::debug!($($arg)+);
        }
    };
}

pub(crate) use {log_debug, log_info, log_warn};
