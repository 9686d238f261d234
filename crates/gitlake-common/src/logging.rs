//! Logging configuration and initialization
//!
//! Centralized tracing setup for GitLake binaries. Library code never calls
//! `println!`; it emits structured events through `tracing` macros and the
//! binary installs a subscriber once at startup.
//!
//! # Example
//!
//! ```no_run
//! use gitlake_common::logging::{init_logging, LogConfig, LogLevel};
//!
//! let config = LogConfig::from_env().unwrap_or_else(|_| LogConfig::new(LogLevel::Info));
//! init_logging(&config).unwrap();
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log level for filtering messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing Level
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(anyhow::anyhow!("Invalid log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LogConfig {
    /// Minimum level emitted when RUST_LOG is unset
    pub level: LogLevel,
    /// Emit JSON-formatted events instead of compact text
    pub json: bool,
}

impl LogConfig {
    pub fn new(level: LogLevel) -> Self {
        Self { level, json: false }
    }

    /// Load configuration from GITLAKE_LOG_LEVEL / GITLAKE_LOG_FORMAT.
    pub fn from_env() -> Result<Self> {
        let level = match std::env::var("GITLAKE_LOG_LEVEL") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("Invalid GITLAKE_LOG_LEVEL: {}", value))?,
            Err(_) => LogLevel::default(),
        };

        let json = std::env::var("GITLAKE_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self { level, json })
    }

    /// Lower the level to `Debug` when a CLI verbose flag is set. The flag
    /// wins over any environment-configured level.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        if verbose {
            self.level = LogLevel::Debug;
        }
        self
    }
}

/// Initialize the global tracing subscriber.
///
/// RUST_LOG takes precedence over the configured level. Returns an error if a
/// subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .context("Failed to initialize JSON logging")?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
            .context("Failed to initialize logging")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parses_known_values() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn verbose_flag_lowers_the_level_to_debug() {
        let config = LogConfig::new(LogLevel::Info).with_verbose(true);
        assert_eq!(config.level, LogLevel::Debug);

        // Verbose overrides even an explicitly raised level.
        let config = LogConfig::new(LogLevel::Warn).with_verbose(true);
        assert_eq!(config.level, LogLevel::Debug);
    }

    #[test]
    fn without_verbose_the_configured_level_stands() {
        let config = LogConfig::new(LogLevel::Warn).with_verbose(false);
        assert_eq!(config.level, LogLevel::Warn);
    }

    #[test]
    fn log_level_display_round_trips() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
        ] {
            assert_eq!(level.to_string().parse::<LogLevel>().unwrap(), level);
        }
    }
}
