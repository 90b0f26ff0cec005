//! Logging setup.
//!
//! The library only emits `tracing` events; the binary installs a
//! `tracing_subscriber` formatter through [`init_logging`]. `RUST_LOG`
//! takes precedence over the level passed in.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::error::DashError;

/// Log levels matching common logging conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(DashError::invalid_param(
                "log-level",
                format!("unknown level '{}'", other),
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter used when `RUST_LOG` is unset: our crate at `level`, polars quieter.
pub fn default_filter(level: LogLevel) -> String {
    format!("warn,movie_dash={}", level)
}

/// Install the global fmt subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_levels() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(LogLevel::Debug), "warn,movie_dash=debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(LogLevel::Error);
        init_logging(LogLevel::Debug);
    }
}
