//! Process-wide logging setup.
//!
//! The library only emits `tracing` events. Binaries and integration
//! harnesses call [`init_logging`] once to install a subscriber: a stdout
//! layer, optionally mirrored to a log file.

use std::fs::{self, File};
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::core::LoggingConfig;

/// Errors raised while installing the subscriber.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("failed to open log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Filter directive string for a level: `"<level>,sim_actors=<level>"`.
#[must_use]
pub fn filter_directive(level: &str) -> String {
    format!("{level},sim_actors={level}")
}

/// Install the global subscriber.
///
/// Fails instead of panicking when a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::builder().parse(filter_directive(&config.level))?;

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_ansi(config.ansi);

    let file_layer = match &config.file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive("debug"), "debug,sim_actors=debug");
        assert!(EnvFilter::builder().parse(filter_directive("warn")).is_ok());
    }

    #[test]
    fn test_bad_level_rejected() {
        let config = LoggingConfig {
            level: "not a level!".to_string(),
            ..Default::default()
        };
        assert!(matches!(init_logging(&config), Err(LoggingError::Filter(_))));
    }

    #[test]
    fn test_second_init_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            level: "debug".to_string(),
            file: Some(dir.path().join("logs").join("sim.log")),
            ansi: false,
        };

        // Another test binary thread may have installed one already; either
        // way the second call must fail cleanly.
        let _ = init_logging(&config);
        assert!(matches!(
            init_logging(&config),
            Err(LoggingError::AlreadyInitialized(_))
        ));
    }
}
