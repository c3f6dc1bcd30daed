//! Simulation configuration.
//!
//! The game instance is configured once at startup with a
//! `SimulationConfig`. Configuration is plain serde data, usually read from
//! a JSON settings file; every field has a default so partial files work.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::PARTITION_SIZE;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum level: "trace", "debug", "info", "warn" or "error".
    pub level: String,

    /// Mirror logs to this file in addition to stdout.
    pub file: Option<std::path::PathBuf>,

    /// Colored stdout output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            ansi: true,
        }
    }
}

/// Configuration for a simulation process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Name of the map the episode runs on.
    pub map_name: String,

    /// Base port for the RPC server. The actual port adds a random offset.
    pub world_port: u16,

    /// Start the RPC server at the beginning of an episode.
    pub use_networking: bool,

    /// Provisional ids reserved per client.
    /// Also the hard ceiling on spawns a client can request per session.
    pub partition_size: u32,

    /// RPC worker threads. `None` = `max(available cores, 4) - 2`.
    pub rpc_worker_threads: Option<usize>,

    /// Seed for the port offset RNG.
    pub port_seed: u64,

    pub logging: LoggingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            map_name: String::new(),
            world_port: 2000,
            use_networking: true,
            partition_size: PARTITION_SIZE,
            rpc_worker_threads: None,
            port_seed: 42,
            logging: LoggingConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse from a JSON string and validate.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the rest of the system cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.partition_size < 2 {
            return Err(ConfigError::Invalid(format!(
                "partition_size must be at least 2, got {}",
                self.partition_size
            )));
        }
        if self.rpc_worker_threads == Some(0) {
            return Err(ConfigError::Invalid(
                "rpc_worker_threads must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective number of RPC worker threads.
    #[must_use]
    pub fn rpc_worker_threads(&self) -> usize {
        self.rpc_worker_threads.unwrap_or_else(default_rpc_worker_threads)
    }

    /// Set the map name.
    #[must_use]
    pub fn with_map_name(mut self, map_name: impl Into<String>) -> Self {
        self.map_name = map_name.into();
        self
    }

    /// Set the base port.
    #[must_use]
    pub fn with_world_port(mut self, port: u16) -> Self {
        self.world_port = port;
        self
    }

    /// Enable or disable the RPC server.
    #[must_use]
    pub fn with_networking(mut self, enabled: bool) -> Self {
        self.use_networking = enabled;
        self
    }

    /// Set the provisional id partition size.
    #[must_use]
    pub fn with_partition_size(mut self, size: u32) -> Self {
        self.partition_size = size;
        self
    }

    /// Set the worker pool size.
    #[must_use]
    pub fn with_rpc_worker_threads(mut self, threads: usize) -> Self {
        self.rpc_worker_threads = Some(threads);
        self
    }

    /// Set the port offset seed.
    #[must_use]
    pub fn with_port_seed(mut self, seed: u64) -> Self {
        self.port_seed = seed;
        self
    }
}

/// `max(hardware concurrency, 4) - 2`, so never fewer than 2 workers.
#[must_use]
pub fn default_rpc_worker_threads() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cores.max(4) - 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.world_port, 2000);
        assert_eq!(config.partition_size, 10_000);
        assert!(config.use_networking);
        assert!(config.rpc_worker_threads() >= 2);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SimulationConfig::default()
            .with_map_name("Town01")
            .with_world_port(3000)
            .with_networking(false)
            .with_rpc_worker_threads(3);

        assert_eq!(config.map_name, "Town01");
        assert_eq!(config.world_port, 3000);
        assert!(!config.use_networking);
        assert_eq!(config.rpc_worker_threads(), 3);
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config = SimulationConfig::from_json_str(r#"{ "map_name": "Town02", "extra": 1 }"#)
            .unwrap();
        assert_eq!(config.map_name, "Town02");
        assert_eq!(config.world_port, 2000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SimulationConfig::from_json_str(r#"{ "partition_size": 1 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SimulationConfig::from_json_str(r#"{ "rpc_worker_threads": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SimulationConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "world_port": 2500 }"#).unwrap();

        let config = SimulationConfig::load(&path).unwrap();
        assert_eq!(config.world_port, 2500);

        let missing = SimulationConfig::load(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_default_worker_threads_floor() {
        assert!(default_rpc_worker_threads() >= 2);
    }
}
