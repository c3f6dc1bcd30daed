//! Core types: identifiers, geometry values, configuration.
//!
//! Nothing in here depends on the rest of the crate.

pub mod config;
pub mod geom;
pub mod id;

pub use config::{default_rpc_worker_threads, ConfigError, LoggingConfig, SimulationConfig};
pub use geom::{Location, Rotation, Transform, Vector3D};
pub use id::{ActorId, ClientOrdinal, DefinitionId, EpisodeId, EpisodeIdAllocator, PARTITION_SIZE};
