//! # sim-actors
//!
//! Actor catalog, spawn dispatch and server-authoritative spawning for a
//! driving simulation.
//!
//! ## Design Principles
//!
//! 1. **Catalog-Driven**: Spawnable kinds are registered at startup as
//!    definitions with dense numeric `uid`s. Spawn requests name a `uid`;
//!    the class to instantiate is always looked up, never trusted.
//!
//! 2. **Consistent Results**: A spawn returns a status and a view; any
//!    status other than `Success` comes with an invalid view.
//!
//! 3. **Single Writer**: The catalog, registry and episode are mutated only
//!    on the tick thread. RPC workers move bytes and queue requests.
//!
//! ## Architecture
//!
//! - **Authority Split**: The server creates entities. Clients forward spawn
//!   requests and get a provisional view at once, with an id from their own
//!   partition so concurrent clients never collide.
//!
//! - **Capabilities, Not Casts**: Entities expose what they can do through
//!   optional accessors (`as_drivable_mut`, `as_pawn`, ...).
//!
//! - **Persistent Registry**: O(1) registry snapshots via `im-rs`.
//!
//! ## Modules
//!
//! - `core`: Ids, geometry values, configuration
//! - `actors`: Definitions, descriptions, dispatcher, registry, factories
//! - `world`: Engine contract, entity capabilities, in-memory world
//! - `game`: Episode, game instance, world observer
//! - `net`: RPC messages, codec, server, client session
//! - `logging`: Subscriber setup

pub mod actors;
pub mod core;
pub mod game;
pub mod logging;
pub mod net;
pub mod world;

// Re-export commonly used types
pub use crate::core::{
    ActorId, ClientOrdinal, ConfigError, DefinitionId, EpisodeId, Location, LoggingConfig,
    Rotation, SimulationConfig, Transform, Vector3D, PARTITION_SIZE,
};

pub use crate::actors::{
    ActorClass, ActorDefinition, ActorDescription, ActorDispatcher, ActorFactory, ActorRegistry,
    ActorSpawnResult, ActorView, DefinitionCatalog, DefinitionError, SensorFactory, SpawnStatus,
    VehicleFactory,
};

pub use crate::world::{Entity, EntityHandle, SimWorld, VehicleControl, World};

pub use crate::game::{Episode, GameInstance, ObserverStream};

pub use crate::net::{
    ClientSession, ControlError, PlayerController, RpcServer, RpcTransport, TransportError,
};

pub use crate::logging::{init_logging, LoggingError};
