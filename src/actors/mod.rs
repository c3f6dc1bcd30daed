//! Actor system: definitions, spawn requests, dispatch and the live registry.
//!
//! ## Key Types
//!
//! - `ActorDefinition`: A spawnable kind, with its variations and `uid`
//! - `DefinitionCatalog`: Ordered definitions, `uid`s dense in `1..=N`
//! - `ActorDescription`: A spawn request naming a definition by `uid`
//! - `ActorDispatcher`: Resolves requests to creation functions and destroys actors
//! - `ActorRegistry`: Live actors by id and by entity handle
//! - `ActorView`: The (id, entity, description) binding handed to callers
//!
//! ## Factories
//!
//! A factory exposes a list of definitions and creates entities for them.
//! `ActorDispatcher::bind_factory` registers every definition with a
//! creation function holding a shared reference to the factory.

pub mod attributes;
pub mod catalog;
pub mod definition;
pub mod description;
pub mod dispatcher;
pub mod factories;
pub mod factory;
pub mod registry;
pub mod view;

pub use attributes::{ActorAttribute, ActorVariation, AttributeType, RgbColor, Variations};
pub use catalog::DefinitionCatalog;
pub use definition::{ActorClass, ActorDefinition, DefinitionError};
pub use description::{ActorDescription, SENSOR_PREFIX};
pub use dispatcher::ActorDispatcher;
pub use factories::{ControllerKind, SensorFactory, VehicleFactory};
pub use factory::{ActorFactory, ActorSpawnResult, SpawnFunction, SpawnStatus};
pub use registry::ActorRegistry;
pub use view::ActorView;
