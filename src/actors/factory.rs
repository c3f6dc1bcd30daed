//! Creation functions and factories.
//!
//! A creation function turns `(transform, description)` into an entity in
//! the world. Factories group the definitions they know how to create with
//! the code that creates them; binding a factory registers every definition
//! with a creation function that delegates back to the factory.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::definition::ActorDefinition;
use super::description::ActorDescription;
use crate::core::Transform;
use crate::world::{EntityHandle, World};

/// Outcome of a spawn request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnStatus {
    /// The actor was created and registered.
    Success,

    /// The description does not resolve to a catalog entry.
    InvalidDescription,

    /// The engine refused to place the entity.
    Collision,

    /// The creation function misbehaved.
    UnknownError,

    /// A client ran out of provisional ids.
    IdSpaceExhausted,
}

impl SpawnStatus {
    #[must_use]
    pub fn is_success(self) -> bool {
        self == SpawnStatus::Success
    }
}

impl std::fmt::Display for SpawnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SpawnStatus::Success => "success",
            SpawnStatus::InvalidDescription => "invalid description",
            SpawnStatus::Collision => "collision",
            SpawnStatus::UnknownError => "unknown error",
            SpawnStatus::IdSpaceExhausted => "provisional id space exhausted",
        };
        f.write_str(text)
    }
}

/// What a creation function returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActorSpawnResult {
    pub status: SpawnStatus,
    pub actor: Option<EntityHandle>,
}

impl ActorSpawnResult {
    #[must_use]
    pub fn success(actor: EntityHandle) -> Self {
        Self {
            status: SpawnStatus::Success,
            actor: Some(actor),
        }
    }

    #[must_use]
    pub fn failure(status: SpawnStatus) -> Self {
        Self { status, actor: None }
    }

    /// Success with an entity.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.status.is_success() && self.actor.is_some()
    }
}

/// A creation function stored by the dispatcher.
pub type SpawnFunction =
    Box<dyn Fn(&mut dyn World, &Transform, &ActorDescription) -> ActorSpawnResult + Send + Sync>;

/// A source of definitions that also knows how to create them.
pub trait ActorFactory: Send + Sync {
    /// Definitions this factory can create.
    fn definitions(&self) -> Vec<ActorDefinition>;

    /// Create the entity for `description`.
    ///
    /// `description.class` has already been set from the catalog.
    fn spawn_actor(
        &self,
        world: &mut dyn World,
        transform: &Transform,
        description: &ActorDescription,
    ) -> ActorSpawnResult;
}

/// Wrap a shared factory as a creation function.
pub(crate) fn factory_spawn_function(factory: Arc<dyn ActorFactory>) -> SpawnFunction {
    Box::new(
        move |world: &mut dyn World, transform: &Transform, description: &ActorDescription| {
            factory.spawn_actor(world, transform, description)
        },
    )
}
