//! Engine entity collaborator.
//!
//! The spawn core never creates or destroys entities itself. It talks to the
//! engine through the narrow [`World`] contract: deferred spawning,
//! destruction and capability queries. Capabilities are exposed by
//! [`Entity`] through optional accessors, so callers ask "is this drivable"
//! by calling `as_drivable_mut()` instead of testing concrete types.
//!
//! [`SimWorld`] is an in-memory implementation used by the game instance
//! when no external engine is attached, and by the tests.

mod capability;
pub mod entities;
mod sim_world;

pub use capability::{
    Autopilot, Drivable, Entity, LightState, Observer, Pawn, TrafficSignState, VehicleControl,
};
pub use sim_world::SimWorld;

use serde::{Deserialize, Serialize};

use crate::actors::ActorClass;
use crate::core::Transform;

/// Engine handle of a live entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityHandle(pub u64);

impl EntityHandle {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity#{}", self.0)
    }
}

/// The engine contract consumed by the spawn core.
///
/// ## Implementation Notes
///
/// - `spawn_deferred` returns `None` when the class cannot be instantiated.
///   The entity exists but is not fully constructed until `finish_spawning`.
/// - `destroy` returns `false` when the engine refuses to destroy the entity;
///   the entity then stays alive.
/// - `entities` lists fully spawned entities in handle order.
pub trait World {
    /// Begin spawning an entity of `class`.
    fn spawn_deferred(&mut self, class: &ActorClass, transform: &Transform) -> Option<EntityHandle>;

    /// Complete a deferred spawn.
    fn finish_spawning(&mut self, handle: EntityHandle, transform: &Transform);

    /// Destroy an entity.
    fn destroy(&mut self, handle: EntityHandle) -> bool;

    /// Access an entity's capabilities.
    fn entity(&self, handle: EntityHandle) -> Option<&(dyn Entity + 'static)>;

    /// Mutable access to an entity's capabilities.
    fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut (dyn Entity + 'static)>;

    /// Class the entity was spawned with.
    fn class_of(&self, handle: EntityHandle) -> Option<ActorClass>;

    /// Current placement of the entity.
    fn transform_of(&self, handle: EntityHandle) -> Option<Transform>;

    /// Entity is scheduled for removal and must not be used.
    fn is_pending_kill(&self, handle: EntityHandle) -> bool;

    /// All fully spawned entities.
    fn entities(&self) -> Vec<EntityHandle>;

    /// Pawn controlled by the local player, if any.
    fn player_pawn(&self) -> Option<EntityHandle>;

    /// Spawn and finish in one step.
    fn spawn(&mut self, class: &ActorClass, transform: &Transform) -> Option<EntityHandle> {
        let handle = self.spawn_deferred(class, transform)?;
        self.finish_spawning(handle, transform);
        Some(handle)
    }

    /// Controller attached to a pawn-like entity.
    fn controller_of(&self, handle: EntityHandle) -> Option<EntityHandle> {
        self.entity(handle)?.as_pawn()?.controller()
    }
}
