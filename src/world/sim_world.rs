//! In-memory world.
//!
//! `SimWorld` owns entity objects in slots keyed by handle. Classes are
//! instantiated through registered builders, so `spawn_deferred` with an
//! unknown class fails the same way an engine would. Tests can also mark an
//! entity as protected (destroy refuses) or pending kill.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use super::capability::Entity;
use super::entities::{
    classes, ScriptedController, Sensor, SpectatorPawn, TrafficSign, VehicleAiController,
    WheeledVehicle,
};
use super::{EntityHandle, World};
use crate::actors::ActorClass;
use crate::core::Transform;
use crate::game::WorldObserver;

type EntityBuilder = Box<dyn Fn() -> Box<dyn Entity> + Send>;

#[derive(Debug)]
struct Slot {
    class: ActorClass,
    transform: Transform,
    entity: Box<dyn Entity>,
    spawning: bool,
    pending_kill: bool,
}

/// In-memory implementation of [`World`].
pub struct SimWorld {
    slots: FxHashMap<EntityHandle, Slot>,
    builders: FxHashMap<ActorClass, EntityBuilder>,
    protected: FxHashSet<EntityHandle>,
    player_pawn: Option<EntityHandle>,
    next_handle: u64,
}

impl std::fmt::Debug for SimWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimWorld")
            .field("entities", &self.slots.len())
            .field("classes", &self.builders.len())
            .field("player_pawn", &self.player_pawn)
            .finish()
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self {
            slots: FxHashMap::default(),
            builders: FxHashMap::default(),
            protected: FxHashSet::default(),
            player_pawn: None,
            next_handle: 1,
        }
    }
}

impl SimWorld {
    /// Create an empty world that knows no classes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a world with every built-in class registered.
    #[must_use]
    pub fn with_builtin_classes() -> Self {
        let mut world = Self::new();
        world.register_class(classes::WHEELED_VEHICLE, || Box::new(WheeledVehicle::new()));
        world.register_class(classes::VEHICLE_AI_CONTROLLER, || {
            Box::new(VehicleAiController::default())
        });
        world.register_class(classes::SCRIPTED_CONTROLLER, || {
            Box::new(ScriptedController::default())
        });
        world.register_class(classes::SENSOR, || Box::new(Sensor));
        world.register_class(classes::SPECTATOR, || Box::new(SpectatorPawn::default()));
        world.register_class(classes::TRAFFIC_SIGN, || Box::new(TrafficSign::default()));
        world.register_class(classes::WORLD_OBSERVER, || Box::new(WorldObserver::default()));
        world
    }

    /// Register how to instantiate `class`.
    pub fn register_class<F>(&mut self, class: impl Into<ActorClass>, builder: F)
    where
        F: Fn() -> Box<dyn Entity> + Send + 'static,
    {
        self.builders.insert(class.into(), Box::new(builder));
    }

    /// Place an already-built entity in the level.
    pub fn place(
        &mut self,
        class: impl Into<ActorClass>,
        transform: Transform,
        entity: Box<dyn Entity>,
    ) -> EntityHandle {
        let handle = self.allocate_handle();
        self.slots.insert(
            handle,
            Slot {
                class: class.into(),
                transform,
                entity,
                spawning: false,
                pending_kill: false,
            },
        );
        handle
    }

    /// Spawn the local player's pawn and remember it.
    pub fn spawn_player_pawn(&mut self, transform: Transform) -> Option<EntityHandle> {
        let handle = self.spawn(&ActorClass::new(classes::SPECTATOR), &transform)?;
        self.player_pawn = Some(handle);
        Some(handle)
    }

    pub fn set_player_pawn(&mut self, handle: Option<EntityHandle>) {
        self.player_pawn = handle;
    }

    /// Make `destroy` refuse this entity.
    pub fn protect(&mut self, handle: EntityHandle) {
        self.protected.insert(handle);
    }

    pub fn unprotect(&mut self, handle: EntityHandle) {
        self.protected.remove(&handle);
    }

    /// Schedule an entity for removal without destroying it yet.
    pub fn mark_pending_kill(&mut self, handle: EntityHandle) {
        if let Some(slot) = self.slots.get_mut(&handle) {
            slot.pending_kill = true;
        }
    }

    /// Check if a handle refers to an entity that still exists.
    #[must_use]
    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.slots.contains_key(&handle)
    }

    /// Number of entities, including ones still spawning.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn allocate_handle(&mut self) -> EntityHandle {
        let handle = EntityHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }
}

impl World for SimWorld {
    fn spawn_deferred(&mut self, class: &ActorClass, transform: &Transform) -> Option<EntityHandle> {
        let entity = match self.builders.get(class) {
            Some(build) => build(),
            None => {
                debug!("No builder for class '{}'", class);
                return None;
            }
        };
        let handle = self.allocate_handle();
        trace!("Deferred spawn of '{}' as {}", class, handle);
        self.slots.insert(
            handle,
            Slot {
                class: class.clone(),
                transform: *transform,
                entity,
                spawning: true,
                pending_kill: false,
            },
        );
        Some(handle)
    }

    fn finish_spawning(&mut self, handle: EntityHandle, transform: &Transform) {
        if let Some(slot) = self.slots.get_mut(&handle) {
            slot.transform = *transform;
            slot.spawning = false;
        }
    }

    fn destroy(&mut self, handle: EntityHandle) -> bool {
        if self.protected.contains(&handle) {
            return false;
        }
        if self.slots.remove(&handle).is_none() {
            return false;
        }
        if self.player_pawn == Some(handle) {
            self.player_pawn = None;
        }
        true
    }

    fn entity(&self, handle: EntityHandle) -> Option<&(dyn Entity + 'static)> {
        match self.slots.get(&handle) {
            Some(slot) => Some(slot.entity.as_ref()),
            None => None,
        }
    }

    fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut (dyn Entity + 'static)> {
        match self.slots.get_mut(&handle) {
            Some(slot) => Some(slot.entity.as_mut()),
            None => None,
        }
    }

    fn class_of(&self, handle: EntityHandle) -> Option<ActorClass> {
        self.slots.get(&handle).map(|s| s.class.clone())
    }

    fn transform_of(&self, handle: EntityHandle) -> Option<Transform> {
        self.slots.get(&handle).map(|s| s.transform)
    }

    fn is_pending_kill(&self, handle: EntityHandle) -> bool {
        self.slots.get(&handle).is_some_and(|s| s.pending_kill)
    }

    fn entities(&self) -> Vec<EntityHandle> {
        let mut handles: Vec<_> = self
            .slots
            .iter()
            .filter(|(_, slot)| !slot.spawning)
            .map(|(handle, _)| *handle)
            .collect();
        handles.sort();
        handles
    }

    fn player_pawn(&self) -> Option<EntityHandle> {
        self.player_pawn
    }
}
