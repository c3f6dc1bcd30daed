//! Actor dispatcher.
//!
//! The `ActorDispatcher` owns the definition catalog, an index-aligned table
//! of creation functions and the actor registry. It resolves spawn requests
//! to creation functions, registers what they create and tears actors down.
//!
//! ## Spawn contract
//!
//! - A description whose `uid` is not in `[1, N]` yields
//!   `InvalidDescription` and touches nothing.
//! - The description's class is always taken from the catalog.
//! - A creation function that reports success without an entity is
//!   downgraded to `UnknownError`.
//! - A non-`Success` status always comes with an invalid view.
//!
//! ## Destroy contract
//!
//! - The controller of a pawn-like actor is destroyed first; failure there
//!   is logged and does not stop the actor's own destruction.
//! - The registry entry is removed only if the engine destroyed the actor.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::catalog::DefinitionCatalog;
use super::definition::ActorDefinition;
use super::description::ActorDescription;
use super::factory::{factory_spawn_function, ActorFactory, ActorSpawnResult, SpawnFunction, SpawnStatus};
use super::registry::ActorRegistry;
use super::view::ActorView;
use crate::core::{DefinitionId, Transform};
use crate::world::{EntityHandle, World};

/// Resolves descriptions to creation functions and tracks what they create.
#[derive(Default)]
pub struct ActorDispatcher {
    catalog: DefinitionCatalog,
    spawn_functions: Vec<SpawnFunction>,
    registry: ActorRegistry,
}

impl std::fmt::Debug for ActorDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorDispatcher")
            .field("definitions", &self.catalog.len())
            .field("actors", &self.registry.len())
            .finish()
    }
}

impl ActorDispatcher {
    /// Create a dispatcher with an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition with its creation function.
    ///
    /// Invalid definitions are logged and discarded; they consume no uid.
    /// Returns the assigned uid on success.
    pub fn bind<F>(&mut self, definition: ActorDefinition, spawn: F) -> Option<DefinitionId>
    where
        F: Fn(&mut dyn World, &Transform, &ActorDescription) -> ActorSpawnResult + Send + Sync + 'static,
    {
        self.bind_boxed(definition, Box::new(spawn))
    }

    /// Register every definition a factory exposes.
    ///
    /// The factory stays the creator: each creation function holds a shared
    /// reference to it. Returns how many definitions were accepted.
    pub fn bind_factory(&mut self, factory: Arc<dyn ActorFactory>) -> usize {
        factory
            .definitions()
            .into_iter()
            .filter_map(|definition| {
                self.bind_boxed(definition, factory_spawn_function(Arc::clone(&factory)))
            })
            .count()
    }

    fn bind_boxed(&mut self, definition: ActorDefinition, spawn: SpawnFunction) -> Option<DefinitionId> {
        let uid = self.catalog.register(definition).ok()?;
        self.spawn_functions.push(spawn);
        debug_assert_eq!(self.catalog.len(), self.spawn_functions.len());
        Some(uid)
    }

    /// Spawn an actor for `description` at `transform`.
    ///
    /// Returns the status and a view that is valid iff the status is `Success`.
    pub fn spawn_actor(
        &mut self,
        world: &mut dyn World,
        transform: &Transform,
        mut description: ActorDescription,
    ) -> (SpawnStatus, ActorView) {
        let (index, class) = match description
            .uid
            .index()
            .zip(self.catalog.class_of(description.uid))
        {
            Some((index, class)) => (index, class.clone()),
            None => {
                error!(
                    "Invalid actor description '{}' ({})",
                    description.id, description.uid
                );
                return (SpawnStatus::InvalidDescription, ActorView::invalid());
            }
        };

        debug!("Spawning actor '{}'", description.id);

        description.class = class;
        let mut result = (self.spawn_functions[index])(world, transform, &description);

        if result.status.is_success() && result.actor.is_none() {
            warn!(
                "Creation function for '{}' reported success but did not return an actor",
                description.id
            );
            result.status = SpawnStatus::UnknownError;
        }

        let handle = match result.actor.filter(|_| result.is_valid()) {
            Some(handle) => handle,
            None => {
                warn!("Failed to spawn actor '{}': {}", description.id, result.status);
                return (result.status, ActorView::invalid());
            }
        };

        let view = self.registry.register(handle, description);
        if !view.is_valid() {
            error!("Spawned entity {} could not be registered", handle);
            debug_assert!(
                !result.status.is_success(),
                "successful spawn must produce a registrable entity"
            );
            return (SpawnStatus::UnknownError, ActorView::invalid());
        }

        if let (Some(drivable), Some(description)) = (
            world.entity_mut(handle).and_then(|e| e.as_drivable_mut()),
            view.description(),
        ) {
            drivable.set_description(description.clone());
        }

        (result.status, view)
    }

    /// Destroy an actor and forget it.
    ///
    /// Returns `false` for a missing handle, an actor this dispatcher does not
    /// know, or when the engine refuses; the registry is untouched then.
    pub fn destroy_actor(&mut self, world: &mut dyn World, handle: Option<EntityHandle>) -> bool {
        let Some(handle) = handle else {
            error!("Trying to destroy a null actor");
            return false;
        };

        let id = match self.registry.find_by_handle(handle) {
            Some(view) => view
                .description()
                .map(|d| d.id.clone())
                .unwrap_or_default(),
            None => {
                warn!("Trying to destroy actor {} that is not in the registry", handle);
                return false;
            }
        };

        if let Some(controller) = world.controller_of(handle) {
            info!("Destroying actor's controller: '{}'", id);
            if world.destroy(controller) {
                if let Some(pawn) = world.entity_mut(handle).and_then(|e| e.as_pawn_mut()) {
                    pawn.set_controller(None);
                }
            } else {
                error!("Failed to destroy actor's controller: '{}'", id);
            }
        }

        info!("Destroying actor: '{}'", id);
        if world.destroy(handle) {
            self.registry.deregister(handle);
            true
        } else {
            error!("Failed to destroy actor: '{}'", id);
            false
        }
    }

    /// All registered definitions in uid order.
    #[must_use]
    pub fn actor_definitions(&self) -> &[ActorDefinition] {
        self.catalog.definitions()
    }

    #[must_use]
    pub fn catalog(&self) -> &DefinitionCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    /// Direct registry access for entities created outside the catalog.
    pub fn registry_mut(&mut self) -> &mut ActorRegistry {
        &mut self.registry
    }
}
