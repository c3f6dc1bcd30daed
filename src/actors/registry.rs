//! Actor registry - live actors by id and by entity handle.
//!
//! The `ActorRegistry` tracks every live actor the episode knows about:
//! spawned ones and level entities registered at begin-play. Destruction is
//! triggered by entity handle, so the registry keeps a reverse index from
//! handle to id.
//!
//! Ids are allocated sequentially from 1 and never reused. Entries are
//! removed synchronously when an actor is destroyed.
//!
//! Views are stored in a persistent map so `snapshot()` is O(1) and can be
//! handed to observers while the registry keeps changing.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use super::description::ActorDescription;
use super::view::ActorView;
use crate::core::ActorId;
use crate::world::EntityHandle;

/// Live actors keyed by id, with a reverse index by entity handle.
#[derive(Clone, Debug)]
pub struct ActorRegistry {
    views: im::OrdMap<ActorId, ActorView>,
    by_handle: FxHashMap<EntityHandle, ActorId>,
    next_id: u32,
}

impl Default for ActorRegistry {
    fn default() -> Self {
        Self {
            views: im::OrdMap::new(),
            by_handle: FxHashMap::default(),
            next_id: 1,
        }
    }
}

impl ActorRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live entity.
    ///
    /// Returns an invalid view if the handle is already registered.
    pub fn register(&mut self, handle: EntityHandle, description: ActorDescription) -> ActorView {
        if self.by_handle.contains_key(&handle) {
            warn!(
                "Entity {} is already registered, ignoring '{}'",
                handle, description.id
            );
            return ActorView::invalid();
        }

        let id = ActorId::new(self.next_id);
        self.next_id += 1;

        let view = ActorView::new(id, handle, Arc::new(description));
        self.views.insert(id, view.clone());
        self.by_handle.insert(handle, id);
        trace!("Registered {} as {}", handle, id);
        view
    }

    /// Remove the actor bound to `handle`.
    ///
    /// Returns the removed view, or `None` if the handle wasn't registered.
    pub fn deregister(&mut self, handle: EntityHandle) -> Option<ActorView> {
        let id = self.by_handle.remove(&handle)?;
        let view = self.views.remove(&id);
        debug_assert!(view.is_some(), "reverse index out of sync for {}", id);
        view
    }

    /// Find an actor by id.
    #[must_use]
    pub fn find(&self, id: ActorId) -> Option<&ActorView> {
        self.views.get(&id)
    }

    /// Find an actor by entity handle.
    #[must_use]
    pub fn find_by_handle(&self, handle: EntityHandle) -> Option<&ActorView> {
        self.by_handle.get(&handle).and_then(|id| self.views.get(id))
    }

    /// Check if an id is registered.
    #[must_use]
    pub fn contains(&self, id: ActorId) -> bool {
        self.views.contains_key(&id)
    }

    /// Check if an entity handle is registered.
    #[must_use]
    pub fn contains_handle(&self, handle: EntityHandle) -> bool {
        self.by_handle.contains_key(&handle)
    }

    /// Number of live actors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Iterate over live actors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ActorView> {
        self.views.values()
    }

    /// Cheap copy of the current id -> view map.
    #[must_use]
    pub fn snapshot(&self) -> im::OrdMap<ActorId, ActorView> {
        self.views.clone()
    }
}
