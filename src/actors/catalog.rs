//! Definition catalog.
//!
//! The `DefinitionCatalog` stores every spawnable kind in registration
//! order. Registration validates the definition and assigns its `uid`:
//! `1..=N` with no gaps. Rejected definitions consume no uid. Definitions
//! are immutable once registered and can't be removed.

use tracing::warn;

use super::definition::{ActorClass, ActorDefinition, DefinitionError};
use crate::core::DefinitionId;

/// Ordered catalog of actor definitions.
///
/// ## Example
///
/// ```
/// use sim_actors::actors::{ActorDefinition, DefinitionCatalog};
/// use sim_actors::core::DefinitionId;
///
/// let mut catalog = DefinitionCatalog::new();
///
/// let a = catalog.register(ActorDefinition::new("vehicle.a", "WheeledVehicle")).unwrap();
/// let bad = catalog.register(ActorDefinition::new("", "WheeledVehicle"));
/// let c = catalog.register(ActorDefinition::new("vehicle.c", "WheeledVehicle")).unwrap();
///
/// assert!(bad.is_err());
/// assert_eq!((a, c), (DefinitionId::new(1), DefinitionId::new(2)));
/// ```
#[derive(Clone, Debug, Default)]
pub struct DefinitionCatalog {
    definitions: Vec<ActorDefinition>,
}

impl DefinitionCatalog {
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a definition.
    ///
    /// Returns the assigned uid. On failure nothing is stored.
    pub fn register(&mut self, mut definition: ActorDefinition) -> Result<DefinitionId, DefinitionError> {
        if let Err(err) = definition.validate() {
            warn!("Invalid definition '{}' ignored: {}", definition.id, err);
            return Err(err);
        }
        let uid = DefinitionId::new(self.definitions.len() as u32 + 1);
        definition.uid = uid;
        self.definitions.push(definition);
        Ok(uid)
    }

    /// Get a definition by uid.
    #[must_use]
    pub fn get(&self, uid: DefinitionId) -> Option<&ActorDefinition> {
        uid.index().and_then(|i| self.definitions.get(i))
    }

    /// Class to instantiate for `uid`.
    #[must_use]
    pub fn class_of(&self, uid: DefinitionId) -> Option<&ActorClass> {
        self.get(uid).map(|d| &d.class)
    }

    /// Find a definition by its string id.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&ActorDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Check if `uid` is in `[1, N]`.
    #[must_use]
    pub fn contains(&self, uid: DefinitionId) -> bool {
        self.get(uid).is_some()
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// All definitions in uid order.
    #[must_use]
    pub fn definitions(&self) -> &[ActorDefinition] {
        &self.definitions
    }

    /// Find definitions carrying `tag`.
    pub fn find_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a ActorDefinition> + 'a {
        self.definitions.iter().filter(move |d| d.has_tag(tag))
    }
}
