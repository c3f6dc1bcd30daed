//! Actor views - the live binding of id, entity and description.
//!
//! A view is valid only when all three parts are present. The default view
//! is invalid and doubles as the "not found" / "spawn failed" value, so a
//! failed spawn never hands back a half-filled view.
//!
//! A *provisional* view is what a non-authoritative client gets back from a
//! forwarded spawn: an id from its own partition and the request, but no
//! entity (the entity lives on the server).

use std::sync::Arc;

use super::description::ActorDescription;
use crate::core::ActorId;
use crate::world::EntityHandle;

/// Id + entity handle + originating description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActorView {
    id: ActorId,
    handle: Option<EntityHandle>,
    description: Option<Arc<ActorDescription>>,
}

impl ActorView {
    /// A view over a live entity. Only the registry creates these.
    pub(crate) fn new(id: ActorId, handle: EntityHandle, description: Arc<ActorDescription>) -> Self {
        Self {
            id,
            handle: Some(handle),
            description: Some(description),
        }
    }

    /// A view with no entity behind it yet.
    #[must_use]
    pub fn provisional(id: ActorId, description: ActorDescription) -> Self {
        Self {
            id,
            handle: None,
            description: Some(Arc::new(description)),
        }
    }

    /// An invalid view.
    #[must_use]
    pub fn invalid() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    #[must_use]
    pub fn handle(&self) -> Option<EntityHandle> {
        self.handle
    }

    #[must_use]
    pub fn description(&self) -> Option<&ActorDescription> {
        self.description.as_deref()
    }

    /// Id, entity and description are all present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.id.is_none() && self.handle.is_some() && self.description.is_some()
    }

    /// Carries an id and a description but no entity.
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        !self.id.is_none() && self.handle.is_none() && self.description.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_invalid() {
        let view = ActorView::default();
        assert!(!view.is_valid());
        assert!(!view.is_provisional());
        assert_eq!(view.id(), ActorId::NONE);
        assert!(view.handle().is_none());
        assert!(view.description().is_none());
        assert_eq!(view, ActorView::invalid());
    }

    #[test]
    fn test_live_view() {
        let view = ActorView::new(
            ActorId(3),
            EntityHandle(9),
            Arc::new(ActorDescription::new("vehicle.audi.tt")),
        );
        assert!(view.is_valid());
        assert!(!view.is_provisional());
        assert_eq!(view.description().unwrap().id, "vehicle.audi.tt");
    }

    #[test]
    fn test_provisional_view() {
        let view = ActorView::provisional(ActorId(10_001), ActorDescription::new("vehicle.audi.tt"));
        assert!(!view.is_valid());
        assert!(view.is_provisional());
        assert_eq!(view.id(), ActorId(10_001));
    }

    #[test]
    fn test_clones_share_description() {
        let view = ActorView::provisional(ActorId(1), ActorDescription::new("x"));
        let copy = view.clone();
        assert!(std::ptr::eq(
            view.description().unwrap(),
            copy.description().unwrap()
        ));
    }
}
