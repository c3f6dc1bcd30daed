//! Spawn requests.
//!
//! An `ActorDescription` names a definition by `uid` and carries the values
//! chosen for its variations. Descriptions are built per spawn call and
//! consumed by a single dispatch. The `class` field is overwritten by the
//! dispatcher from the catalog; whatever a caller puts there is ignored.

use serde::{Deserialize, Serialize};

use super::attributes::{ActorAttribute, AttributeType, Variations};
use super::definition::{ActorClass, ActorDefinition};
use crate::core::DefinitionId;

/// Prefix shared by every sensor definition id.
pub const SENSOR_PREFIX: &str = "sensor.";

/// A spawn request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorDescription {
    /// Human-readable id, normally the definition id.
    pub id: String,

    /// Definition this request resolves against (`UNRESOLVED` = none).
    pub uid: DefinitionId,

    /// Filled in by the dispatcher from the catalog.
    pub class: ActorClass,

    /// Chosen attribute values.
    pub variations: Variations,
}

impl ActorDescription {
    /// Create an unresolved description with just an id.
    ///
    /// Used for entities registered outside the catalog (spectator,
    /// level-placed traffic signs).
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Create a description for `definition`, with every variation set to its
    /// first recommended value and every fixed attribute copied.
    #[must_use]
    pub fn from_definition(definition: &ActorDefinition) -> Self {
        let mut variations = Variations::default();
        for attr in definition
            .variations
            .iter()
            .filter_map(|v| v.default_attribute())
            .chain(definition.attributes.iter().cloned())
        {
            variations.insert(attr.id.clone(), attr);
        }
        Self {
            id: definition.id.clone(),
            uid: definition.uid,
            class: ActorClass::default(),
            variations,
        }
    }

    /// Point at a definition by uid (builder pattern).
    #[must_use]
    pub fn with_uid(mut self, uid: DefinitionId) -> Self {
        self.uid = uid;
        self
    }

    /// Set a variation value (builder pattern).
    #[must_use]
    pub fn with_variation(
        mut self,
        id: impl Into<String>,
        ty: AttributeType,
        value: impl Into<String>,
    ) -> Self {
        let attr = ActorAttribute::new(id, ty, value);
        self.variations.insert(attr.id.clone(), attr);
        self
    }

    /// Get a variation value.
    #[must_use]
    pub fn variation(&self, id: &str) -> Option<&ActorAttribute> {
        self.variations.get(id)
    }

    /// Sensors are always spawned locally, whatever the authority.
    #[must_use]
    pub fn is_sensor(&self) -> bool {
        self.id.starts_with(SENSOR_PREFIX)
    }

    /// The `role_name` variation, if set.
    #[must_use]
    pub fn role_name(&self) -> Option<&str> {
        self.variation("role_name").map(ActorAttribute::as_str)
    }
}
