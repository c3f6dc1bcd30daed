//! Actor definitions - the catalog of spawnable kinds.
//!
//! `ActorDefinition` holds the immutable properties of a spawnable kind:
//! its string id (e.g. `"vehicle.tesla.model3"`), the engine class used to
//! create it, tags, variations and fixed attributes. The numeric `uid` is
//! assigned by the catalog at registration time; callers leave it unset.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::attributes::{ActorAttribute, ActorVariation, AttributeType};
use crate::core::DefinitionId;

/// Opaque engine class handle.
///
/// The engine decides what a class means. The catalog only stores it and
/// hands it back to the creation function.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorClass(pub String);

impl ActorClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ActorClass {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for ActorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a definition failed the structural check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("invalid id '{0}'")]
    InvalidId(String),

    #[error("definition '{0}' has no class")]
    MissingClass(String),

    #[error("definition '{definition}' has invalid tags '{tags}'")]
    InvalidTags { definition: String, tags: String },

    #[error("definition '{definition}' declares attribute '{attribute}' more than once")]
    DuplicateAttribute { definition: String, attribute: String },

    #[error("attribute '{attribute}' has value '{value}' which is not a valid {ty}")]
    InvalidValue {
        attribute: String,
        value: String,
        ty: AttributeType,
    },

    #[error("attribute '{0}' is restricted to recommended values but has none")]
    NoRecommendedValues(String),
}

/// Static description of a spawnable kind.
///
/// ## Example
///
/// ```
/// use sim_actors::actors::{ActorDefinition, ActorVariation, AttributeType};
///
/// let def = ActorDefinition::new("vehicle.audi.tt", "WheeledVehicle")
///     .with_tags("vehicle,audi")
///     .with_variation(ActorVariation::new("color", AttributeType::RgbColor).recommend("255,0,0"));
///
/// assert!(def.validate().is_ok());
/// assert!(def.has_tag("audi"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorDefinition {
    /// Assigned by the catalog, `UNRESOLVED` until then.
    pub uid: DefinitionId,

    /// Human-readable id, e.g. `"sensor.camera.rgb"`.
    pub id: String,

    /// Engine class to instantiate.
    pub class: ActorClass,

    /// Comma-separated tags.
    pub tags: String,

    /// Customizable slots.
    pub variations: Vec<ActorVariation>,

    /// Fixed attributes.
    pub attributes: Vec<ActorAttribute>,
}

impl ActorDefinition {
    /// Create a new definition.
    pub fn new(id: impl Into<String>, class: impl Into<ActorClass>) -> Self {
        Self {
            uid: DefinitionId::UNRESOLVED,
            id: id.into(),
            class: class.into(),
            tags: String::new(),
            variations: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Set tags (builder pattern).
    #[must_use]
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Add a variation (builder pattern).
    #[must_use]
    pub fn with_variation(mut self, variation: ActorVariation) -> Self {
        self.variations.push(variation);
        self
    }

    /// Add a fixed attribute (builder pattern).
    #[must_use]
    pub fn with_attribute(mut self, attribute: ActorAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Check whether the definition carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.split(',').any(|t| t.trim() == tag)
    }

    /// Look up a variation by id.
    #[must_use]
    pub fn variation(&self, id: &str) -> Option<&ActorVariation> {
        self.variations.iter().find(|v| v.id == id)
    }

    /// Structural check run before registration.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if !is_valid_id(&self.id) {
            return Err(DefinitionError::InvalidId(self.id.clone()));
        }
        if self.class.is_empty() {
            return Err(DefinitionError::MissingClass(self.id.clone()));
        }
        if !self.tags.is_empty() && !self.tags.split(',').all(|t| is_valid_id(t.trim())) {
            return Err(DefinitionError::InvalidTags {
                definition: self.id.clone(),
                tags: self.tags.clone(),
            });
        }

        let mut seen: Vec<&str> = Vec::new();
        let ids = self
            .variations
            .iter()
            .map(|v| v.id.as_str())
            .chain(self.attributes.iter().map(|a| a.id.as_str()));
        for id in ids {
            if !is_valid_id(id) {
                return Err(DefinitionError::InvalidId(id.to_string()));
            }
            if seen.contains(&id) {
                return Err(DefinitionError::DuplicateAttribute {
                    definition: self.id.clone(),
                    attribute: id.to_string(),
                });
            }
            seen.push(id);
        }

        for variation in &self.variations {
            if variation.restrict_to_recommended && variation.recommended_values.is_empty() {
                return Err(DefinitionError::NoRecommendedValues(variation.id.clone()));
            }
            if let Some(bad) = variation
                .recommended_values
                .iter()
                .find(|v| !variation.ty.accepts(v))
            {
                return Err(DefinitionError::InvalidValue {
                    attribute: variation.id.clone(),
                    value: bad.clone(),
                    ty: variation.ty,
                });
            }
        }

        if let Some(bad) = self.attributes.iter().find(|a| !a.is_valid()) {
            return Err(DefinitionError::InvalidValue {
                attribute: bad.id.clone(),
                value: bad.value.clone(),
                ty: bad.ty,
            });
        }

        Ok(())
    }
}

/// Ids are non-empty and free of whitespace and commas.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && !id.chars().any(|c| c.is_whitespace() || c == ',')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> ActorDefinition {
        ActorDefinition::new("sensor.camera.rgb", "SceneCapture")
            .with_tags("sensor,camera")
            .with_variation(ActorVariation::new("fov", AttributeType::Float).recommend("90"))
            .with_attribute(ActorAttribute::new("lens", AttributeType::String, "pinhole"))
    }

    #[test]
    fn test_valid_definition() {
        let def = camera();
        assert!(def.validate().is_ok());
        assert_eq!(def.uid, DefinitionId::UNRESOLVED);
        assert!(def.has_tag("camera"));
        assert!(!def.has_tag("vehicle"));
        assert!(def.variation("fov").is_some());
    }

    #[test]
    fn test_invalid_ids() {
        let def = ActorDefinition::new("", "X");
        assert_eq!(def.validate(), Err(DefinitionError::InvalidId(String::new())));

        let def = ActorDefinition::new("has space", "X");
        assert!(matches!(def.validate(), Err(DefinitionError::InvalidId(_))));
    }

    #[test]
    fn test_missing_class() {
        let def = ActorDefinition::new("walker.pedestrian", "");
        assert!(matches!(def.validate(), Err(DefinitionError::MissingClass(_))));
    }

    #[test]
    fn test_bad_tags() {
        let def = camera().with_tags("sensor,,camera");
        assert!(matches!(def.validate(), Err(DefinitionError::InvalidTags { .. })));
    }

    #[test]
    fn test_duplicate_attribute() {
        let def = camera().with_attribute(ActorAttribute::new("fov", AttributeType::Float, "110"));
        assert!(matches!(
            def.validate(),
            Err(DefinitionError::DuplicateAttribute { .. })
        ));
    }

    #[test]
    fn test_bad_values() {
        let def = camera().with_variation(
            ActorVariation::new("image_size_x", AttributeType::Int).recommend("wide"),
        );
        assert!(matches!(def.validate(), Err(DefinitionError::InvalidValue { .. })));

        let def = camera().with_attribute(ActorAttribute::new("enabled", AttributeType::Bool, "1"));
        assert!(matches!(def.validate(), Err(DefinitionError::InvalidValue { .. })));

        let def = camera().with_variation(ActorVariation::new("mode", AttributeType::String).restricted());
        assert!(matches!(def.validate(), Err(DefinitionError::NoRecommendedValues(_))));
    }

    #[test]
    fn test_serialization() {
        let def = camera();
        let json = serde_json::to_string(&def).unwrap();
        let back: ActorDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(def, back);
    }
}
