//! Actor attribute system.
//!
//! Definitions declare *variations* (customizable slots with their allowed
//! values) and fixed *attributes*. A spawn request carries the concrete
//! values chosen for each slot.
//!
//! All values travel as strings and are interpreted according to their
//! `AttributeType`, mirroring what external control bindings send.
//!
//! ## AttributeType values
//!
//! - `Bool`: `"true"` / `"false"`
//! - `Int`: 32-bit signed integer
//! - `Float`: 32-bit float
//! - `String`: anything
//! - `RgbColor`: `"r,g,b"` with each channel in `0..=255`

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// How an attribute value string is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    Bool,
    Int,
    Float,
    String,
    RgbColor,
}

impl AttributeType {
    /// Check whether `value` parses as this type.
    #[must_use]
    pub fn accepts(self, value: &str) -> bool {
        match self {
            AttributeType::Bool => parse_bool(value).is_some(),
            AttributeType::Int => value.trim().parse::<i32>().is_ok(),
            AttributeType::Float => value.trim().parse::<f32>().is_ok(),
            AttributeType::String => true,
            AttributeType::RgbColor => parse_color(value).is_some(),
        }
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AttributeType::Bool => "bool",
            AttributeType::Int => "int",
            AttributeType::Float => "float",
            AttributeType::String => "string",
            AttributeType::RgbColor => "color",
        };
        f.write_str(name)
    }
}

/// An RGB color value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// A concrete attribute value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorAttribute {
    pub id: String,
    pub ty: AttributeType,
    pub value: String,
}

impl ActorAttribute {
    /// Create a new attribute.
    pub fn new(id: impl Into<String>, ty: AttributeType, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ty,
            value: value.into(),
        }
    }

    /// Check the value parses as the declared type.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.ty.accepts(&self.value)
    }

    /// Get as bool if this is a Bool attribute.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.ty {
            AttributeType::Bool => parse_bool(&self.value),
            _ => None,
        }
    }

    /// Get as integer if this is an Int attribute.
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self.ty {
            AttributeType::Int => self.value.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get as float. Int attributes widen.
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self.ty {
            AttributeType::Float | AttributeType::Int => self.value.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get the raw string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Get as color if this is an RgbColor attribute.
    #[must_use]
    pub fn as_color(&self) -> Option<RgbColor> {
        match self.ty {
            AttributeType::RgbColor => parse_color(&self.value),
            _ => None,
        }
    }
}

/// A customizable slot on a definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorVariation {
    pub id: String,
    pub ty: AttributeType,

    /// Suggested values. The first one is used when a request omits the slot.
    pub recommended_values: SmallVec<[String; 4]>,

    /// Only recommended values are allowed.
    pub restrict_to_recommended: bool,
}

impl ActorVariation {
    /// Create a new variation with no recommended values.
    pub fn new(id: impl Into<String>, ty: AttributeType) -> Self {
        Self {
            id: id.into(),
            ty,
            recommended_values: SmallVec::new(),
            restrict_to_recommended: false,
        }
    }

    /// Add a recommended value (builder pattern).
    #[must_use]
    pub fn recommend(mut self, value: impl Into<String>) -> Self {
        self.recommended_values.push(value.into());
        self
    }

    /// Restrict to recommended values (builder pattern).
    #[must_use]
    pub fn restricted(mut self) -> Self {
        self.restrict_to_recommended = true;
        self
    }

    /// Check whether `value` may be chosen for this slot.
    #[must_use]
    pub fn allows(&self, value: &str) -> bool {
        self.ty.accepts(value)
            && (!self.restrict_to_recommended
                || self.recommended_values.iter().any(|v| v == value))
    }

    /// Default attribute for this slot, if it has recommended values.
    #[must_use]
    pub fn default_attribute(&self) -> Option<ActorAttribute> {
        self.recommended_values
            .first()
            .map(|v| ActorAttribute::new(self.id.clone(), self.ty, v.clone()))
    }
}

/// Chosen attribute values of a spawn request, keyed by attribute id.
pub type Variations = FxHashMap<String, ActorAttribute>;

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_color(value: &str) -> Option<RgbColor> {
    let mut channels = value.split(',').map(|c| c.trim().parse::<u8>());
    let r = channels.next()?.ok()?;
    let g = channels.next()?.ok()?;
    let b = channels.next()?.ok()?;
    if channels.next().is_some() {
        return None;
    }
    Some(RgbColor { r, g, b })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_accepts() {
        assert!(AttributeType::Bool.accepts("True"));
        assert!(!AttributeType::Bool.accepts("yes"));
        assert!(AttributeType::Int.accepts("-12"));
        assert!(!AttributeType::Int.accepts("1.5"));
        assert!(AttributeType::Float.accepts("1.5"));
        assert!(AttributeType::String.accepts(""));
        assert!(AttributeType::RgbColor.accepts("255, 0, 10"));
        assert!(!AttributeType::RgbColor.accepts("256,0,0"));
        assert!(!AttributeType::RgbColor.accepts("1,2"));
        assert!(!AttributeType::RgbColor.accepts("1,2,3,4"));
    }

    #[test]
    fn test_attribute_accessors() {
        let fov = ActorAttribute::new("fov", AttributeType::Float, "90");
        assert_eq!(fov.as_float(), Some(90.0));
        assert_eq!(fov.as_int(), None);

        let color = ActorAttribute::new("color", AttributeType::RgbColor, "10,20,30");
        assert_eq!(color.as_color(), Some(RgbColor { r: 10, g: 20, b: 30 }));
        assert_eq!(color.as_bool(), None);

        let wheels = ActorAttribute::new("number_of_wheels", AttributeType::Int, "4");
        assert_eq!(wheels.as_int(), Some(4));
        assert_eq!(wheels.as_float(), Some(4.0));
    }

    #[test]
    fn test_variation_allows() {
        let open = ActorVariation::new("role_name", AttributeType::String).recommend("autopilot");
        assert!(open.allows("hero"));

        let closed = ActorVariation::new("sticky", AttributeType::Bool)
            .recommend("true")
            .restricted();
        assert!(closed.allows("true"));
        assert!(!closed.allows("false"));
        assert!(!closed.allows("maybe"));
    }

    #[test]
    fn test_default_attribute() {
        let v = ActorVariation::new("color", AttributeType::RgbColor)
            .recommend("255,0,0")
            .recommend("0,0,255");
        let attr = v.default_attribute().unwrap();
        assert_eq!(attr.id, "color");
        assert_eq!(attr.value, "255,0,0");

        assert!(ActorVariation::new("x", AttributeType::Int).default_attribute().is_none());
    }
}
