//! Geometry value types shared by the spawn API and the control bindings.
//!
//! These are plain values: componentwise equality, vector arithmetic on
//! `Vector3D` and `Location`, and a debug string form that external
//! bindings print verbatim:
//!
//! ```
//! use sim_actors::core::{Location, Rotation, Transform};
//!
//! let t = Transform::new(Location::new(1.0, 2.0, 3.0), Rotation::new(0.0, 90.0, 0.0));
//! assert_eq!(
//!     t.to_string(),
//!     "Transform(Location(x=1, y=2, z=3), Rotation(pitch=0, yaw=90, roll=0))"
//! );
//! ```

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A free vector in world space (meters).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3D {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// A point in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Location {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Distance to another location.
    #[must_use]
    pub fn distance(&self, other: &Location) -> f32 {
        Vector3D::from(*self - *other).length()
    }
}

impl From<Vector3D> for Location {
    fn from(v: Vector3D) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Location> for Vector3D {
    fn from(l: Location) -> Self {
        Self::new(l.x, l.y, l.z)
    }
}

/// Orientation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotation {
    #[must_use]
    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// Placement of an actor: location plus orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub location: Location,
    pub rotation: Rotation,
}

impl Transform {
    #[must_use]
    pub const fn new(location: Location, rotation: Rotation) -> Self {
        Self { location, rotation }
    }

    /// Transform at `location` with no rotation.
    #[must_use]
    pub const fn at(location: Location) -> Self {
        Self {
            location,
            rotation: Rotation::new(0.0, 0.0, 0.0),
        }
    }

    /// Identity transform (origin, no rotation).
    #[must_use]
    pub const fn identity() -> Self {
        Self::at(Location::new(0.0, 0.0, 0.0))
    }
}

macro_rules! impl_componentwise_ops {
    ($ty:ident) => {
        impl Add for $ty {
            type Output = $ty;

            fn add(self, rhs: $ty) -> $ty {
                $ty::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
            }
        }

        impl Sub for $ty {
            type Output = $ty;

            fn sub(self, rhs: $ty) -> $ty {
                $ty::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
            }
        }

        impl AddAssign for $ty {
            fn add_assign(&mut self, rhs: $ty) {
                self.x += rhs.x;
                self.y += rhs.y;
                self.z += rhs.z;
            }
        }

        impl SubAssign for $ty {
            fn sub_assign(&mut self, rhs: $ty) {
                self.x -= rhs.x;
                self.y -= rhs.y;
                self.z -= rhs.z;
            }
        }
    };
}

impl_componentwise_ops!(Vector3D);
impl_componentwise_ops!(Location);

impl fmt::Display for Vector3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector3D(x={}, y={}, z={})", self.x, self.y, self.z)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Location(x={}, y={}, z={})", self.x, self.y, self.z)
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rotation(pitch={}, yaw={}, roll={})",
            self.pitch, self.yaw, self.roll
        )
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transform({}, {})", self.location, self.rotation)
    }
}
