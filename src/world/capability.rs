//! Entity capabilities.
//!
//! Every entity kind implements [`Entity`] and overrides the accessors for
//! the capabilities it supports. The defaults decline everything.

use serde::{Deserialize, Serialize};

use super::EntityHandle;
use crate::actors::ActorDescription;
use crate::game::{EpisodeSnapshot, ObserverStream};

/// A live engine entity, seen through its capabilities.
pub trait Entity: std::fmt::Debug + Send {
    /// Short kind name for logs.
    fn kind(&self) -> &'static str;

    fn as_pawn(&self) -> Option<&dyn Pawn> {
        None
    }

    fn as_pawn_mut(&mut self) -> Option<&mut dyn Pawn> {
        None
    }

    fn as_drivable(&self) -> Option<&dyn Drivable> {
        None
    }

    fn as_drivable_mut(&mut self) -> Option<&mut dyn Drivable> {
        None
    }

    fn as_autopilot(&self) -> Option<&dyn Autopilot> {
        None
    }

    fn as_autopilot_mut(&mut self) -> Option<&mut dyn Autopilot> {
        None
    }

    fn as_observer_mut(&mut self) -> Option<&mut dyn Observer> {
        None
    }

    /// Semantic state of a level-placed traffic entity.
    fn traffic_sign(&self) -> Option<TrafficSignState> {
        None
    }
}

/// Something a controller can possess.
pub trait Pawn {
    fn controller(&self) -> Option<EntityHandle>;
    fn set_controller(&mut self, controller: Option<EntityHandle>);
}

/// Something that accepts vehicle control input.
pub trait Drivable {
    /// Apply every field of `control` as one update.
    fn apply_control(&mut self, control: &VehicleControl);

    /// Last applied control.
    fn control(&self) -> VehicleControl;

    /// Current gear (`-1` in reverse).
    fn current_gear(&self) -> i32;

    /// Attach the description the entity was spawned from.
    fn set_description(&mut self, description: ActorDescription);

    fn description(&self) -> Option<&ActorDescription>;
}

/// A controller that can drive its pawn on its own.
pub trait Autopilot {
    fn set_autopilot(&mut self, enabled: bool);
    fn is_autopilot_enabled(&self) -> bool;
}

/// The entity that streams episode state to external observers.
pub trait Observer {
    fn attach_stream(&mut self, stream: ObserverStream);
    fn publish(&mut self, snapshot: EpisodeSnapshot);
}

/// Vehicle control input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleControl {
    pub throttle: f32,
    pub steer: f32,
    pub brake: f32,
    pub hand_brake: bool,
    pub reverse: bool,
}

impl VehicleControl {
    /// Full throttle straight ahead.
    #[must_use]
    pub fn full_throttle() -> Self {
        Self {
            throttle: 1.0,
            ..Default::default()
        }
    }
}

/// Traffic light phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightState {
    Red,
    Yellow,
    Green,
    Off,
}

/// Semantic state of a traffic entity placed in the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrafficSignState {
    TrafficLight(LightState),
    /// Speed limit in km/h.
    SpeedLimit(u32),
    Stop,
    Yield,
    Unknown,
}
