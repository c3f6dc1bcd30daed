//! Built-in entity kinds.
//!
//! | Class                       | Capabilities                 |
//! |-----------------------------|------------------------------|
//! | `WheeledVehicle`            | pawn, drivable               |
//! | `VehicleAIController`       | autopilot                    |
//! | `ScriptedVehicleController` | autopilot                    |
//! | `Sensor`                    | none                         |
//! | `SpectatorPawn`             | pawn                         |
//! | `TrafficSign`               | traffic sign state           |
//!
//! The world observer lives in `game::observer`.

use super::capability::{Autopilot, Drivable, Entity, Pawn, TrafficSignState, VehicleControl};
use super::EntityHandle;
use crate::actors::ActorDescription;

/// Engine class names of the built-in kinds.
pub mod classes {
    pub const WHEELED_VEHICLE: &str = "WheeledVehicle";
    pub const VEHICLE_AI_CONTROLLER: &str = "VehicleAIController";
    pub const SCRIPTED_CONTROLLER: &str = "ScriptedVehicleController";
    pub const SENSOR: &str = "Sensor";
    pub const SPECTATOR: &str = "SpectatorPawn";
    pub const TRAFFIC_SIGN: &str = "TrafficSign";
    pub const WORLD_OBSERVER: &str = "WorldObserver";
}

/// A four-wheeled vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct WheeledVehicle {
    control: VehicleControl,
    gear: i32,
    auto_gears: bool,
    controller: Option<EntityHandle>,
    description: Option<ActorDescription>,
}

impl Default for WheeledVehicle {
    fn default() -> Self {
        Self {
            control: VehicleControl::default(),
            gear: 1,
            auto_gears: true,
            controller: None,
            description: None,
        }
    }
}

impl WheeledVehicle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Automatic gear selection is active (off while reversing).
    #[must_use]
    pub fn uses_auto_gears(&self) -> bool {
        self.auto_gears
    }

    fn set_reverse(&mut self, reverse: bool) {
        if reverse != self.control.reverse {
            self.control.reverse = reverse;
            self.auto_gears = !reverse;
            self.gear = if reverse { -1 } else { 1 };
        }
    }
}

impl Entity for WheeledVehicle {
    fn kind(&self) -> &'static str {
        "vehicle"
    }

    fn as_pawn(&self) -> Option<&dyn Pawn> {
        Some(self)
    }

    fn as_pawn_mut(&mut self) -> Option<&mut dyn Pawn> {
        Some(self)
    }

    fn as_drivable(&self) -> Option<&dyn Drivable> {
        Some(self)
    }

    fn as_drivable_mut(&mut self) -> Option<&mut dyn Drivable> {
        Some(self)
    }
}

impl Pawn for WheeledVehicle {
    fn controller(&self) -> Option<EntityHandle> {
        self.controller
    }

    fn set_controller(&mut self, controller: Option<EntityHandle>) {
        self.controller = controller;
    }
}

impl Drivable for WheeledVehicle {
    fn apply_control(&mut self, control: &VehicleControl) {
        self.control.throttle = control.throttle;
        self.control.steer = control.steer;
        self.control.brake = control.brake;
        self.control.hand_brake = control.hand_brake;
        self.set_reverse(control.reverse);
    }

    fn control(&self) -> VehicleControl {
        self.control
    }

    fn current_gear(&self) -> i32 {
        self.gear
    }

    fn set_description(&mut self, description: ActorDescription) {
        self.description = Some(description);
    }

    fn description(&self) -> Option<&ActorDescription> {
        self.description.as_ref()
    }
}

/// Built-in AI controller for vehicles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VehicleAiController {
    autopilot: bool,
}

impl Entity for VehicleAiController {
    fn kind(&self) -> &'static str {
        "vehicle_ai_controller"
    }

    fn as_autopilot(&self) -> Option<&dyn Autopilot> {
        Some(self)
    }

    fn as_autopilot_mut(&mut self) -> Option<&mut dyn Autopilot> {
        Some(self)
    }
}

impl Autopilot for VehicleAiController {
    fn set_autopilot(&mut self, enabled: bool) {
        self.autopilot = enabled;
    }

    fn is_autopilot_enabled(&self) -> bool {
        self.autopilot
    }
}

/// Controller driven by a route script; also supports autopilot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScriptedController {
    autopilot: bool,
    route: Vec<String>,
}

impl ScriptedController {
    /// Route waypoints, by name.
    #[must_use]
    pub fn route(&self) -> &[String] {
        &self.route
    }

    pub fn set_route(&mut self, route: Vec<String>) {
        self.route = route;
    }
}

impl Entity for ScriptedController {
    fn kind(&self) -> &'static str {
        "scripted_controller"
    }

    fn as_autopilot(&self) -> Option<&dyn Autopilot> {
        Some(self)
    }

    fn as_autopilot_mut(&mut self) -> Option<&mut dyn Autopilot> {
        Some(self)
    }
}

impl Autopilot for ScriptedController {
    fn set_autopilot(&mut self, enabled: bool) {
        self.autopilot = enabled;
    }

    fn is_autopilot_enabled(&self) -> bool {
        self.autopilot
    }
}

/// A sensor. No capabilities the core cares about.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sensor;

impl Entity for Sensor {
    fn kind(&self) -> &'static str {
        "sensor"
    }
}

/// Free-flying viewpoint of the local player.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpectatorPawn {
    controller: Option<EntityHandle>,
}

impl Entity for SpectatorPawn {
    fn kind(&self) -> &'static str {
        "spectator"
    }

    fn as_pawn(&self) -> Option<&dyn Pawn> {
        Some(self)
    }

    fn as_pawn_mut(&mut self) -> Option<&mut dyn Pawn> {
        Some(self)
    }
}

impl Pawn for SpectatorPawn {
    fn controller(&self) -> Option<EntityHandle> {
        self.controller
    }

    fn set_controller(&mut self, controller: Option<EntityHandle>) {
        self.controller = controller;
    }
}

/// Traffic light or sign placed in the level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrafficSign {
    pub state: TrafficSignState,
}

impl Default for TrafficSign {
    fn default() -> Self {
        Self {
            state: TrafficSignState::Unknown,
        }
    }
}

impl TrafficSign {
    #[must_use]
    pub fn new(state: TrafficSignState) -> Self {
        Self { state }
    }
}

impl Entity for TrafficSign {
    fn kind(&self) -> &'static str {
        "traffic_sign"
    }

    fn traffic_sign(&self) -> Option<TrafficSignState> {
        Some(self.state)
    }
}
