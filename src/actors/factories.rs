//! Built-in actor factories.
//!
//! - `VehicleFactory`: `vehicle.*` definitions. Spawns a wheeled vehicle and
//!   possesses it with a controller chosen by the `controller` variation.
//! - `SensorFactory`: `sensor.*` definitions, all tagged `sensor`.

use tracing::{debug, warn};

use super::attributes::{ActorVariation, AttributeType};
use super::definition::ActorDefinition;
use super::description::ActorDescription;
use super::factory::{ActorFactory, ActorSpawnResult, SpawnStatus};
use crate::core::Transform;
use crate::world::entities::classes;
use crate::world::World;

const DEFAULT_VEHICLES: &[&str] = &[
    "vehicle.audi.tt",
    "vehicle.tesla.model3",
    "vehicle.mustang.mustang",
    "vehicle.nissan.micra",
];

const VEHICLE_COLORS: &[&str] = &["255,0,0", "0,0,255", "255,255,255", "20,20,20"];

const DEFAULT_SENSORS: &[&str] = &[
    "sensor.camera.rgb",
    "sensor.camera.depth",
    "sensor.lidar.ray_cast",
    "sensor.other.collision",
];

/// Which controller possesses a freshly spawned vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerKind {
    Ai,
    Scripted,
}

impl ControllerKind {
    /// Parse the `controller` variation value.
    #[must_use]
    pub fn from_variation(value: &str) -> Option<Self> {
        match value {
            "ai" => Some(ControllerKind::Ai),
            "scripted" => Some(ControllerKind::Scripted),
            _ => None,
        }
    }

    #[must_use]
    pub fn class(self) -> &'static str {
        match self {
            ControllerKind::Ai => classes::VEHICLE_AI_CONTROLLER,
            ControllerKind::Scripted => classes::SCRIPTED_CONTROLLER,
        }
    }
}

/// Factory for wheeled vehicles.
#[derive(Clone, Debug)]
pub struct VehicleFactory {
    models: Vec<String>,
}

impl Default for VehicleFactory {
    fn default() -> Self {
        Self {
            models: DEFAULT_VEHICLES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl VehicleFactory {
    /// Factory with the stock vehicle models.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory for exactly these model ids.
    pub fn with_models<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            models: models.into_iter().map(Into::into).collect(),
        }
    }

    fn definition(id: &str) -> ActorDefinition {
        let color = VEHICLE_COLORS
            .iter()
            .fold(ActorVariation::new("color", AttributeType::RgbColor), |v, c| {
                v.recommend(*c)
            });
        ActorDefinition::new(id, classes::WHEELED_VEHICLE)
            .with_tags("vehicle")
            .with_variation(color)
            .with_variation(
                ActorVariation::new("role_name", AttributeType::String)
                    .recommend("autopilot")
                    .recommend("hero"),
            )
            .with_variation(
                ActorVariation::new("controller", AttributeType::String)
                    .recommend("ai")
                    .recommend("scripted")
                    .restricted(),
            )
    }
}

impl ActorFactory for VehicleFactory {
    fn definitions(&self) -> Vec<ActorDefinition> {
        self.models.iter().map(|id| Self::definition(id)).collect()
    }

    fn spawn_actor(
        &self,
        world: &mut dyn World,
        transform: &Transform,
        description: &ActorDescription,
    ) -> ActorSpawnResult {
        let Some(vehicle) = world.spawn_deferred(&description.class, transform) else {
            return ActorSpawnResult::failure(SpawnStatus::Collision);
        };
        world.finish_spawning(vehicle, transform);

        let kind = description
            .variation("controller")
            .and_then(|v| ControllerKind::from_variation(v.as_str()))
            .unwrap_or(ControllerKind::Ai);

        match world.spawn(&kind.class().into(), transform) {
            Some(controller) => {
                if let Some(pawn) = world.entity_mut(vehicle).and_then(|e| e.as_pawn_mut()) {
                    pawn.set_controller(Some(controller));
                }
                debug!("Vehicle {} possessed by {:?} controller {}", vehicle, kind, controller);
            }
            None => warn!("Failed to spawn controller for '{}'", description.id),
        }

        ActorSpawnResult::success(vehicle)
    }
}

/// Factory for sensors.
#[derive(Clone, Debug)]
pub struct SensorFactory {
    sensors: Vec<String>,
}

impl Default for SensorFactory {
    fn default() -> Self {
        Self {
            sensors: DEFAULT_SENSORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SensorFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActorFactory for SensorFactory {
    fn definitions(&self) -> Vec<ActorDefinition> {
        self.sensors
            .iter()
            .map(|id| {
                ActorDefinition::new(id.as_str(), classes::SENSOR)
                    .with_tags("sensor")
                    .with_variation(ActorVariation::new("role_name", AttributeType::String))
            })
            .collect()
    }

    fn spawn_actor(
        &self,
        world: &mut dyn World,
        transform: &Transform,
        description: &ActorDescription,
    ) -> ActorSpawnResult {
        match world.spawn(&description.class, transform) {
            Some(sensor) => ActorSpawnResult::success(sensor),
            None => ActorSpawnResult::failure(SpawnStatus::Collision),
        }
    }
}
