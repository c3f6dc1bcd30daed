//! Description ids for traffic entities placed in the level.
//!
//! Level-placed traffic lights and signs have no catalog entry. At begin-play
//! they are registered under a description id synthesized from their
//! semantic state.

use crate::world::TrafficSignState;

/// Speed limits with a dedicated description id, in km/h.
pub const KNOWN_SPEED_LIMITS: [u32; 7] = [30, 40, 60, 90, 100, 120, 130];

pub const TRAFFIC_LIGHT_ID: &str = "traffic.traffic_light";
pub const STOP_ID: &str = "traffic.stop";
pub const YIELD_ID: &str = "traffic.yield";
pub const UNKNOWN_ID: &str = "traffic.unknown";

/// Description id for a traffic entity.
///
/// ```
/// use sim_actors::game::traffic_description_id;
/// use sim_actors::world::{LightState, TrafficSignState};
///
/// assert_eq!(traffic_description_id(TrafficSignState::SpeedLimit(90)), "traffic.speed_limit.90");
/// assert_eq!(traffic_description_id(TrafficSignState::SpeedLimit(55)), "traffic.unknown");
/// assert_eq!(
///     traffic_description_id(TrafficSignState::TrafficLight(LightState::Red)),
///     "traffic.traffic_light"
/// );
/// ```
#[must_use]
pub fn traffic_description_id(state: TrafficSignState) -> String {
    match state {
        TrafficSignState::TrafficLight(_) => TRAFFIC_LIGHT_ID.to_string(),
        TrafficSignState::SpeedLimit(limit) if KNOWN_SPEED_LIMITS.contains(&limit) => {
            format!("traffic.speed_limit.{limit}")
        }
        TrafficSignState::Stop => STOP_ID.to_string(),
        TrafficSignState::Yield => YIELD_ID.to_string(),
        TrafficSignState::SpeedLimit(_) | TrafficSignState::Unknown => UNKNOWN_ID.to_string(),
    }
}
