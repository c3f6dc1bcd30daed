//! Server-side player controller.
//!
//! The `PlayerController` is the object client RPCs target. Every request
//! goes through an admission step (`validate`) and then an execution step
//! (`execute`) that runs on the tick thread against the current episode.
//!
//! Control requests report what happened through `ControlError`; in every
//! error case no state is touched.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use super::messages::{RpcOutcome, RpcRequest};
use crate::actors::ActorDescription;
use crate::core::{ActorId, Transform};
use crate::game::Episode;
use crate::world::{EntityHandle, VehicleControl, World};

/// Why a control request had no effect.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlError {
    #[error("no episode is running")]
    EpisodeMissing,

    #[error("{0} is not registered")]
    ActorNotFound(ActorId),

    #[error("{0} is pending kill")]
    ActorPendingKill(ActorId),

    #[error("{0} cannot be driven")]
    NotDrivable(ActorId),

    #[error("{0} has no controller")]
    NoController(ActorId),

    #[error("controller of {0} does not support autopilot")]
    IncompatibleController(ActorId),
}

/// Receives client RPCs on the authoritative side.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerController {
    pawn: Option<EntityHandle>,
}

impl PlayerController {
    /// Controller bound to the local viewpoint `pawn`.
    #[must_use]
    pub fn new(pawn: Option<EntityHandle>) -> Self {
        Self { pawn }
    }

    /// The viewpoint this controller is bound to.
    #[must_use]
    pub fn pawn(&self) -> Option<EntityHandle> {
        self.pawn
    }

    /// Admission check run before `execute`. Admits everything.
    #[must_use]
    pub fn validate(&self, _request: &RpcRequest) -> bool {
        true
    }

    /// Run a request against `episode`.
    pub fn execute(
        &self,
        episode: Option<&mut Episode>,
        world: &mut dyn World,
        request: RpcRequest,
    ) -> RpcOutcome {
        match request {
            RpcRequest::SpawnActorWithInfo {
                transform,
                description,
                provisional_id,
            } => match episode {
                Some(episode) => {
                    Self::spawn_actor_with_info(episode, world, &transform, description, provisional_id)
                }
                None => {
                    error!("Spawn requested with no episode running");
                    RpcOutcome::Rejected
                }
            },
            RpcRequest::ApplyControlToActor { actor_id, control } => {
                let result = match episode {
                    Some(episode) => Self::apply_control_to_actor(episode, world, actor_id, &control),
                    None => Err(ControlError::EpisodeMissing),
                };
                RpcOutcome::Control(log_control_result(result))
            }
            RpcRequest::SetActorAutopilot { actor_id, enabled } => {
                let result = match episode {
                    Some(episode) => Self::set_actor_autopilot(episode, world, actor_id, enabled),
                    None => Err(ControlError::EpisodeMissing),
                };
                RpcOutcome::Control(log_control_result(result))
            }
        }
    }

    fn spawn_actor_with_info(
        episode: &mut Episode,
        world: &mut dyn World,
        transform: &Transform,
        description: ActorDescription,
        provisional_id: ActorId,
    ) -> RpcOutcome {
        debug_assert!(episode.is_authoritative());
        let (status, view) = episode.dispatcher_mut().spawn_actor(world, transform, description);
        debug!("Remote spawn {} -> {} ({})", provisional_id, view.id(), status);
        RpcOutcome::Spawned {
            provisional_id,
            status,
            actor_id: view.id(),
        }
    }

    /// Apply `control` to a drivable actor in one update.
    pub fn apply_control_to_actor(
        episode: &Episode,
        world: &mut dyn World,
        actor_id: ActorId,
        control: &VehicleControl,
    ) -> Result<(), ControlError> {
        let handle = live_handle(episode, world, actor_id)?;
        let drivable = world
            .entity_mut(handle)
            .and_then(|e| e.as_drivable_mut())
            .ok_or(ControlError::NotDrivable(actor_id))?;
        drivable.apply_control(control);
        Ok(())
    }

    /// Toggle autopilot on a drivable actor's controller.
    pub fn set_actor_autopilot(
        episode: &Episode,
        world: &mut dyn World,
        actor_id: ActorId,
        enabled: bool,
    ) -> Result<(), ControlError> {
        let handle = live_handle(episode, world, actor_id)?;
        if world.entity(handle).and_then(|e| e.as_drivable()).is_none() {
            return Err(ControlError::NotDrivable(actor_id));
        }
        let controller = world
            .controller_of(handle)
            .ok_or(ControlError::NoController(actor_id))?;
        let autopilot = world
            .entity_mut(controller)
            .and_then(|e| e.as_autopilot_mut())
            .ok_or(ControlError::IncompatibleController(actor_id))?;
        autopilot.set_autopilot(enabled);
        Ok(())
    }
}

/// Registered, still-alive entity behind `actor_id`.
fn live_handle(episode: &Episode, world: &dyn World, actor_id: ActorId) -> Result<EntityHandle, ControlError> {
    let handle = episode
        .find_actor(actor_id)
        .and_then(|view| view.handle())
        .ok_or(ControlError::ActorNotFound(actor_id))?;
    if world.is_pending_kill(handle) {
        return Err(ControlError::ActorPendingKill(actor_id));
    }
    Ok(handle)
}

fn log_control_result(result: Result<(), ControlError>) -> Result<(), ControlError> {
    if let Err(err) = &result {
        warn!("Control request ignored: {}", err);
    }
    result
}
