//! RPC message types.
//!
//! A client wraps each request in an `RpcEnvelope` carrying its ordinal and
//! a per-session sequence number. The server answers every envelope with
//! exactly one `RpcReply` echoing that sequence number.

use serde::{Deserialize, Serialize};

use super::controller::ControlError;
use crate::actors::{ActorDescription, SpawnStatus};
use crate::core::{ActorId, ClientOrdinal, Transform};
use crate::world::VehicleControl;

/// Remotely invocable operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RpcRequest {
    /// Spawn on the authoritative side. `provisional_id` is the id the
    /// client already handed to its caller; it is echoed back in the reply.
    SpawnActorWithInfo {
        transform: Transform,
        description: ActorDescription,
        provisional_id: ActorId,
    },

    ApplyControlToActor {
        actor_id: ActorId,
        control: VehicleControl,
    },

    SetActorAutopilot {
        actor_id: ActorId,
        enabled: bool,
    },
}

impl RpcRequest {
    /// Short operation name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            RpcRequest::SpawnActorWithInfo { .. } => "SpawnActorWithInfo",
            RpcRequest::ApplyControlToActor { .. } => "ApplyControlToActor",
            RpcRequest::SetActorAutopilot { .. } => "SetActorAutopilot",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcEnvelope {
    pub client: ClientOrdinal,
    pub sequence: u64,
    pub request: RpcRequest,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RpcReply {
    pub sequence: u64,
    pub outcome: RpcOutcome,
}

/// Result of executing one request on the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RpcOutcome {
    /// `actor_id` is the authoritative id, `ActorId::NONE` unless `status`
    /// is `Success`.
    Spawned {
        provisional_id: ActorId,
        status: SpawnStatus,
        actor_id: ActorId,
    },

    Control(Result<(), ControlError>),

    /// The request was not admitted or no episode could serve it.
    Rejected,
}
