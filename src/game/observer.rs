//! World observer stream.
//!
//! At episode start the episode hands an `ObserverStream` to a
//! `WorldObserver` entity. Every tick the episode publishes an
//! `EpisodeSnapshot` through it. Receivers may go away at any time; a
//! closed stream is not an error.

use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::{ActorId, DefinitionId, EpisodeId};
use crate::world::{Entity, EntityHandle, Observer};

/// One actor as seen in a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub handle: EntityHandle,
    pub description_id: String,
    pub uid: DefinitionId,
}

/// Episode state published once per tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSnapshot {
    pub episode: EpisodeId,
    pub frame: u64,
    pub elapsed_seconds: f64,
    pub map_name: String,
    pub actors: Vec<ActorSnapshot>,
}

/// Sending half of the observer stream.
#[derive(Clone, Debug)]
pub struct ObserverStream {
    sender: Sender<EpisodeSnapshot>,
}

impl ObserverStream {
    /// Create a stream and its receiving end.
    #[must_use]
    pub fn channel() -> (Self, Receiver<EpisodeSnapshot>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }

    /// Send a snapshot. Returns `false` if nobody is listening.
    pub fn send(&self, snapshot: EpisodeSnapshot) -> bool {
        self.sender.send(snapshot).is_ok()
    }
}

/// Entity that forwards episode snapshots to its stream.
#[derive(Debug, Default)]
pub struct WorldObserver {
    stream: Option<ObserverStream>,
    published: u64,
}

impl WorldObserver {
    /// Number of snapshots delivered so far.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published
    }
}

impl Entity for WorldObserver {
    fn kind(&self) -> &'static str {
        "world_observer"
    }

    fn as_observer_mut(&mut self) -> Option<&mut dyn Observer> {
        Some(self)
    }
}

impl Observer for WorldObserver {
    fn attach_stream(&mut self, stream: ObserverStream) {
        self.stream = Some(stream);
    }

    fn publish(&mut self, snapshot: EpisodeSnapshot) {
        let Some(stream) = &self.stream else {
            return;
        };
        if stream.send(snapshot) {
            self.published += 1;
        } else {
            trace!("Observer stream closed, dropping snapshot");
        }
    }
}
