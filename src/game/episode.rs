//! Episode - one simulation run.
//!
//! The `Episode` owns the dispatcher and decides where a spawn happens:
//!
//! - On the authoritative server, and for sensor descriptions everywhere,
//!   spawns go straight to the dispatcher.
//! - On a client, the spawn is forwarded through the `ClientSession` and the
//!   caller immediately gets a provisional view.
//!
//! All mutation happens on the tick thread.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::observer::{ActorSnapshot, EpisodeSnapshot, ObserverStream};
use super::traffic::traffic_description_id;
use crate::actors::{
    ActorClass, ActorDefinition, ActorDescription, ActorDispatcher, ActorFactory, ActorRegistry,
    ActorView, SpawnStatus,
};
use crate::core::{ActorId, EpisodeId, Transform};
use crate::net::{ClientSession, PlayerController};
use crate::world::entities::classes;
use crate::world::{EntityHandle, World};

/// Description id the local viewpoint is registered under.
pub const SPECTATOR_ID: &str = "spectator";

/// Who performs real entity creation in this process.
#[derive(Debug)]
pub enum Authority {
    Server,
    Client(ClientSession),
}

/// Per-run simulation context.
#[derive(Debug)]
pub struct Episode {
    id: EpisodeId,
    map_name: String,
    dispatcher: ActorDispatcher,
    authority: Authority,
    spectator: ActorView,
    observer: Option<EntityHandle>,
    frame: u64,
    elapsed_seconds: f64,
}

impl Episode {
    /// Create an authoritative episode.
    pub fn new(id: EpisodeId, map_name: impl Into<String>) -> Self {
        Self::with_authority(id, map_name, Authority::Server)
    }

    /// Create an episode on a client that forwards spawns through `session`.
    pub fn new_client(id: EpisodeId, map_name: impl Into<String>, session: ClientSession) -> Self {
        Self::with_authority(id, map_name, Authority::Client(session))
    }

    pub fn with_authority(id: EpisodeId, map_name: impl Into<String>, authority: Authority) -> Self {
        Self {
            id,
            map_name: map_name.into(),
            dispatcher: ActorDispatcher::new(),
            authority,
            spectator: ActorView::invalid(),
            observer: None,
            frame: 0,
            elapsed_seconds: 0.0,
        }
    }

    #[must_use]
    pub fn id(&self) -> EpisodeId {
        self.id
    }

    #[must_use]
    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    #[must_use]
    pub fn is_authoritative(&self) -> bool {
        matches!(self.authority, Authority::Server)
    }

    #[must_use]
    pub fn client_session(&self) -> Option<&ClientSession> {
        match &self.authority {
            Authority::Client(session) => Some(session),
            Authority::Server => None,
        }
    }

    pub fn client_session_mut(&mut self) -> Option<&mut ClientSession> {
        match &mut self.authority {
            Authority::Client(session) => Some(session),
            Authority::Server => None,
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &ActorDispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut ActorDispatcher {
        &mut self.dispatcher
    }

    /// Bind every definition of `factory`. Returns how many were accepted.
    pub fn register_actor_factory(&mut self, factory: Arc<dyn ActorFactory>) -> usize {
        self.dispatcher.bind_factory(factory)
    }

    #[must_use]
    pub fn actor_definitions(&self) -> &[ActorDefinition] {
        self.dispatcher.actor_definitions()
    }

    #[must_use]
    pub fn actor_registry(&self) -> &ActorRegistry {
        self.dispatcher.registry()
    }

    #[must_use]
    pub fn find_actor(&self, id: ActorId) -> Option<&ActorView> {
        self.dispatcher.registry().find(id)
    }

    /// View of the local viewpoint, invalid before begin-play.
    #[must_use]
    pub fn spectator(&self) -> &ActorView {
        &self.spectator
    }

    #[must_use]
    pub fn observer(&self) -> Option<EntityHandle> {
        self.observer
    }

    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// Spawn an actor, locally or through the server.
    ///
    /// On a client the returned view is provisional: it carries an id from
    /// the client's partition and no entity.
    pub fn spawn_actor_with_info(
        &mut self,
        world: &mut dyn World,
        transform: &Transform,
        description: ActorDescription,
    ) -> (SpawnStatus, ActorView) {
        match &mut self.authority {
            Authority::Client(session) if !description.is_sensor() => {
                debug!("Forwarding spawn of '{}' to the server", description.id);
                session.request_spawn(transform, description)
            }
            _ => self.dispatcher.spawn_actor(world, transform, description),
        }
    }

    /// Spawn and return just the entity, if one was created here.
    pub fn spawn_actor(
        &mut self,
        world: &mut dyn World,
        transform: &Transform,
        description: ActorDescription,
    ) -> Option<EntityHandle> {
        self.spawn_actor_with_info(world, transform, description)
            .1
            .handle()
    }

    pub fn destroy_actor(&mut self, world: &mut dyn World, handle: Option<EntityHandle>) -> bool {
        self.dispatcher.destroy_actor(world, handle)
    }

    /// Register the viewpoint and the level's traffic entities.
    ///
    /// Returns the controller client RPCs will target, bound to the
    /// viewpoint.
    pub fn initialize_at_begin_play(&mut self, world: &mut dyn World) -> PlayerController {
        let pawn = world.player_pawn();
        match pawn {
            Some(handle) => {
                let mut description = ActorDescription::new(SPECTATOR_ID);
                description.class = world.class_of(handle).unwrap_or_default();
                self.spectator = self.dispatcher.registry_mut().register(handle, description);
            }
            None => warn!("No player pawn found, spectator not registered"),
        }

        let mut traffic = 0;
        for handle in world.entities() {
            let Some(state) = world.entity(handle).and_then(|e| e.traffic_sign()) else {
                continue;
            };
            let mut description = ActorDescription::new(traffic_description_id(state));
            description.class = ActorClass::new(classes::TRAFFIC_SIGN);
            if self.dispatcher.registry_mut().register(handle, description).is_valid() {
                traffic += 1;
            }
        }
        info!(
            "Episode {} on '{}' begins with {} traffic entities",
            self.id, self.map_name, traffic
        );

        PlayerController::new(pawn)
    }

    /// Spawn the world observer and hand it `stream`.
    pub fn start_world_observer(
        &mut self,
        world: &mut dyn World,
        stream: ObserverStream,
    ) -> Option<EntityHandle> {
        let transform = Transform::identity();
        let Some(handle) = world.spawn_deferred(&ActorClass::new(classes::WORLD_OBSERVER), &transform)
        else {
            warn!("Failed to spawn the world observer");
            return None;
        };
        if let Some(observer) = world.entity_mut(handle).and_then(|e| e.as_observer_mut()) {
            observer.attach_stream(stream);
        }
        world.finish_spawning(handle, &transform);
        self.observer = Some(handle);
        Some(handle)
    }

    /// Current state as published to observers.
    #[must_use]
    pub fn snapshot(&self) -> EpisodeSnapshot {
        let actors = self
            .actor_registry()
            .iter()
            .filter_map(|view| {
                let description = view.description()?;
                Some(ActorSnapshot {
                    id: view.id(),
                    handle: view.handle()?,
                    description_id: description.id.clone(),
                    uid: description.uid,
                })
            })
            .collect();
        EpisodeSnapshot {
            episode: self.id,
            frame: self.frame,
            elapsed_seconds: self.elapsed_seconds,
            map_name: self.map_name.clone(),
            actors,
        }
    }

    /// Advance one frame and publish a snapshot to the observer.
    pub fn tick(&mut self, world: &mut dyn World, delta_seconds: f64) {
        self.frame += 1;
        self.elapsed_seconds += delta_seconds;

        let Some(handle) = self.observer else {
            return;
        };
        let snapshot = self.snapshot();
        match world.entity_mut(handle).and_then(|e| e.as_observer_mut()) {
            Some(observer) => observer.publish(snapshot),
            None => {
                warn!("World observer {} is gone", handle);
                self.observer = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::SensorFactory;
    use crate::core::{ClientOrdinal, Location};
    use crate::net::RpcServer;
    use crate::world::{LightState, SimWorld, TrafficSignState};
    use crate::world::entities::TrafficSign;

    #[test]
    fn test_begin_play_registers_spectator_and_signs() {
        let mut world = SimWorld::with_builtin_classes();
        let pawn = world.spawn_player_pawn(Transform::identity()).unwrap();
        world.place(
            classes::TRAFFIC_SIGN,
            Transform::at(Location::new(10.0, 0.0, 0.0)),
            Box::new(TrafficSign::new(TrafficSignState::TrafficLight(LightState::Green))),
        );
        world.place(
            classes::TRAFFIC_SIGN,
            Transform::at(Location::new(20.0, 0.0, 0.0)),
            Box::new(TrafficSign::new(TrafficSignState::SpeedLimit(60))),
        );

        let mut episode = Episode::new(EpisodeId(1), "Town01");
        let controller = episode.initialize_at_begin_play(&mut world);

        assert_eq!(controller.pawn(), Some(pawn));
        assert!(episode.spectator().is_valid());
        assert_eq!(episode.spectator().description().unwrap().id, SPECTATOR_ID);

        let ids: Vec<_> = episode
            .actor_registry()
            .iter()
            .map(|v| v.description().unwrap().id.clone())
            .collect();
        assert_eq!(
            ids,
            vec!["spectator", "traffic.traffic_light", "traffic.speed_limit.60"]
        );
    }

    #[test]
    fn test_client_forwards_non_sensor() {
        let mut world = SimWorld::with_builtin_classes();
        let server = RpcServer::new(2);
        let session = ClientSession::new(ClientOrdinal::new(1), 10_000, Box::new(server.connect_loopback()));
        let mut episode = Episode::new_client(EpisodeId(1), "Town01", session);
        assert!(!episode.is_authoritative());

        let (status, view) = episode.spawn_actor_with_info(
            &mut world,
            &Transform::identity(),
            ActorDescription::new("vehicle.audi.tt"),
        );
        assert_eq!(status, SpawnStatus::Success);
        assert!(view.is_provisional());
        assert!(world.is_empty());
        assert_eq!(server.pending(), 1);
    }

    #[test]
    fn test_client_spawns_sensor_locally() {
        let mut world = SimWorld::with_builtin_classes();
        let server = RpcServer::new(2);
        let session = ClientSession::new(ClientOrdinal::new(0), 10_000, Box::new(server.connect_loopback()));
        let mut episode = Episode::new_client(EpisodeId(1), "Town01", session);
        episode.register_actor_factory(Arc::new(SensorFactory::new()));

        let definition = episode.actor_definitions()[0].clone();
        let (status, view) = episode.spawn_actor_with_info(
            &mut world,
            &Transform::identity(),
            ActorDescription::from_definition(&definition),
        );
        assert_eq!(status, SpawnStatus::Success);
        assert!(view.is_valid());
        assert_eq!(server.pending(), 0);
    }

    #[test]
    fn test_tick_publishes_snapshots() {
        let mut world = SimWorld::with_builtin_classes();
        let mut episode = Episode::new(EpisodeId(3), "Town03");
        let (stream, receiver) = ObserverStream::channel();
        let observer = episode.start_world_observer(&mut world, stream).unwrap();
        assert!(world.entities().contains(&observer));

        episode.tick(&mut world, 0.05);
        episode.tick(&mut world, 0.05);

        let snapshots: Vec<_> = receiver.try_iter().collect();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1].frame, 2);
        assert_eq!(snapshots[1].map_name, "Town03");
        assert!((snapshots[1].elapsed_seconds - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_tick_survives_dropped_receiver() {
        let mut world = SimWorld::with_builtin_classes();
        let mut episode = Episode::new(EpisodeId(1), "Town01");
        let (stream, receiver) = ObserverStream::channel();
        episode.start_world_observer(&mut world, stream);
        drop(receiver);

        episode.tick(&mut world, 0.1);
        assert_eq!(episode.frame(), 1);
    }
}
