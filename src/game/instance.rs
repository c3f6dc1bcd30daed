//! Game instance - process-level owner of episodes and the RPC server.
//!
//! ## Lifecycle
//!
//! 1. `begin_play`: create an episode, bind factories, scan the level
//! 2. `notify_begin_episode`: start the RPC server once for the episode
//! 3. `tick`: serve queued RPCs, then advance the episode
//! 4. `end_play`: stop the server and hand back the finished episode
//!
//! The RPC port is `world_port` plus a random even offset in `[20, 1000]`,
//! so that several instances on one host rarely collide.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use super::episode::Episode;
use crate::actors::ActorFactory;
use crate::core::{EpisodeId, EpisodeIdAllocator, SimulationConfig};
use crate::net::{LoopbackTransport, PlayerController, RpcOutcome, RpcReply, RpcServer, TransportError};
use crate::world::World;

/// Owns the configuration, the current episode and the RPC server.
#[derive(Debug)]
pub struct GameInstance {
    config: SimulationConfig,
    episode_ids: EpisodeIdAllocator,
    episode: Option<Episode>,
    controller: Option<PlayerController>,
    server: Option<RpcServer>,
    server_episode: Option<EpisodeId>,
    rng: ChaCha8Rng,
}

impl GameInstance {
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.port_seed);
        Self {
            config,
            episode_ids: EpisodeIdAllocator::new(),
            episode: None,
            controller: None,
            server: None,
            server_episode: None,
            rng,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn episode(&self) -> Option<&Episode> {
        self.episode.as_ref()
    }

    pub fn episode_mut(&mut self) -> Option<&mut Episode> {
        self.episode.as_mut()
    }

    #[must_use]
    pub fn player_controller(&self) -> Option<&PlayerController> {
        self.controller.as_ref()
    }

    #[must_use]
    pub fn server(&self) -> Option<&RpcServer> {
        self.server.as_ref()
    }

    /// Address the TCP listener is bound to, if any.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().and_then(RpcServer::local_addr)
    }

    /// Start a new authoritative episode on `world`.
    pub fn begin_play(&mut self, world: &mut dyn World, factories: &[Arc<dyn ActorFactory>]) -> EpisodeId {
        let id = self.episode_ids.allocate();
        let mut episode = Episode::new(id, self.config.map_name.clone());
        for factory in factories {
            let bound = episode.register_actor_factory(Arc::clone(factory));
            debug!("Bound {} definitions", bound);
        }
        self.controller = Some(episode.initialize_at_begin_play(world));
        info!(
            "{} begins with {} definitions",
            id,
            episode.actor_definitions().len()
        );
        self.episode = Some(episode);
        id
    }

    /// Random even offset in `[20, 1000]`.
    fn port_offset(&mut self) -> u16 {
        self.rng.gen_range(10..=500) * 2
    }

    /// Start the RPC server for the current episode.
    ///
    /// Runs once per episode; later calls return the existing address. The
    /// TCP listener is only opened when networking is enabled, loopback
    /// clients are accepted either way.
    pub fn notify_begin_episode(&mut self) -> Result<Option<SocketAddr>, TransportError> {
        let Some(episode_id) = self.episode.as_ref().map(Episode::id) else {
            warn!("notify_begin_episode called with no episode");
            return Ok(None);
        };
        if self.server_episode == Some(episode_id) {
            return Ok(self.local_addr());
        }

        let mut server = RpcServer::new(self.config.rpc_worker_threads());
        let addr = if self.config.use_networking {
            let port = self.config.world_port.saturating_add(self.port_offset());
            Some(server.start(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))?)
        } else {
            None
        };

        self.server = Some(server);
        self.server_episode = Some(episode_id);
        Ok(addr)
    }

    /// In-process connection to the running server.
    #[must_use]
    pub fn connect_loopback(&self) -> Option<LoopbackTransport> {
        self.server.as_ref().map(RpcServer::connect_loopback)
    }

    /// Serve queued RPCs, then advance the episode.
    ///
    /// Does nothing until the server has been started. Returns how many
    /// requests were served.
    pub fn tick(&mut self, world: &mut dyn World, delta_seconds: f64) -> usize {
        let Some(server) = &self.server else {
            return 0;
        };
        let controller = self.controller.get_or_insert_with(PlayerController::default);

        let inbound = server.drain();
        let served = inbound.len();
        for request in inbound {
            let sequence = request.envelope.sequence;
            debug!(
                "Serving {} #{} from {}",
                request.envelope.request.name(),
                sequence,
                request.envelope.client
            );
            let outcome = if controller.validate(&request.envelope.request) {
                controller.execute(self.episode.as_mut(), world, request.envelope.request.clone())
            } else {
                RpcOutcome::Rejected
            };
            if !request.reply(RpcReply { sequence, outcome }) {
                debug!("{} went away before its reply", request.envelope.client);
            }
        }

        if let Some(episode) = self.episode.as_mut() {
            episode.tick(world, delta_seconds);
        }
        served
    }

    /// Stop the server and return the finished episode.
    pub fn end_play(&mut self) -> Option<Episode> {
        if let Some(mut server) = self.server.take() {
            server.shutdown();
        }
        self.server_episode = None;
        self.controller = None;
        let episode = self.episode.take();
        if let Some(episode) = &episode {
            info!("{} ended after {} frames", episode.id(), episode.frame());
        }
        episode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actors::{SensorFactory, VehicleFactory};
    use crate::core::Transform;
    use crate::world::SimWorld;

    fn offline_config() -> SimulationConfig {
        SimulationConfig::default()
            .with_map_name("Town01")
            .with_networking(false)
            .with_rpc_worker_threads(2)
    }

    #[test]
    fn test_port_offset_range() {
        let mut instance = GameInstance::new(offline_config());
        for _ in 0..200 {
            let offset = instance.port_offset();
            assert!((20..=1000).contains(&offset));
            assert_eq!(offset % 2, 0);
        }
    }

    #[test]
    fn test_port_offset_is_seeded() {
        let mut a = GameInstance::new(offline_config().with_port_seed(7));
        let mut b = GameInstance::new(offline_config().with_port_seed(7));
        assert_eq!(a.port_offset(), b.port_offset());
    }

    #[test]
    fn test_episode_ids_increase() {
        let mut world = SimWorld::with_builtin_classes();
        let mut instance = GameInstance::new(offline_config());

        let first = instance.begin_play(&mut world, &[]);
        instance.end_play();
        let second = instance.begin_play(&mut world, &[]);
        assert_eq!((first, second), (EpisodeId(1), EpisodeId(2)));
    }

    #[test]
    fn test_tick_waits_for_server() {
        let mut world = SimWorld::with_builtin_classes();
        let mut instance = GameInstance::new(offline_config());
        let factories: Vec<Arc<dyn ActorFactory>> =
            vec![Arc::new(VehicleFactory::new()), Arc::new(SensorFactory::new())];
        instance.begin_play(&mut world, &factories);

        assert_eq!(instance.tick(&mut world, 0.1), 0);
        assert_eq!(instance.episode().unwrap().frame(), 0);

        assert_eq!(instance.notify_begin_episode().unwrap(), None);
        assert!(instance.connect_loopback().is_some());
        instance.tick(&mut world, 0.1);
        assert_eq!(instance.episode().unwrap().frame(), 1);
    }

    #[test]
    fn test_server_starts_once_per_episode() {
        let mut world = SimWorld::with_builtin_classes();
        let mut instance = GameInstance::new(offline_config());
        instance.begin_play(&mut world, &[]);

        instance.notify_begin_episode().unwrap();
        let loopback = instance.connect_loopback().unwrap();
        instance.notify_begin_episode().unwrap();

        // A second start would replace the server and orphan this client.
        let mut session = crate::net::ClientSession::new(
            crate::core::ClientOrdinal::new(1),
            10_000,
            Box::new(loopback),
        );
        session.request_spawn(&Transform::identity(), crate::actors::ActorDescription::new("x"));
        assert_eq!(instance.server().unwrap().pending(), 1);
    }

    #[test]
    fn test_end_play_returns_episode() {
        let mut world = SimWorld::with_builtin_classes();
        let mut instance = GameInstance::new(offline_config());
        let id = instance.begin_play(&mut world, &[]);

        let episode = instance.end_play().unwrap();
        assert_eq!(episode.id(), id);
        assert!(instance.episode().is_none());
        assert!(instance.server().is_none());
    }
}
