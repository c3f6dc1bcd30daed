//! Episode integration tests.
//!
//! These tests verify begin-play scanning, the observer stream and the
//! game instance lifecycle on the authoritative side.

use std::sync::Arc;

use sim_actors::actors::{ActorDescription, ActorFactory, SensorFactory, SpawnStatus, VehicleFactory};
use sim_actors::core::{EpisodeId, Location, SimulationConfig, Transform};
use sim_actors::game::{Episode, GameInstance, ObserverStream, SPECTATOR_ID};
use sim_actors::world::entities::{classes, TrafficSign};
use sim_actors::world::{LightState, SimWorld, TrafficSignState, World};

fn level() -> SimWorld {
    let mut world = SimWorld::with_builtin_classes();
    world.spawn_player_pawn(Transform::identity());
    let signs = [
        TrafficSignState::TrafficLight(LightState::Red),
        TrafficSignState::SpeedLimit(30),
        TrafficSignState::SpeedLimit(50),
        TrafficSignState::Stop,
        TrafficSignState::Yield,
    ];
    for (i, state) in signs.into_iter().enumerate() {
        world.place(
            classes::TRAFFIC_SIGN,
            Transform::at(Location::new(i as f32 * 10.0, 0.0, 0.0)),
            Box::new(TrafficSign::new(state)),
        );
    }
    world
}

fn factories() -> Vec<Arc<dyn ActorFactory>> {
    vec![Arc::new(VehicleFactory::new()), Arc::new(SensorFactory::new())]
}

// =============================================================================
// Begin Play
// =============================================================================

/// Level traffic entities are registered under synthesized ids.
#[test]
fn test_begin_play_scan() {
    let mut world = level();
    let mut episode = Episode::new(EpisodeId(1), "Town01");
    episode.initialize_at_begin_play(&mut world);

    let mut ids: Vec<String> = episode
        .actor_registry()
        .iter()
        .map(|v| v.description().unwrap().id.clone())
        .collect();
    ids.sort();
    assert_eq!(
        ids,
        vec![
            SPECTATOR_ID,
            "traffic.speed_limit.30",
            "traffic.stop",
            "traffic.traffic_light",
            "traffic.unknown",
            "traffic.yield",
        ]
    );
}

/// The spectator is findable like any spawned actor.
#[test]
fn test_spectator_in_registry() {
    let mut world = level();
    let mut episode = Episode::new(EpisodeId(1), "Town01");
    let controller = episode.initialize_at_begin_play(&mut world);

    let spectator = episode.spectator().clone();
    assert_eq!(spectator.handle(), world.player_pawn());
    assert_eq!(controller.pawn(), world.player_pawn());
    assert_eq!(episode.find_actor(spectator.id()), Some(&spectator));
}

/// No player pawn: begin-play still scans the level.
#[test]
fn test_begin_play_without_pawn() {
    let mut world = SimWorld::with_builtin_classes();
    world.place(
        classes::TRAFFIC_SIGN,
        Transform::identity(),
        Box::new(TrafficSign::new(TrafficSignState::Stop)),
    );
    let mut episode = Episode::new(EpisodeId(1), "Town01");
    let controller = episode.initialize_at_begin_play(&mut world);

    assert!(!episode.spectator().is_valid());
    assert_eq!(controller.pawn(), None);
    assert_eq!(episode.actor_registry().len(), 1);
}

// =============================================================================
// Spawning
// =============================================================================

/// Spawned ids continue after the begin-play registrations.
#[test]
fn test_spawn_after_begin_play() {
    let mut world = level();
    let mut episode = Episode::new(EpisodeId(1), "Town01");
    for factory in factories() {
        episode.register_actor_factory(factory);
    }
    episode.initialize_at_begin_play(&mut world);
    let before = episode.actor_registry().len();

    let definition = episode.actor_definitions()[0].clone();
    let handle = episode
        .spawn_actor(&mut world, &Transform::identity(), ActorDescription::from_definition(&definition))
        .unwrap();

    assert_eq!(episode.actor_registry().len(), before + 1);
    let view = episode.actor_registry().find_by_handle(handle).unwrap();
    assert_eq!(view.id().raw() as usize, before + 1);

    assert!(episode.destroy_actor(&mut world, Some(handle)));
    assert_eq!(episode.actor_registry().len(), before);
}

/// Sensors spawn the same way whatever the authority.
#[test]
fn test_sensor_spawn_on_server() {
    let mut world = SimWorld::with_builtin_classes();
    let mut episode = Episode::new(EpisodeId(1), "Town01");
    episode.register_actor_factory(Arc::new(SensorFactory::new()));
    let definition = episode.actor_definitions()[0].clone();

    let (status, view) = episode.spawn_actor_with_info(
        &mut world,
        &Transform::identity(),
        ActorDescription::from_definition(&definition),
    );
    assert_eq!(status, SpawnStatus::Success);
    assert!(view.is_valid());
}

// =============================================================================
// Observer
// =============================================================================

/// Snapshots list live actors in id order.
#[test]
fn test_snapshot_contents() {
    let mut world = level();
    let mut episode = Episode::new(EpisodeId(4), "Town04");
    episode.register_actor_factory(Arc::new(VehicleFactory::new()));
    episode.initialize_at_begin_play(&mut world);
    let (stream, receiver) = ObserverStream::channel();
    episode.start_world_observer(&mut world, stream);

    let definition = episode.actor_definitions()[1].clone();
    episode.spawn_actor(&mut world, &Transform::identity(), ActorDescription::from_definition(&definition));
    episode.tick(&mut world, 0.1);

    let snapshot = receiver.try_recv().unwrap();
    assert_eq!(snapshot.episode, EpisodeId(4));
    assert_eq!(snapshot.frame, 1);
    assert_eq!(snapshot.actors.len(), episode.actor_registry().len());
    assert_eq!(snapshot.actors.last().unwrap().description_id, definition.id);
    assert!(snapshot.actors.windows(2).all(|w| w[0].id < w[1].id));
}

// =============================================================================
// Game Instance
// =============================================================================

/// Full offline lifecycle: begin, serve, tick, end.
#[test]
fn test_instance_lifecycle() {
    let mut world = level();
    let config = SimulationConfig::default()
        .with_map_name("Town05")
        .with_networking(false)
        .with_rpc_worker_threads(2);
    let mut instance = GameInstance::new(config);

    let id = instance.begin_play(&mut world, &factories());
    assert_eq!(instance.episode().unwrap().map_name(), "Town05");
    assert_eq!(instance.episode().unwrap().actor_definitions().len(), 8);
    assert!(instance.player_controller().unwrap().pawn().is_some());

    instance.notify_begin_episode().unwrap();
    for _ in 0..3 {
        instance.tick(&mut world, 1.0 / 30.0);
    }

    let episode = instance.end_play().unwrap();
    assert_eq!(episode.id(), id);
    assert_eq!(episode.frame(), 3);
}
