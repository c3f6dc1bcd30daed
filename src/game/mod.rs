//! Episodes and the process-level game instance.
//!
//! ## Key Types
//!
//! - `Episode`: One simulation run; owns the dispatcher and the spawn authority split
//! - `GameInstance`: Creates episodes, runs the RPC server, drives ticks
//! - `WorldObserver`: Entity streaming `EpisodeSnapshot`s to external observers

pub mod episode;
pub mod instance;
pub mod observer;
pub mod traffic;

pub use episode::{Authority, Episode, SPECTATOR_ID};
pub use instance::GameInstance;
pub use observer::{ActorSnapshot, EpisodeSnapshot, ObserverStream, WorldObserver};
pub use traffic::traffic_description_id;
