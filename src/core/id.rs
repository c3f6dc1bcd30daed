//! Identifier types.
//!
//! ## ID Layout
//!
//! Two numeric spaces coexist:
//!
//! - `DefinitionId` (the catalog "UId"): `1..=N` in registration order,
//!   `0` reserved for "unresolved".
//! - `ActorId`: live actors. The authoritative side allocates them
//!   sequentially from 1. A non-authoritative client hands out *provisional*
//!   ids from its own partition so that concurrent clients never collide:
//!
//! ```
//! use sim_actors::core::{ActorId, ClientOrdinal};
//!
//! let partition_size = 10_000;
//!
//! // Client 0 owns [1, 10000), client 1 owns [10000, 20000)
//! let base = ClientOrdinal::new(1).partition_base(partition_size);
//! assert_eq!(base, Some(10_000));
//!
//! let id = ActorId::provisional(ClientOrdinal::new(1), 1, partition_size).unwrap();
//! assert_eq!(id, ActorId(10_001));
//!
//! // Partitions past the end of the id space do not exist
//! assert_eq!(ClientOrdinal::new(5_000).partition_base(1_000_000), None);
//! assert!(id.is_in_partition(ClientOrdinal::new(1), partition_size));
//! ```

use serde::{Deserialize, Serialize};

/// Default number of provisional ids reserved per client.
pub const PARTITION_SIZE: u32 = 10_000;

/// Identifier of a catalog definition (1-based, `0` = unresolved).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DefinitionId(pub u32);

impl DefinitionId {
    /// The reserved "unresolved" id.
    pub const UNRESOLVED: DefinitionId = DefinitionId(0);

    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_resolved(self) -> bool {
        self.0 != 0
    }

    /// Zero-based table index, `None` when unresolved.
    #[must_use]
    pub const fn index(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some((self.0 - 1) as usize)
        }
    }
}

impl std::fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UId({})", self.0)
    }
}

/// Identifier of a live actor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl ActorId {
    /// The "no actor" id carried by invalid views.
    pub const NONE: ActorId = ActorId(0);

    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Provisional id for the `counter`-th spawn of `client`.
    ///
    /// `counter` is expected to be in `1..partition_size`. Returns `None` when
    /// the id does not fit in the id space.
    #[must_use]
    pub const fn provisional(client: ClientOrdinal, counter: u32, partition_size: u32) -> Option<Self> {
        match client.partition_base(partition_size) {
            Some(base) => match base.checked_add(counter) {
                Some(id) => Some(Self(id)),
                None => None,
            },
            None => None,
        }
    }

    /// Check whether this id falls in `client`'s provisional partition.
    #[must_use]
    pub const fn is_in_partition(self, client: ClientOrdinal, partition_size: u32) -> bool {
        let base = client.0 as u64 * partition_size as u64;
        let id = self.0 as u64;
        id >= base && id < base + partition_size as u64
    }
}

impl From<u32> for ActorId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Actor({})", self.0)
    }
}

/// Ordinal of a connected client; selects its provisional id partition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientOrdinal(pub u16);

impl ClientOrdinal {
    #[must_use]
    pub const fn new(ordinal: u16) -> Self {
        Self(ordinal)
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// First id of this client's partition, or `None` past the id space.
    #[must_use]
    pub const fn partition_base(self, partition_size: u32) -> Option<u32> {
        (self.0 as u32).checked_mul(partition_size)
    }
}

impl std::fmt::Display for ClientOrdinal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Client({})", self.0)
    }
}

/// Identifier of a simulation episode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeId(pub u32);

impl std::fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Episode({})", self.0)
    }
}

/// Hands out episode ids. Owned by the game instance.
#[derive(Clone, Debug, Default)]
pub struct EpisodeIdAllocator {
    last: u32,
}

impl EpisodeIdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id, starting at 1.
    pub fn allocate(&mut self) -> EpisodeId {
        self.last += 1;
        EpisodeId(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_id_index() {
        assert_eq!(DefinitionId::UNRESOLVED.index(), None);
        assert_eq!(DefinitionId::new(1).index(), Some(0));
        assert_eq!(DefinitionId::new(7).index(), Some(6));
        assert!(!DefinitionId::default().is_resolved());
    }

    #[test]
    fn test_partitions_2_clients() {
        let size = PARTITION_SIZE;
        let c0 = ClientOrdinal::new(0);
        let c1 = ClientOrdinal::new(1);

        assert!(ActorId(1).is_in_partition(c0, size));
        assert!(ActorId(9_999).is_in_partition(c0, size));
        assert!(!ActorId(10_000).is_in_partition(c0, size));

        assert!(ActorId(10_000).is_in_partition(c1, size));
        assert!(ActorId(19_999).is_in_partition(c1, size));
        assert!(!ActorId(20_000).is_in_partition(c1, size));
    }

    #[test]
    fn test_provisional() {
        assert_eq!(ActorId::provisional(ClientOrdinal::new(0), 1, 10_000), Some(ActorId(1)));
        assert_eq!(ActorId::provisional(ClientOrdinal::new(2), 5, 100), Some(ActorId(205)));
    }

    #[test]
    fn test_partition_past_id_space() {
        let far = ClientOrdinal::new(5_000);
        assert_eq!(far.partition_base(1_000_000), None);
        assert_eq!(ActorId::provisional(far, 1, 1_000_000), None);
        assert!(!ActorId(u32::MAX).is_in_partition(far, 1_000_000));

        // Base fits but base + counter does not
        let last = ClientOrdinal::new(1);
        assert_eq!(last.partition_base(u32::MAX), Some(u32::MAX));
        assert_eq!(ActorId::provisional(last, 1, u32::MAX), None);
        assert!(ActorId(u32::MAX).is_in_partition(last, u32::MAX));
    }

    #[test]
    fn test_episode_ids_are_sequential() {
        let mut alloc = EpisodeIdAllocator::new();
        assert_eq!(alloc.allocate(), EpisodeId(1));
        assert_eq!(alloc.allocate(), EpisodeId(2));

        // Independent allocators do not share state
        let mut other = EpisodeIdAllocator::new();
        assert_eq!(other.allocate(), EpisodeId(1));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ActorId(42)), "Actor(42)");
        assert_eq!(format!("{}", DefinitionId(3)), "UId(3)");
        assert_eq!(format!("{}", ClientOrdinal(1)), "Client(1)");
    }
}
