//! Client side of the authority boundary.
//!
//! A `ClientSession` belongs to one non-authoritative process. Spawns are
//! answered immediately with a provisional view whose id comes from the
//! session's own partition:
//!
//! ```text
//! client k: k * partition_size + 1  ..=  (k + 1) * partition_size - 1
//! ```
//!
//! The request is forwarded to the server without waiting. When the spawn
//! reply arrives, the session records which authoritative id the server
//! assigned; the provisional view itself is never rewritten. Use
//! [`ClientSession::resolve`] to translate.

use std::net::SocketAddr;

use crossbeam_channel::{Receiver, TryRecvError};
use futures::{SinkExt, StreamExt};
use rustc_hash::FxHashMap;
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use super::codec::{decode_payload, encode_payload, frame_reader, frame_writer};
use super::messages::{RpcEnvelope, RpcOutcome, RpcReply, RpcRequest};
use super::transport::{RpcTransport, TransportError};
use crate::actors::{ActorDescription, ActorView, SpawnStatus};
use crate::core::{ActorId, ClientOrdinal, SimulationConfig, Transform};
use crate::world::VehicleControl;

/// Requests a `TcpTransport` buffers before `send` reports `QueueFull`.
pub const OUTGOING_CAPACITY: usize = 1024;

/// Per-client connection state.
pub struct ClientSession {
    client: ClientOrdinal,
    partition_size: u32,
    counter: u32,
    next_sequence: u64,
    transport: Box<dyn RpcTransport>,
    resolved: FxHashMap<ActorId, ActorId>,
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("client", &self.client)
            .field("partition_size", &self.partition_size)
            .field("counter", &self.counter)
            .field("resolved", &self.resolved.len())
            .finish()
    }
}

impl ClientSession {
    pub fn new(client: ClientOrdinal, partition_size: u32, transport: Box<dyn RpcTransport>) -> Self {
        Self {
            client,
            partition_size,
            counter: 0,
            next_sequence: 1,
            transport,
            resolved: FxHashMap::default(),
        }
    }

    /// Session whose partition size comes from `config`.
    pub fn from_config(client: ClientOrdinal, config: &SimulationConfig, transport: Box<dyn RpcTransport>) -> Self {
        Self::new(client, config.partition_size, transport)
    }

    #[must_use]
    pub fn client(&self) -> ClientOrdinal {
        self.client
    }

    #[must_use]
    pub fn partition_size(&self) -> u32 {
        self.partition_size
    }

    /// Provisional ids handed out so far.
    #[must_use]
    pub fn issued(&self) -> u32 {
        self.counter
    }

    /// Take the next provisional id, or `None` once the partition is used up
    /// or lies past the end of the id space.
    pub fn next_provisional_id(&mut self) -> Option<ActorId> {
        let counter = self.counter.checked_add(1)?;
        if counter >= self.partition_size {
            return None;
        }
        let id = ActorId::provisional(self.client, counter, self.partition_size)?;
        self.counter = counter;
        Some(id)
    }

    /// Forward a spawn and return a provisional view right away.
    pub fn request_spawn(
        &mut self,
        transform: &Transform,
        description: ActorDescription,
    ) -> (SpawnStatus, ActorView) {
        let Some(provisional_id) = self.next_provisional_id() else {
            error!(
                "{} exhausted its {} provisional ids",
                self.client, self.partition_size
            );
            return (SpawnStatus::IdSpaceExhausted, ActorView::invalid());
        };

        let view = ActorView::provisional(provisional_id, description.clone());
        let request = RpcRequest::SpawnActorWithInfo {
            transform: *transform,
            description,
            provisional_id,
        };
        if let Err(e) = self.send(request) {
            error!("Failed to forward spawn of {}: {}", provisional_id, e);
            return (SpawnStatus::UnknownError, ActorView::invalid());
        }
        (SpawnStatus::Success, view)
    }

    /// Forward a control update. Returns the request's sequence number.
    pub fn apply_control(&mut self, actor_id: ActorId, control: VehicleControl) -> Result<u64, TransportError> {
        self.send(RpcRequest::ApplyControlToActor { actor_id, control })
    }

    /// Forward an autopilot toggle. Returns the request's sequence number.
    pub fn set_autopilot(&mut self, actor_id: ActorId, enabled: bool) -> Result<u64, TransportError> {
        self.send(RpcRequest::SetActorAutopilot { actor_id, enabled })
    }

    /// Collect every reply that has arrived, recording spawn results.
    pub fn poll_replies(&mut self) -> Result<Vec<RpcReply>, TransportError> {
        let mut replies = Vec::new();
        while let Some(reply) = self.transport.try_recv()? {
            if let RpcOutcome::Spawned {
                provisional_id,
                status: SpawnStatus::Success,
                actor_id,
            } = reply.outcome
            {
                debug!("{} resolved to {}", provisional_id, actor_id);
                self.resolved.insert(provisional_id, actor_id);
            }
            replies.push(reply);
        }
        Ok(replies)
    }

    /// Authoritative id the server assigned for a provisional one.
    #[must_use]
    pub fn resolve(&self, provisional: ActorId) -> Option<ActorId> {
        self.resolved.get(&provisional).copied()
    }

    fn send(&mut self, request: RpcRequest) -> Result<u64, TransportError> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.transport.send(RpcEnvelope {
            client: self.client,
            sequence,
            request,
        })?;
        Ok(sequence)
    }
}

/// Length-delimited bincode frames over TCP, driven by a private tokio
/// runtime.
pub struct TcpTransport {
    runtime: Option<Runtime>,
    outgoing: mpsc::Sender<RpcEnvelope>,
    replies: Receiver<RpcReply>,
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("pending_replies", &self.replies.len())
            .finish()
    }
}

impl TcpTransport {
    /// Connect to an `RpcServer`.
    pub fn connect(addr: SocketAddr) -> Result<Self, TransportError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("rpc-client")
            .enable_all()
            .build()?;

        let stream = runtime.block_on(TcpStream::connect(addr))?;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();
        let mut frames = frame_reader(reader);
        let mut sink = frame_writer(writer);

        let (outgoing, mut outgoing_rx) = mpsc::channel::<RpcEnvelope>(OUTGOING_CAPACITY);
        // Replies only answer this client's own requests, so the outgoing
        // bound also bounds this queue.
        let (reply_tx, replies) = crossbeam_channel::unbounded();

        runtime.spawn(async move {
            while let Some(envelope) = outgoing_rx.recv().await {
                let sent = match encode_payload(&envelope) {
                    Ok(payload) => sink.send(payload).await.map_err(TransportError::from),
                    Err(e) => Err(e),
                };
                if let Err(e) = sent {
                    warn!("Failed to send RPC request: {}", e);
                    break;
                }
            }
        });

        runtime.spawn(async move {
            while let Some(frame) = frames.next().await {
                let reply = match frame.map_err(TransportError::from).and_then(|f| decode_payload::<RpcReply>(&f)) {
                    Ok(reply) => reply,
                    Err(e) => {
                        warn!("Dropping RPC connection: {}", e);
                        break;
                    }
                };
                if reply_tx.send(reply).is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            runtime: Some(runtime),
            outgoing,
            replies,
        })
    }
}

impl RpcTransport for TcpTransport {
    fn send(&self, envelope: RpcEnvelope) -> Result<(), TransportError> {
        self.outgoing.try_send(envelope).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TransportError::Disconnected,
        })
    }

    fn try_recv(&self) -> Result<Option<RpcReply>, TransportError> {
        match self.replies.try_recv() {
            Ok(reply) => Ok(Some(reply)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::RpcServer;

    fn session(client: u16, partition_size: u32) -> (RpcServer, ClientSession) {
        let server = RpcServer::new(2);
        let transport = server.connect_loopback();
        let session = ClientSession::new(ClientOrdinal::new(client), partition_size, Box::new(transport));
        (server, session)
    }

    #[test]
    fn test_provisional_ids_start_after_base() {
        let (_server, mut session) = session(1, 10_000);
        assert_eq!(session.next_provisional_id(), Some(ActorId(10_001)));
        assert_eq!(session.next_provisional_id(), Some(ActorId(10_002)));
        assert_eq!(session.issued(), 2);
    }

    /// A partition beyond the end of the id space exhausts instead of
    /// overflowing into another client's ids.
    #[test]
    fn test_partition_past_id_space_exhausts() {
        let (server, mut session) = session(5_000, 1_000_000);
        assert_eq!(session.next_provisional_id(), None);
        assert_eq!(session.issued(), 0);

        let (status, view) = session.request_spawn(&Transform::identity(), ActorDescription::new("x"));
        assert_eq!(status, SpawnStatus::IdSpaceExhausted);
        assert!(!view.is_valid());
        assert_eq!(server.pending(), 0);
    }

    #[test]
    fn test_partition_ends_at_id_space_edge() {
        // Client 2's base is u32::MAX - 1, so only one id fits
        let size = u32::MAX / 2;
        let (_server, mut session) = session(2, size);
        assert_eq!(session.next_provisional_id(), Some(ActorId(u32::MAX)));
        assert_eq!(session.next_provisional_id(), None);
        assert_eq!(session.issued(), 1);
    }

    #[test]
    fn test_from_config_uses_partition_size() {
        let server = RpcServer::new(2);
        let config = SimulationConfig::default().with_partition_size(3);
        let mut session = ClientSession::from_config(
            ClientOrdinal::new(4),
            &config,
            Box::new(server.connect_loopback()),
        );

        assert_eq!(session.partition_size(), 3);
        assert_eq!(session.next_provisional_id(), Some(ActorId(13)));
        assert_eq!(session.next_provisional_id(), Some(ActorId(14)));
        assert_eq!(session.next_provisional_id(), None);
    }

    #[test]
    fn test_partition_exhaustion() {
        let (server, mut session) = session(0, 3);
        assert_eq!(session.next_provisional_id(), Some(ActorId(1)));
        assert_eq!(session.next_provisional_id(), Some(ActorId(2)));
        assert_eq!(session.next_provisional_id(), None);

        let (status, view) = session.request_spawn(&Transform::identity(), ActorDescription::new("x"));
        assert_eq!(status, SpawnStatus::IdSpaceExhausted);
        assert!(!view.is_valid());
        assert_eq!(server.pending(), 0);
    }

    #[test]
    fn test_request_spawn_is_provisional() {
        let (server, mut session) = session(2, 10_000);
        let (status, view) = session.request_spawn(
            &Transform::identity(),
            ActorDescription::new("vehicle.audi.tt"),
        );

        assert_eq!(status, SpawnStatus::Success);
        assert!(view.is_provisional());
        assert_eq!(view.id(), ActorId(20_001));

        let inbound = server.drain();
        assert_eq!(inbound.len(), 1);
        assert_eq!(inbound[0].envelope.client, ClientOrdinal::new(2));
        assert!(matches!(
            inbound[0].envelope.request,
            RpcRequest::SpawnActorWithInfo { provisional_id: ActorId(20_001), .. }
        ));
    }

    #[test]
    fn test_poll_records_resolution() {
        let (server, mut session) = session(0, 10_000);
        let (_, view) = session.request_spawn(&Transform::identity(), ActorDescription::new("a"));

        for inbound in server.drain() {
            inbound.reply(RpcReply {
                sequence: inbound.envelope.sequence,
                outcome: RpcOutcome::Spawned {
                    provisional_id: view.id(),
                    status: SpawnStatus::Success,
                    actor_id: ActorId(4),
                },
            });
        }

        let replies = session.poll_replies().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(session.resolve(view.id()), Some(ActorId(4)));
        assert_eq!(session.resolve(ActorId(12345)), None);
    }

    #[test]
    fn test_sequences_increase() {
        let (server, mut session) = session(0, 10_000);
        let a = session.set_autopilot(ActorId(1), true).unwrap();
        let b = session.apply_control(ActorId(1), VehicleControl::default()).unwrap();
        assert!(b > a);
        assert_eq!(server.pending(), 2);
    }
}
