//! RPC server.
//!
//! Transport runs on a tokio worker pool; entity mutation does not. Workers
//! decode frames and push `Inbound` requests into a crossbeam inbox. The
//! tick thread drains the inbox, executes each request against the episode
//! and answers through the request's reply sink.
//!
//! ```text
//!  TCP conn ──► reader task ──┐
//!  TCP conn ──► reader task ──┼──► inbox ──► drain() on tick thread
//!  loopback ──────────────────┘                      │
//!                                                    ▼
//!  TCP conn ◄── writer task ◄── reply sink ◄── Inbound::reply()
//! ```

use std::net::SocketAddr;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::codec::{decode_payload, encode_payload, frame_reader, frame_writer};
use super::messages::{RpcEnvelope, RpcOutcome, RpcReply};
use super::transport::{LoopbackTransport, TransportError};

/// Requests the inbox holds between two ticks before it starts rejecting.
pub const DEFAULT_INBOX_CAPACITY: usize = 4096;

/// Replies buffered per TCP connection while its writer catches up.
const CONNECTION_REPLY_CAPACITY: usize = 1024;

/// Where the answer to a request goes.
#[derive(Clone, Debug)]
pub(crate) enum ReplySink {
    Loopback(Sender<RpcReply>),
    Tcp(mpsc::Sender<RpcReply>),
}

/// A request waiting for the tick thread.
#[derive(Debug)]
pub struct Inbound {
    pub envelope: RpcEnvelope,
    reply: ReplySink,
}

impl Inbound {
    pub(crate) fn new(envelope: RpcEnvelope, reply: ReplySink) -> Self {
        Self { envelope, reply }
    }

    /// Send the answer back. Returns `false` if the client went away or its
    /// reply queue is full.
    pub fn reply(&self, reply: RpcReply) -> bool {
        match &self.reply {
            ReplySink::Loopback(tx) => tx.send(reply).is_ok(),
            ReplySink::Tcp(tx) => tx.try_send(reply).is_ok(),
        }
    }

    fn reject(&self) -> bool {
        self.reply(RpcReply {
            sequence: self.envelope.sequence,
            outcome: RpcOutcome::Rejected,
        })
    }
}

/// Queue `inbound` for the tick thread.
///
/// A full inbox answers the request with `RpcOutcome::Rejected` right away.
/// Fails only when the server is gone.
pub(crate) fn admit(inbox: &Sender<Inbound>, inbound: Inbound) -> Result<(), TransportError> {
    match inbox.try_send(inbound) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(inbound)) => {
            warn!(
                "RPC inbox full, rejecting {} #{}",
                inbound.envelope.request.name(),
                inbound.envelope.sequence
            );
            inbound.reject();
            Ok(())
        }
        Err(TrySendError::Disconnected(_)) => Err(TransportError::Disconnected),
    }
}

/// Accepts requests from loopback and TCP clients.
pub struct RpcServer {
    inbox_tx: Sender<Inbound>,
    inbox_rx: Receiver<Inbound>,
    inbox_capacity: usize,
    worker_threads: usize,
    runtime: Option<Runtime>,
    local_addr: Option<SocketAddr>,
}

impl std::fmt::Debug for RpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcServer")
            .field("worker_threads", &self.worker_threads)
            .field("local_addr", &self.local_addr)
            .field("pending", &self.inbox_rx.len())
            .field("inbox_capacity", &self.inbox_capacity)
            .finish()
    }
}

impl RpcServer {
    /// Create a server with the default inbox. Nothing listens until `start`.
    #[must_use]
    pub fn new(worker_threads: usize) -> Self {
        Self::with_inbox_capacity(worker_threads, DEFAULT_INBOX_CAPACITY)
    }

    /// Create a server whose inbox holds at most `capacity` requests.
    #[must_use]
    pub fn with_inbox_capacity(worker_threads: usize, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (inbox_tx, inbox_rx) = crossbeam_channel::bounded(capacity);
        Self {
            inbox_tx,
            inbox_rx,
            inbox_capacity: capacity,
            worker_threads: worker_threads.max(1),
            runtime: None,
            local_addr: None,
        }
    }

    #[must_use]
    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    #[must_use]
    pub fn inbox_capacity(&self) -> usize {
        self.inbox_capacity
    }

    /// Open an in-process connection.
    #[must_use]
    pub fn connect_loopback(&self) -> LoopbackTransport {
        LoopbackTransport::new(self.inbox_tx.clone())
    }

    /// Bind `addr` and start accepting connections on the worker pool.
    ///
    /// Calling `start` on a listening server returns the existing address.
    pub fn start(&mut self, addr: SocketAddr) -> Result<SocketAddr, TransportError> {
        if let Some(local) = self.local_addr {
            return Ok(local);
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.worker_threads)
            .thread_name("rpc-worker")
            .enable_all()
            .build()?;

        let listener = runtime.block_on(TcpListener::bind(addr))?;
        let local = listener.local_addr()?;
        runtime.spawn(accept_loop(listener, self.inbox_tx.clone()));

        info!(
            "RPC server listening on {} with {} workers",
            local, self.worker_threads
        );
        self.runtime = Some(runtime);
        self.local_addr = Some(local);
        Ok(local)
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.local_addr.is_some()
    }

    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// Requests waiting in the inbox.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inbox_rx.len()
    }

    /// Take every queued request, in arrival order.
    pub fn drain(&self) -> Vec<Inbound> {
        self.inbox_rx.try_iter().collect()
    }

    /// Stop listening and drop every connection.
    pub fn shutdown(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            info!("RPC server stopped");
        }
        self.local_addr = None;
    }
}

impl Drop for RpcServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn accept_loop(listener: TcpListener, inbox: Sender<Inbound>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                debug!("RPC connection from {}", peer);
                tokio::spawn(serve_connection(stream, peer, inbox.clone()));
            }
            Err(e) => warn!("Failed to accept RPC connection: {}", e),
        }
    }
}

async fn serve_connection(stream: TcpStream, peer: SocketAddr, inbox: Sender<Inbound>) {
    let (reader, writer) = stream.into_split();
    let mut frames = frame_reader(reader);
    let mut sink = frame_writer(writer);
    let (reply_tx, mut reply_rx) = mpsc::channel::<RpcReply>(CONNECTION_REPLY_CAPACITY);

    tokio::spawn(async move {
        while let Some(reply) = reply_rx.recv().await {
            let sent = match encode_payload(&reply) {
                Ok(payload) => sink.send(payload).await.map_err(TransportError::from),
                Err(e) => Err(e),
            };
            if let Err(e) = sent {
                warn!("Failed to send RPC reply to {}: {}", peer, e);
                break;
            }
        }
    });

    while let Some(frame) = frames.next().await {
        let envelope = match frame.map_err(TransportError::from).and_then(|f| decode_payload::<RpcEnvelope>(&f)) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Dropping RPC connection from {}: {}", peer, e);
                return;
            }
        };
        if admit(&inbox, Inbound::new(envelope, ReplySink::Tcp(reply_tx.clone()))).is_err() {
            return;
        }
    }
    debug!("RPC connection from {} closed", peer);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActorId, ClientOrdinal};
    use crate::net::{RpcOutcome, RpcRequest, RpcTransport};

    fn autopilot(sequence: u64) -> RpcEnvelope {
        RpcEnvelope {
            client: ClientOrdinal::new(0),
            sequence,
            request: RpcRequest::SetActorAutopilot {
                actor_id: ActorId(1),
                enabled: true,
            },
        }
    }

    #[test]
    fn test_drain_preserves_order() {
        let server = RpcServer::new(2);
        let a = server.connect_loopback();
        let b = server.connect_loopback();

        a.send(autopilot(1)).unwrap();
        b.send(autopilot(2)).unwrap();
        a.send(autopilot(3)).unwrap();
        assert_eq!(server.pending(), 3);

        let sequences: Vec<_> = server.drain().iter().map(|i| i.envelope.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert!(server.drain().is_empty());
    }

    #[test]
    fn test_reply_reaches_sender_only() {
        let server = RpcServer::new(2);
        let a = server.connect_loopback();
        let b = server.connect_loopback();

        a.send(autopilot(1)).unwrap();
        for inbound in server.drain() {
            inbound.reply(RpcReply {
                sequence: inbound.envelope.sequence,
                outcome: RpcOutcome::Rejected,
            });
        }

        assert_eq!(a.try_recv().unwrap().map(|r| r.sequence), Some(1));
        assert!(b.try_recv().unwrap().is_none());
    }

    #[test]
    fn test_full_inbox_rejects_immediately() {
        let server = RpcServer::with_inbox_capacity(2, 2);
        let client = server.connect_loopback();

        for sequence in 1..=3 {
            client.send(autopilot(sequence)).unwrap();
        }
        assert_eq!(server.pending(), 2);

        let rejected = client.try_recv().unwrap().unwrap();
        assert_eq!(rejected.sequence, 3);
        assert_eq!(rejected.outcome, RpcOutcome::Rejected);

        let sequences: Vec<_> = server.drain().iter().map(|i| i.envelope.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);

        client.send(autopilot(4)).unwrap();
        assert_eq!(server.pending(), 1);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut server = RpcServer::new(2);
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();

        let first = server.start(addr).unwrap();
        let second = server.start(addr).unwrap();
        assert_eq!(first, second);
        assert!(server.is_listening());

        server.shutdown();
        assert!(!server.is_listening());
    }
}
