//! Transport abstraction for RPC envelopes.
//!
//! Implementations:
//! - `LoopbackTransport`: in-process crossbeam channels straight into a
//!   server's inbox
//! - `TcpTransport` (in `client`): length-delimited bincode frames over TCP

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use thiserror::Error;

use super::messages::{RpcEnvelope, RpcReply};
use super::server::{admit, Inbound, ReplySink};

/// Transport failures.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("frame of {0} bytes exceeds the limit")]
    FrameTooLarge(usize),

    #[error("outgoing queue is full")]
    QueueFull,

    #[error("peer disconnected")]
    Disconnected,
}

/// Client side of an RPC connection.
pub trait RpcTransport: Send {
    /// Queue an envelope for the server. Never blocks on the round trip.
    fn send(&self, envelope: RpcEnvelope) -> Result<(), TransportError>;

    /// Next reply, if one has arrived.
    fn try_recv(&self) -> Result<Option<RpcReply>, TransportError>;
}

/// In-process connection to an `RpcServer`.
#[derive(Clone, Debug)]
pub struct LoopbackTransport {
    inbox: Sender<Inbound>,
    reply_tx: Sender<RpcReply>,
    replies: Receiver<RpcReply>,
}

impl LoopbackTransport {
    pub(crate) fn new(inbox: Sender<Inbound>) -> Self {
        let (reply_tx, replies) = crossbeam_channel::unbounded();
        Self {
            inbox,
            reply_tx,
            replies,
        }
    }

    /// Replies waiting to be read.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.replies.len()
    }
}

impl RpcTransport for LoopbackTransport {
    fn send(&self, envelope: RpcEnvelope) -> Result<(), TransportError> {
        admit(
            &self.inbox,
            Inbound::new(envelope, ReplySink::Loopback(self.reply_tx.clone())),
        )
    }

    fn try_recv(&self) -> Result<Option<RpcReply>, TransportError> {
        match self.replies.try_recv() {
            Ok(reply) => Ok(Some(reply)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Disconnected),
        }
    }
}
