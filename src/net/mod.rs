//! Authority boundary: RPC between clients and the authoritative server.
//!
//! ## Key Types
//!
//! - `RpcRequest`: The three remote operations (spawn, apply control, autopilot)
//! - `PlayerController`: Admits and executes requests on the server
//! - `RpcServer`: Worker-pool transport feeding a tick-thread inbox
//! - `ClientSession`: Provisional ids and request forwarding on a client
//! - `RpcTransport`: Loopback and TCP connections
//!
//! Only the tick thread mutates the episode. Transport threads move bytes.

pub mod client;
pub mod codec;
pub mod controller;
pub mod messages;
pub mod server;
pub mod transport;

pub use client::{ClientSession, TcpTransport, OUTGOING_CAPACITY};
pub use codec::{decode_payload, encode_payload, rpc_codec, MAX_FRAME_LEN};
pub use controller::{ControlError, PlayerController};
pub use messages::{RpcEnvelope, RpcOutcome, RpcReply, RpcRequest};
pub use server::{Inbound, RpcServer, DEFAULT_INBOX_CAPACITY};
pub use transport::{LoopbackTransport, RpcTransport, TransportError};
