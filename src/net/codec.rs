//! Frame codec.
//!
//! ## Frame Layout
//!
//! ```text
//! +----------------+--------------------------+
//! | len: u32 (LE)  | bincode payload (len B)  |
//! +----------------+--------------------------+
//! ```
//!
//! Framing is `LengthDelimitedCodec`; this module only configures it and
//! turns payloads into messages. Frames larger than `MAX_FRAME_LEN` are
//! rejected on both ends.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use super::transport::TransportError;

/// Size of the length prefix.
pub const HEADER_LEN: usize = 4;

/// Largest accepted payload.
pub const MAX_FRAME_LEN: usize = 1 << 20;

/// Length-prefixed codec shared by client and server.
#[must_use]
pub fn rpc_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .little_endian()
        .length_field_length(HEADER_LEN)
        .max_frame_length(MAX_FRAME_LEN)
        .new_codec()
}

/// Frame reader over the read half of a connection.
pub fn frame_reader<R: AsyncRead>(reader: R) -> FramedRead<R, LengthDelimitedCodec> {
    FramedRead::new(reader, rpc_codec())
}

/// Frame writer over the write half of a connection.
pub fn frame_writer<W: AsyncWrite>(writer: W) -> FramedWrite<W, LengthDelimitedCodec> {
    FramedWrite::new(writer, rpc_codec())
}

/// Serialize `message` into one frame payload.
pub fn encode_payload<T: Serialize>(message: &T) -> Result<Bytes, TransportError> {
    let payload = bincode::serialize(message)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(payload.len()));
    }
    Ok(Bytes::from(payload))
}

/// Deserialize one frame payload.
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T, TransportError> {
    Ok(bincode::deserialize(payload)?)
}
