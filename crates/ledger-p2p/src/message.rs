//! The ten message types exchanged over a peer connection, and the
//! single-byte-terminated frame they travel in (§4.6).

use ledger_core::constants::FRAME_TERMINATOR;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::P2pError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    Connect = 0,
    Head = 1,
    Relay = 2,
    Compute = 3,
    Fetch = 4,
    ConnectResponse = 5,
    HeadResponse = 6,
    RelayResponse = 7,
    ComputeResponse = 8,
    FetchResponse = 9,
}

impl TryFrom<u8> for MessageType {
    type Error = P2pError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use MessageType::*;
        Ok(match value {
            0 => Connect,
            1 => Head,
            2 => Relay,
            3 => Compute,
            4 => Fetch,
            5 => ConnectResponse,
            6 => HeadResponse,
            7 => RelayResponse,
            8 => ComputeResponse,
            9 => FetchResponse,
            other => return Err(P2pError::UnknownMessageType(other)),
        })
    }
}

/// Reads bytes off `reader` up to and including [`FRAME_TERMINATOR`] and
/// returns everything before it. Payloads must not contain the terminator
/// byte themselves — a known fragility of this framing (transaction bytes
/// routinely contain 0xFF, e.g. inside hashes); see DESIGN.md.
pub async fn read_frame<R: tokio::io::AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, P2pError> {
    let mut frame = Vec::new();
    loop {
        let byte = reader.read_u8().await?;
        if byte == FRAME_TERMINATOR {
            return Ok(frame);
        }
        frame.push(byte);
    }
}

/// Writes `type_byte.into_iter().chain(payload) ‖ 0xFF`. Pass `type_byte =
/// None` for the one wire case that carries no type byte at all: the
/// response to a `Connect` request, which this protocol writes as a bare
/// comma-separated peer list (§4.6 — `ConnectResponse` is reserved and
/// never actually emitted).
pub async fn write_frame<W: tokio::io::AsyncWrite + Unpin>(
    writer: &mut W,
    type_byte: Option<MessageType>,
    payload: &[u8],
) -> Result<(), P2pError> {
    let mut out = Vec::with_capacity(1 + payload.len() + 1);
    if let Some(ty) = type_byte {
        out.push(ty as u8);
    }
    out.extend_from_slice(payload);
    out.push(FRAME_TERMINATOR);
    writer.write_all(&out).await?;
    writer.flush().await?;
    Ok(())
}
