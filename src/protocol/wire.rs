//! Telemetry session framing
//!
//! One `TelemetryMessage` per frame over the long-lived TCP session:
//! a u32 big-endian length prefix followed by the bincode payload.
//! A frame that fails to decode is connection-fatal (the peer is evicted);
//! a frame that decodes to an unexpected variant is handled by the caller
//! without closing the session.

use crate::common::{Error, Result};
use crate::protocol::TelemetryMessage;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single frame; a record is a few hundred bytes.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Write one length-prefixed message.
pub async fn write_message<W>(writer: &mut W, msg: &TelemetryMessage) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let payload = bincode::serialize(msg).map_err(|e| Error::Encode(e.to_string()))?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(Error::Encode(format!(
            "frame of {} bytes exceeds cap",
            payload.len()
        )));
    }
    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed message.
pub async fn read_message<R>(reader: &mut R) -> Result<TelemetryMessage>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u32().await? as usize;
    if len > MAX_FRAME_LEN {
        return Err(Error::MalformedPayload(format!(
            "declared frame length {} exceeds cap",
            len
        )));
    }
    let mut buf = BytesMut::zeroed(len);
    reader.read_exact(&mut buf).await?;
    bincode::deserialize(&buf).map_err(|e| Error::MalformedPayload(e.to_string()))
}
