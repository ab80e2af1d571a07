// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FrameError;

/// Upper bound on a frame's declared body length (SPEC_FULL §4.1). Chosen to
/// comfortably fit an `IDENTIFIER`/`EVENT_BATCH` payload while still bounding
/// a malicious or buggy peer's ability to make us allocate.
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Read one length-prefixed JSON frame: a 4-byte big-endian length header
/// followed by exactly that many bytes of `T`'s JSON encoding. Generic over
/// `T` so the same codec serves both the peer-to-peer `SignedEnvelope` and
/// the differently-shaped miner RPC request/response envelopes.
///
/// The length is checked against [`MAX_FRAME_BYTES`] before any body bytes
/// are read, so an oversized claim costs four bytes, not an allocation.
pub async fn read_frame<T, R>(reader: &mut R) -> Result<T, FrameError>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let len = match reader.read_u32().await {
        Ok(len) => len,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(FrameError::Eof),
        Err(e) => return Err(e.into()),
    };
    let len = len as usize;
    if len > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge(len as u32, MAX_FRAME_BYTES));
    }

    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => FrameError::Eof,
            _ => FrameError::Io(e),
        })?;

    std::str::from_utf8(&body)?;
    let value = serde_json::from_slice(&body)?;
    Ok(value)
}

/// Write one length-prefixed JSON frame. Buffers the header and body into a
/// single allocation so the write is one `write_all` call — peers that read
/// with a short TCP timeout shouldn't see a frame arrive in two packets
/// stalled apart.
pub async fn write_frame<T, W>(writer: &mut W, value: &T) -> Result<(), FrameError>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let body = serde_json::to_vec(value)?;
    if body.len() > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge(body.len() as u32, MAX_FRAME_BYTES));
    }

    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&(body.len() as u32).to_be_bytes());
    framed.extend_from_slice(&body);

    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}
