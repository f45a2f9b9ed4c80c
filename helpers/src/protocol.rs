use crate::Frame;
use std::io::ErrorKind;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound for a single frame payload.
pub const MAX_FRAME_LEN: u32 = 1 << 20;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid frame: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("frame of {0} bytes exceeds the 1 MiB limit")]
    TooLarge(usize),
}

/// Length prefix for a payload of `len` bytes.
fn length_prefix(len: usize) -> Result<[u8; 4], ProtocolError> {
    if len > MAX_FRAME_LEN as usize {
        return Err(ProtocolError::TooLarge(len));
    }
    Ok((len as u32).to_le_bytes())
}

/// Reading half of a connection. Frames are a little endian `u32` length
/// followed by the JSON encoded `Frame`.
pub struct FrameReader<R> {
    stream: R,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(stream: R) -> Self {
        Self { stream }
    }

    /// Returns `Ok(None)` once the peer closed the connection.
    pub async fn receive(&mut self) -> Result<Option<Frame>, ProtocolError> {
        let mut sz = [0u8; 4];
        match self.stream.read_exact(&mut sz).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let len = u32::from_le_bytes(sz);
        if len > MAX_FRAME_LEN {
            return Err(ProtocolError::TooLarge(len as usize));
        }
        let mut buf = vec![0u8; len as usize];
        self.stream.read_exact(&mut buf).await?;
        Ok(Some(Frame::from_bytes(&buf)?))
    }
}

/// Writing half of a connection.
pub struct FrameWriter<W> {
    stream: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(stream: W) -> Self {
        Self { stream }
    }

    pub async fn send(&mut self, frame: &Frame) -> Result<(), ProtocolError> {
        let payload = frame.to_bytes()?;
        let sz = length_prefix(payload.len())?;
        let mut full_payload = Vec::with_capacity(payload.len() + 4);
        full_payload.extend_from_slice(&sz);
        full_payload.extend(payload);
        self.stream.write_all(&full_payload).await?;
        self.stream.flush().await?;
        Ok(())
    }
}
